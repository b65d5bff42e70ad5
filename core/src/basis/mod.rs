mod functions;
mod library;
mod packer;
mod set;

pub use functions::{BasisFunction, ContractedGaussian, Gaussian};
pub use library::{BasisLibrary, BasisLoader};
pub use packer::{BasisPacker, BasisParameters};
pub use set::{AtomicBasis, BasisSet, Shell};
