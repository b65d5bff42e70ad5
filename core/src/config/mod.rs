//! Files read from disk: basis sets and experiment descriptions.
mod basis_set;
mod experiment;
mod molecule;

pub use basis_set::ConfigBasisSet;
pub use experiment::ExperimentConfig;
pub use molecule::ConfigMolecule;
