//! Fit a trial gaussian basis set to a reference basis set by maximizing how much of the occupied
//! orbital space of a molecule the trial basis reproduces.
pub mod atom;
pub mod basis;
pub mod config;
pub mod device;
mod diis;
pub mod error;
pub mod experiment;
pub mod hf;
pub mod integrals;
pub mod molecule;
pub mod objective;
pub mod optimize;
pub mod overlap;
pub mod periodic_table;
pub mod structure;
mod utils;

pub use error::{Error, Result};
