//! Self consistent field solvers producing orbital coefficients.
mod report;
mod rhf;

use std::path::PathBuf;

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

pub use rhf::restricted_hartree_fock;

use crate::{
    basis::AtomicBasis,
    device::EvaluationContext,
    error::Result,
    integrals::{self, AtomBasisDescriptor, McMurchieDavidson},
    molecule::Molecule,
};

/// Settings of a hartree fock calculation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HartreeFockConfig {
    /// the maximum number of iterations to try
    pub max_iterations: usize,
    /// the smallest number that isn't treated as zero. If the density matrix rms changes by less
    /// than this, the system is considered converged.
    pub epsilon: f64,
    /// how many previous fock matrices DIIS extrapolates from
    pub diis_subspace: usize,
    /// write a human readable log of the calculation to this file
    #[serde(rename = "output")]
    pub report: Option<PathBuf>,
}

impl Default for HartreeFockConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            epsilon: 1e-8,
            diis_subspace: 8,
            report: None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScfIteration {
    pub electronic_energy: f64,
    pub density_rms: f64,
}

/// The result of an SCF calculation.
#[derive(Clone, Debug)]
pub struct ScfSolution {
    /// molecular orbitals as columns, ordered by ascending orbital energy
    pub coefficients: DMatrix<f64>,
    /// electrons in each orbital
    pub occupations: DVector<f64>,
    pub orbital_energies: DVector<f64>,
    pub electronic_energy: f64,
    pub nuclear_repulsion: f64,
    pub iterations: usize,
    pub converged: bool,
    pub history: Vec<ScfIteration>,
}

/// The occupied part of an [`ScfSolution`].
#[derive(Clone, Debug, PartialEq)]
pub struct OccupiedOrbitals {
    pub coefficients: DMatrix<f64>,
    pub occupations: DVector<f64>,
}

impl OccupiedOrbitals {
    pub fn n_orbitals(&self) -> usize {
        self.occupations.len()
    }

    pub fn n_basis(&self) -> usize {
        self.coefficients.nrows()
    }
}

impl ScfSolution {
    pub fn total_energy(&self) -> f64 {
        self.electronic_energy + self.nuclear_repulsion
    }

    /// The columns whose occupation is strictly positive, with their occupations.
    pub fn occupied(&self) -> OccupiedOrbitals {
        let columns = self
            .occupations
            .iter()
            .enumerate()
            .filter(|(_, &occupation)| occupation > 0.0)
            .map(|(k, _)| k)
            .collect::<Vec<_>>();

        OccupiedOrbitals {
            coefficients: self.coefficients.select_columns(&columns),
            occupations: self.occupations.select_rows(&columns),
        }
    }

    /// Sum over all occupations (the electron count).
    pub fn total_occupation(&self) -> f64 {
        self.occupations.sum()
    }
}

/// Anything that can solve the electronic structure of a molecule in a given basis.
pub trait CoefficientProvider {
    /// `basis` holds one atomic basis per atom of `molecule`, in atom order.
    fn solve(&self, molecule: &Molecule, basis: &[AtomicBasis]) -> Result<ScfSolution>;
}

/// [`restricted_hartree_fock`] over McMurchie-Davidson integrals.
#[derive(Clone, Debug, Default)]
pub struct RestrictedHartreeFock {
    config: HartreeFockConfig,
    context: EvaluationContext,
}

impl RestrictedHartreeFock {
    pub fn new(config: HartreeFockConfig) -> Self {
        Self {
            config,
            context: EvaluationContext::default(),
        }
    }

    pub fn with_context(mut self, context: EvaluationContext) -> Self {
        self.context = context;
        self
    }

    pub fn config(&self) -> &HartreeFockConfig {
        &self.config
    }
}

impl CoefficientProvider for RestrictedHartreeFock {
    fn solve(&self, molecule: &Molecule, basis: &[AtomicBasis]) -> Result<ScfSolution> {
        if basis.len() != molecule.atoms.len() {
            return Err(crate::error::Error::shape(
                "atomic bases",
                molecule.atoms.len(),
                basis.len(),
            ));
        }

        let descriptors = molecule
            .atoms
            .iter()
            .zip(basis)
            .map(|(atom, basis)| AtomBasisDescriptor {
                atomic_number: atom.element.atomic_number(),
                position: atom.position,
                basis,
            })
            .collect::<Vec<_>>();
        let functions = integrals::basis_functions(&descriptors)?;

        let solution = restricted_hartree_fock(
            molecule,
            &functions,
            &McMurchieDavidson,
            &self.config,
            &self.context,
        )?;

        log::info!(
            "SCF finished after {} iterations (converged: {}), total energy {:1.8}",
            solution.iterations,
            solution.converged,
            solution.total_energy()
        );

        if let Some(path) = &self.config.report {
            report::write_report(path, molecule, &solution)?;
            log::info!("wrote SCF report to {}", path.display());
        }

        Ok(solution)
    }
}
