//! Gaussian integrals over contracted basis functions.
mod electron_tensor;
mod hermite;
mod mmd;

use nalgebra::{DMatrix, Vector3};

pub use electron_tensor::ElectronTensor;
pub use mmd::McMurchieDavidson;
pub(crate) use mmd::primitive_overlap;

use crate::{
    atom::Atom,
    basis::{AtomicBasis, BasisFunction},
    device::EvaluationContext,
    error::Result,
    utils,
};

/// One- and two-electron integrals between basis functions.
pub trait Integrator {
    type Function;

    fn overlap(&self, functions: (&Self::Function, &Self::Function)) -> f64;

    fn kinetic(&self, functions: (&Self::Function, &Self::Function)) -> f64;

    fn nuclear(&self, functions: (&Self::Function, &Self::Function), nuclei: &[Atom]) -> f64;

    fn electron_repulsion(
        &self,
        functions: (
            &Self::Function,
            &Self::Function,
            &Self::Function,
            &Self::Function,
        ),
    ) -> f64;
}

/// An atomic basis placed on a nucleus.
#[derive(Copy, Clone, Debug)]
pub struct AtomBasisDescriptor<'a> {
    pub atomic_number: u32,
    /// Position in Bohr
    pub position: Vector3<f64>,
    pub basis: &'a AtomicBasis,
}

/// Anything that can produce the full overlap matrix of a set of placed atomic bases. Rows and
/// columns follow the order of the descriptors, and within one descriptor the order of its shells.
pub trait OverlapEngine {
    fn overlap(
        &self,
        descriptors: &[AtomBasisDescriptor],
        context: &EvaluationContext,
    ) -> Result<DMatrix<f64>>;
}

/// Expand placed atomic bases into their basis functions, in order.
pub fn basis_functions(descriptors: &[AtomBasisDescriptor]) -> Result<Vec<BasisFunction>> {
    let mut functions = Vec::new();
    for descriptor in descriptors {
        functions.extend(descriptor.basis.basis_functions(descriptor.position)?);
    }
    Ok(functions)
}

pub fn overlap_matrix(
    basis: &[BasisFunction],
    integrator: &(impl Integrator<Function = BasisFunction> + Sync),
    context: &EvaluationContext,
) -> DMatrix<f64> {
    utils::symmetric_matrix_on(context, basis.len(), |i, j| {
        let overlap_ij = integrator.overlap((&basis[i], &basis[j]));
        log::trace!("overlap ({i}{j}) = {overlap_ij}");
        overlap_ij
    })
}

pub fn kinetic_matrix(
    basis: &[BasisFunction],
    integrator: &(impl Integrator<Function = BasisFunction> + Sync),
    context: &EvaluationContext,
) -> DMatrix<f64> {
    utils::symmetric_matrix_on(context, basis.len(), |i, j| {
        let kinetic_ij = integrator.kinetic((&basis[i], &basis[j]));
        log::trace!("kinetic ({i}{j}) = {kinetic_ij}");
        kinetic_ij
    })
}

pub fn nuclear_matrix(
    basis: &[BasisFunction],
    nuclei: &[Atom],
    integrator: &(impl Integrator<Function = BasisFunction> + Sync),
    context: &EvaluationContext,
) -> DMatrix<f64> {
    utils::symmetric_matrix_on(context, basis.len(), |i, j| {
        let nuclear_ij = integrator.nuclear((&basis[i], &basis[j]), nuclei);
        log::trace!("nuclear ({i}{j}) = {nuclear_ij}");
        nuclear_ij
    })
}

impl OverlapEngine for McMurchieDavidson {
    fn overlap(
        &self,
        descriptors: &[AtomBasisDescriptor],
        context: &EvaluationContext,
    ) -> Result<DMatrix<f64>> {
        let basis = basis_functions(descriptors)?;
        Ok(overlap_matrix(&basis, self, context))
    }
}
