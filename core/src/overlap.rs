//! Overlap between a trial basis and a reference basis placed on the same geometry.
//!
//! The geometry is duplicated: copy `i` of the atoms carries `bases[i]`, trial bases first and
//! reference bases after them. The full overlap matrix over that combined set is then cut into
//! four quadrants.
use std::{fmt, str::FromStr};

use nalgebra::DMatrix;

use crate::{
    basis::AtomicBasis,
    device::EvaluationContext,
    error::{Error, Result},
    integrals::{AtomBasisDescriptor, OverlapEngine},
    periodic_table::ElementTable,
    structure::parse_structure,
};

/// Number of spherical gaussian functions in `bases`: the sum of `2l + 1` over all shells.
pub fn count_gaussians(bases: &[AtomicBasis]) -> usize {
    bases.iter().map(AtomicBasis::n_functions).sum()
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GaussianCounts {
    pub n_trial: usize,
    pub n_ref: usize,
}

impl GaussianCounts {
    pub fn new(trial: &[AtomicBasis], reference: &[AtomicBasis]) -> Self {
        Self {
            n_trial: count_gaussians(trial),
            n_ref: count_gaussians(reference),
        }
    }

    pub fn total(&self) -> usize {
        self.n_trial + self.n_ref
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Quadrant {
    /// trial x trial
    S11,
    /// reference x trial
    S12,
    /// trial x reference
    S21,
    /// reference x reference
    S22,
}

impl FromStr for Quadrant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "S11" | "S_11" => Ok(Quadrant::S11),
            "S12" | "S_12" => Ok(Quadrant::S12),
            "S21" | "S_21" => Ok(Quadrant::S21),
            "S22" | "S_22" => Ok(Quadrant::S22),
            _ => Err(Error::InvalidQuadrant(s.to_string())),
        }
    }
}

impl fmt::Display for Quadrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Quadrant::S11 => "S_11",
            Quadrant::S12 => "S_12",
            Quadrant::S21 => "S_21",
            Quadrant::S22 => "S_22",
        };
        f.write_str(name)
    }
}

/// Overlap matrix over `bases` placed on two copies of the geometry in `structure`.
/// `bases` must hold twice as many entries as the structure has atoms.
pub fn cross_overlap(
    structure: &str,
    bases: &[AtomicBasis],
    engine: &impl OverlapEngine,
    context: &EvaluationContext,
) -> Result<DMatrix<f64>> {
    let parsed = parse_structure(structure, &ElementTable::new())?;

    let atomic_numbers = parsed.atomic_numbers.repeat(2);
    let positions = parsed.positions.repeat(2);

    if bases.len() != positions.len() {
        return Err(Error::shape(
            "bases for the duplicated geometry",
            positions.len(),
            bases.len(),
        ));
    }

    let descriptors = atomic_numbers
        .iter()
        .zip(&positions)
        .zip(bases)
        .map(|((&atomic_number, &position), basis)| AtomBasisDescriptor {
            atomic_number,
            position,
            basis,
        })
        .collect::<Vec<_>>();

    let matrix = engine.overlap(&descriptors, context)?;
    log::debug!(
        "cross overlap over {} atoms: {}x{}",
        descriptors.len(),
        matrix.nrows(),
        matrix.ncols()
    );
    Ok(matrix)
}

/// A combined overlap matrix together with the sizes of its trial and reference blocks.
#[derive(Clone, Debug)]
pub struct CrossOverlap {
    matrix: DMatrix<f64>,
    counts: GaussianCounts,
}

impl CrossOverlap {
    /// Fails unless `matrix` is square with side `n_trial + n_ref`.
    pub fn new(matrix: DMatrix<f64>, counts: GaussianCounts) -> Result<Self> {
        if !matrix.is_square() || matrix.nrows() != counts.total() {
            return Err(Error::shape(
                "cross overlap matrix",
                format!("{0}x{0}", counts.total()),
                format!("{}x{}", matrix.nrows(), matrix.ncols()),
            ));
        }

        Ok(Self { matrix, counts })
    }

    /// Copy one quadrant out of the combined matrix, with `N` its side length:
    ///
    /// * `S11`: rows `[0, n_trial)`, columns `[0, n_trial)`
    /// * `S12`: rows `[n_trial, N)`, columns `[0, N - n_ref)`
    /// * `S21`: rows `[0, n_trial)`, columns `[n_trial, N)`
    /// * `S22`: rows `[n_trial, N)`, columns `[n_trial, N)`
    pub fn select(&self, quadrant: Quadrant) -> DMatrix<f64> {
        let n = self.matrix.nrows();
        let GaussianCounts { n_trial, n_ref } = self.counts;

        let ((row, n_rows), (column, n_columns)) = match quadrant {
            Quadrant::S11 => ((0, n_trial), (0, n_trial)),
            Quadrant::S12 => ((n_trial, n - n_trial), (0, n - n_ref)),
            Quadrant::S21 => ((0, n_trial), (n_trial, n - n_trial)),
            Quadrant::S22 => ((n_trial, n - n_trial), (n_trial, n - n_trial)),
        };

        self.matrix
            .view((row, column), (n_rows, n_columns))
            .into_owned()
    }

    /// [`CrossOverlap::select`] with a quadrant name such as `"S_21"`.
    pub fn select_named(&self, name: &str) -> Result<DMatrix<f64>> {
        Ok(self.select(name.parse()?))
    }
}
