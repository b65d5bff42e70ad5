//! Direct inversion in the iterative subspace (Pulay mixing) for SCF acceleration.
use nalgebra::{DMatrix, DVector};
use std::collections::VecDeque;

/// Extrapolation only starts once this many samples have been collected.
const MIN_SAMPLES: usize = 3;

struct Sample {
    error: DMatrix<f64>,
    fock: DMatrix<f64>,
}

pub(crate) struct Diis {
    /// newest first
    previous_samples: VecDeque<Sample>,
    subspace: usize,
}

impl Diis {
    /// A subspace smaller than three samples disables extrapolation.
    pub fn new(subspace: usize) -> Self {
        Self {
            previous_samples: VecDeque::with_capacity(subspace),
            subspace,
        }
    }

    /// Record a fock matrix with its commutator error and return the extrapolated fock matrix.
    /// Falls back to `fock` itself while the subspace is small or the DIIS equations are
    /// singular.
    pub fn extrapolate(&mut self, error: DMatrix<f64>, fock: DMatrix<f64>) -> DMatrix<f64> {
        if self.subspace < MIN_SAMPLES {
            return fock;
        }

        self.previous_samples.push_front(Sample {
            error,
            fock: fock.clone(),
        });
        self.previous_samples.truncate(self.subspace);

        let n = self.previous_samples.len();
        if n < MIN_SAMPLES {
            return fock;
        }

        let matrix = DMatrix::from_fn(n + 1, n + 1, |i, j| match (i, j) {
            (i, j) if i == n && j == n => 0.0,
            (i, j) if i == n || j == n => 1.0,
            _ => self.previous_samples[j]
                .error
                .dot(&self.previous_samples[i].error),
        });

        let b = DVector::from_fn(n + 1, |i, _| if i == n { 1.0 } else { 0.0 });

        match matrix.lu().solve(&b) {
            Some(solution) if solution.iter().all(|c| c.is_finite()) => solution
                .iter()
                .zip(&self.previous_samples)
                .map(|(&c, sample)| c * &sample.fock)
                .sum(),
            _ => {
                log::debug!("DIIS equations are singular, using the plain fock matrix");
                fock
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::{DMatrix, Matrix2};

    use super::Diis;

    fn dynamic(matrix: Matrix2<f64>) -> DMatrix<f64> {
        DMatrix::from_column_slice(2, 2, matrix.as_slice())
    }

    #[test]
    fn passes_first_samples_through() {
        let mut diis = Diis::new(6);
        let fock = DMatrix::from_element(2, 2, 0.5);
        let error = DMatrix::from_element(2, 2, 0.1);
        assert_eq!(diis.extrapolate(error, fock.clone()), fock);
    }

    #[test]
    fn exact_sample_dominates() {
        let mut diis = Diis::new(6);
        diis.extrapolate(
            dynamic(Matrix2::new(1.0, 0.0, 0.0, 0.0)),
            DMatrix::from_element(2, 2, 3.0),
        );
        diis.extrapolate(
            dynamic(Matrix2::new(0.0, 0.0, 0.0, 1.0)),
            DMatrix::from_element(2, 2, 2.0),
        );
        let fock = diis.extrapolate(DMatrix::zeros(2, 2), DMatrix::from_element(2, 2, 1.0));

        // coefficients sum to one and minimize the combined error
        assert_relative_eq!(fock, DMatrix::from_element(2, 2, 1.0), epsilon = 1e-10);
    }

    #[test]
    fn small_subspace_disables_extrapolation() {
        let mut diis = Diis::new(1);
        for value in [3.0, 2.0, 1.0] {
            let fock = DMatrix::from_element(2, 2, value);
            assert_eq!(diis.extrapolate(DMatrix::identity(2, 2), fock.clone()), fock);
        }
    }
}
