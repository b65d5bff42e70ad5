use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{
    error::{Error, Result},
    integrals::primitive_overlap,
};

use super::Shell;

/// Function of the form K*x^i*y^j*z^k*exp(-alpha*x^2)
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Gaussian {
    pub exponent: f64,
    /// The coefficient of this gaussian, including its normalization constant
    pub coefficient: f64,
    /// (i, j, k) exponents of polynomial terms
    pub angular: (i32, i32, i32),
}

impl Gaussian {
    pub fn norm(exponent: f64, angular: (i32, i32, i32)) -> f64 {
        let (i, j, k) = angular;

        (std::f64::consts::FRAC_2_PI * exponent)
            .powi(3)
            .sqrt()
            .sqrt()
            * f64::sqrt(
                (8.0 * exponent).powi(i + j + k)
                    / ((i + 1..=2 * i).product::<i32>()
                        * (j + 1..=2 * j).product::<i32>()
                        * (k + 1..=2 * k).product::<i32>()) as f64,
            )
    }
}

/// Linear combination of many [`Gaussian`]s
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContractedGaussian(pub SmallVec<[Gaussian; 6]>);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BasisFunction {
    pub contracted_gaussian: ContractedGaussian,
    /// The position of this basis function, in Bohr
    pub position: Vector3<f64>,
}

/// Cartesian monomials (with weights) making up each real spherical component of a shell.
/// p: x, y, z. d: xy, yz, z2, xz, x2-y2.
fn spherical_components(angular_momentum: u32) -> Result<Vec<Vec<(f64, (i32, i32, i32))>>> {
    let components = match angular_momentum {
        0 => vec![vec![(1.0, (0, 0, 0))]],
        1 => vec![
            vec![(1.0, (1, 0, 0))],
            vec![(1.0, (0, 1, 0))],
            vec![(1.0, (0, 0, 1))],
        ],
        2 => vec![
            vec![(1.0, (1, 1, 0))],
            vec![(1.0, (0, 1, 1))],
            vec![(2.0, (0, 0, 2)), (-1.0, (2, 0, 0)), (-1.0, (0, 2, 0))],
            vec![(1.0, (1, 0, 1))],
            vec![(1.0, (2, 0, 0)), (-1.0, (0, 2, 0))],
        ],
        l => return Err(Error::UnsupportedAngularMomentum(l)),
    };
    Ok(components)
}

impl BasisFunction {
    /// Expand a shell centered at `position` into its `2l + 1` spherical functions, each
    /// normalized to unit self-overlap.
    pub fn from_shell(shell: &Shell, position: Vector3<f64>) -> Result<Vec<BasisFunction>> {
        if let Some(&exponent) = shell
            .exponents()
            .iter()
            .find(|exponent| !(exponent.is_finite() && **exponent > 0.0))
        {
            return Err(Error::MalformedBasis(format!(
                "exponent {exponent} is not a positive number"
            )));
        }

        let mut functions = Vec::with_capacity(shell.n_functions());
        for component in spherical_components(shell.angular_momentum())? {
            let mut primitives = SmallVec::new();
            for (&exponent, &coefficient) in shell.exponents().iter().zip(shell.coefficients()) {
                for &(weight, angular) in &component {
                    primitives.push(Gaussian {
                        exponent,
                        coefficient: weight * coefficient * Gaussian::norm(exponent, angular),
                        angular,
                    });
                }
            }

            let mut contracted = ContractedGaussian(primitives);
            contracted.normalize()?;
            functions.push(BasisFunction {
                contracted_gaussian: contracted,
                position,
            });
        }

        Ok(functions)
    }
}

impl ContractedGaussian {
    pub fn self_overlap(&self) -> f64 {
        let ContractedGaussian(primitives) = self;
        let mut overlap = 0.0;
        for (a, b) in itertools::iproduct!(primitives, primitives) {
            overlap += a.coefficient * b.coefficient * primitive_overlap(*a, *b, Vector3::zeros());
        }
        overlap
    }

    /// Scale all coefficients so that the contracted function has unit norm.
    fn normalize(&mut self) -> Result<()> {
        let overlap = self.self_overlap();
        if !(overlap.is_finite() && overlap > 0.0) {
            return Err(Error::MalformedBasis(format!(
                "contracted function has self-overlap {overlap}"
            )));
        }

        let scale = overlap.sqrt().recip();
        self.0
            .iter_mut()
            .for_each(|primitive| primitive.coefficient *= scale);
        Ok(())
    }
}
