//! McMurchie-Davidson integrals over contracted cartesian gaussians.
//!
//! Every pair of primitives is expanded once into hermite gaussians centered at their product
//! center, after which overlap, nuclear attraction and electron repulsion are sums over hermite
//! coefficients. See J. Goings, "Integrals" (2017).
use std::f64::consts::{PI, TAU};

use nalgebra::Vector3;
use smallvec::SmallVec;

use crate::{
    atom::Atom,
    basis::{BasisFunction, Gaussian},
};

use super::{
    hermite::{coulomb_auxiliary, hermite_expansion},
    Integrator,
};

#[derive(Copy, Clone, Debug, Default)]
pub struct McMurchieDavidson;

/// Two primitives multiplied together and expanded in hermite gaussians along each axis.
struct HermitePair {
    /// a + b
    exponent: f64,
    center: Vector3<f64>,
    /// E_t for t = 0..=i+j, per axis
    expansion: [SmallVec<[f64; 8]>; 3],
}

impl HermitePair {
    fn new(a: &Gaussian, a_center: Vector3<f64>, b: &Gaussian, b_center: Vector3<f64>) -> Self {
        let exponent = a.exponent + b.exponent;
        let center = (a.exponent * a_center + b.exponent * b_center) / exponent;
        let distance = a_center - b_center;
        let (i, j) = (axes(a), axes(b));

        let expansion: [SmallVec<[f64; 8]>; 3] = [0usize, 1, 2].map(|k| {
            (0..=i[k] + j[k])
                .map(|t| hermite_expansion([i[k], j[k], t], distance[k], a.exponent, b.exponent))
                .collect()
        });

        Self {
            exponent,
            center,
            expansion,
        }
    }

    /// (t, u, v, E_t E_u E_v) for every hermite gaussian in the expansion.
    fn terms(&self) -> impl Iterator<Item = (i32, i32, i32, f64)> + '_ {
        let [x, y, z] = &self.expansion;
        itertools::iproduct!(x.iter().enumerate(), y.iter().enumerate(), z.iter().enumerate()).map(
            |((t, e_x), (u, e_y), (v, e_z))| (t as i32, u as i32, v as i32, e_x * e_y * e_z),
        )
    }
}

fn axes(gaussian: &Gaussian) -> [i32; 3] {
    let (i, j, k) = gaussian.angular;
    [i, j, k]
}

/// All primitive pairs of two contracted functions with their combined coefficient.
fn hermite_pairs<'a>(
    a: &'a BasisFunction,
    b: &'a BasisFunction,
) -> impl Iterator<Item = (f64, HermitePair)> + 'a {
    itertools::iproduct!(&a.contracted_gaussian.0, &b.contracted_gaussian.0).map(
        move |(primitive_a, primitive_b)| {
            (
                primitive_a.coefficient * primitive_b.coefficient,
                HermitePair::new(primitive_a, a.position, primitive_b, b.position),
            )
        },
    )
}

/// Sum of `integral` over all primitive pairs, weighted by their coefficients.
fn contract(
    a: &BasisFunction,
    b: &BasisFunction,
    integral: impl Fn(Gaussian, Gaussian, Vector3<f64>) -> f64,
) -> f64 {
    let diff = a.position - b.position;
    itertools::iproduct!(&a.contracted_gaussian.0, &b.contracted_gaussian.0)
        .map(|(&primitive_a, &primitive_b)| {
            primitive_a.coefficient
                * primitive_b.coefficient
                * integral(primitive_a, primitive_b, diff)
        })
        .sum()
}

impl Integrator for McMurchieDavidson {
    type Function = BasisFunction;

    fn overlap(&self, (a, b): (&Self::Function, &Self::Function)) -> f64 {
        contract(a, b, primitive_overlap)
    }

    fn kinetic(&self, (a, b): (&Self::Function, &Self::Function)) -> f64 {
        contract(a, b, primitive_kinetic)
    }

    fn nuclear(&self, (a, b): (&Self::Function, &Self::Function), nuclei: &[Atom]) -> f64 {
        hermite_pairs(a, b)
            .map(|(coefficient, pair)| {
                coefficient
                    * nuclei
                        .iter()
                        .map(|nucleus| primitive_nuclear(&pair, nucleus))
                        .sum::<f64>()
            })
            .sum()
    }

    fn electron_repulsion(
        &self,
        (a, b, c, d): (
            &Self::Function,
            &Self::Function,
            &Self::Function,
            &Self::Function,
        ),
    ) -> f64 {
        let ket = hermite_pairs(c, d).collect::<Vec<_>>();

        hermite_pairs(a, b)
            .map(|(bra_coefficient, bra)| {
                bra_coefficient
                    * ket
                        .iter()
                        .map(|(ket_coefficient, ket_pair)| {
                            ket_coefficient * primitive_repulsion(&bra, ket_pair)
                        })
                        .sum::<f64>()
            })
            .sum()
    }
}

/// 1D overlap of two cartesian gaussians with powers `i`, `j`; `distance` is A - B.
fn overlap_1d(i: i32, j: i32, distance: f64, a: f64, b: f64) -> f64 {
    hermite_expansion([i, j, 0], distance, a, b) * (PI / (a + b)).sqrt()
}

/// Overlap of two unnormalized primitives (their coefficients are ignored). `diff` is A - B.
pub(crate) fn primitive_overlap(a: Gaussian, b: Gaussian, diff: Vector3<f64>) -> f64 {
    let (i, j) = (axes(&a), axes(&b));
    (0..3)
        .map(|k| overlap_1d(i[k], j[k], diff[k], a.exponent, b.exponent))
        .product()
}

/// Kinetic energy as a sum over axes of the 1D kinetic integral times the other two overlaps.
fn primitive_kinetic(a: Gaussian, b: Gaussian, diff: Vector3<f64>) -> f64 {
    let (i, j) = (axes(&a), axes(&b));
    let beta = b.exponent;
    let shifted = |k: usize, shift: i32| overlap_1d(i[k], j[k] + shift, diff[k], a.exponent, beta);
    let overlaps = [shifted(0, 0), shifted(1, 0), shifted(2, 0)];

    (0..3)
        .map(|k| {
            let kinetic_1d = beta * (2 * j[k] + 1) as f64 * overlaps[k]
                - 2.0 * beta.powi(2) * shifted(k, 2)
                - 0.5 * (j[k] * (j[k] - 1)) as f64 * shifted(k, -2);
            kinetic_1d * overlaps[(k + 1) % 3] * overlaps[(k + 2) % 3]
        })
        .sum()
}

fn primitive_nuclear(pair: &HermitePair, nucleus: &Atom) -> f64 {
    let pc = pair.center - nucleus.position;
    let sum = pair
        .terms()
        .map(|(t, u, v, e)| e * coulomb_auxiliary(t, u, v, 0, pair.exponent, pc))
        .sum::<f64>();

    -nucleus.nuclear_charge() as f64 * TAU / pair.exponent * sum
}

fn primitive_repulsion(bra: &HermitePair, ket: &HermitePair) -> f64 {
    let (p, q) = (bra.exponent, ket.exponent);
    let reduced = p * q / (p + q);
    let pq = bra.center - ket.center;

    let mut sum = 0.0;
    for (t1, u1, v1, e_bra) in bra.terms() {
        for (t2, u2, v2, e_ket) in ket.terms() {
            let sign = if (t2 + u2 + v2) % 2 == 0 { 1.0 } else { -1.0 };
            sum += e_bra
                * e_ket
                * sign
                * coulomb_auxiliary(t1 + t2, u1 + u2, v1 + v2, 0, reduced, pq);
        }
    }

    2.0 * PI.powf(2.5) / (p * q * (p + q).sqrt()) * sum
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::Vector3;
    use smallvec::smallvec;

    use crate::{
        atom::Atom,
        basis::{BasisFunction, ContractedGaussian, Gaussian},
        integrals::Integrator,
        periodic_table::Element,
    };

    use super::McMurchieDavidson;

    fn primitive(angular: (i32, i32, i32)) -> Gaussian {
        Gaussian {
            exponent: 1.0,
            coefficient: 1.0,
            angular,
        }
    }

    fn normalized_s(exponent: f64, position: Vector3<f64>) -> BasisFunction {
        BasisFunction {
            contracted_gaussian: ContractedGaussian(smallvec![Gaussian {
                exponent,
                coefficient: Gaussian::norm(exponent, (0, 0, 0)),
                angular: (0, 0, 0),
            }]),
            position,
        }
    }

    #[test]
    fn primitive_overlap_reference_values() {
        let diff = Vector3::new(1.0, 0.0, 0.0);

        assert_relative_eq!(
            super::primitive_overlap(primitive((0, 0, 0)), primitive((0, 0, 0)), diff),
            1.194077663824459,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            super::primitive_overlap(primitive((1, 0, 0)), primitive((1, 0, 0)), diff),
            0.0,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            super::primitive_overlap(primitive((0, 1, 0)), primitive((0, 1, 0)), diff),
            0.29851941595611475,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            super::primitive_overlap(primitive((0, 0, 1)), primitive((0, 0, 1)), diff),
            0.29851941595611475,
            epsilon = 1e-12
        );
    }

    #[test]
    fn s_p_overlap_is_antisymmetric_in_displacement() {
        // <s_A | p_x B> with B to the right of A is negative: the lobe pointing at A is negative
        let s = primitive((0, 0, 0));
        let p = primitive((1, 0, 0));
        let right = super::primitive_overlap(s, p, Vector3::new(-1.0, 0.0, 0.0));
        let left = super::primitive_overlap(s, p, Vector3::new(1.0, 0.0, 0.0));
        assert!(right < 0.0);
        assert_relative_eq!(right, -left, epsilon = 1e-14);
    }

    #[test]
    fn normalized_s_integrals() {
        let integrator = McMurchieDavidson;
        let origin = normalized_s(1.0, Vector3::zeros());

        assert_relative_eq!(integrator.overlap((&origin, &origin)), 1.0, epsilon = 1e-12);
        // <s|-1/2 nabla^2|s> = 3a/2
        assert_relative_eq!(integrator.kinetic((&origin, &origin)), 1.5, epsilon = 1e-12);

        // <s|-1/r|s> = -2 sqrt(2a / pi)
        let hydrogen = Atom::new(Element::from_atomic_number(1).unwrap(), Vector3::zeros());
        assert_relative_eq!(
            integrator.nuclear((&origin, &origin), &[hydrogen]),
            -2.0 * (2.0 / std::f64::consts::PI).sqrt(),
            epsilon = 1e-12
        );

        // (ss|ss) = 2 sqrt(a / pi) for equal exponents on one center
        assert_relative_eq!(
            integrator.electron_repulsion((&origin, &origin, &origin, &origin)),
            2.0 * (1.0 / std::f64::consts::PI).sqrt(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn kinetic_energy_of_normalized_p() {
        // <p|-1/2 nabla^2|p> = 5a/2
        let exponent = 0.8;
        let p = BasisFunction {
            contracted_gaussian: ContractedGaussian(smallvec![Gaussian {
                exponent,
                coefficient: Gaussian::norm(exponent, (1, 0, 0)),
                angular: (1, 0, 0),
            }]),
            position: Vector3::new(0.3, -0.2, 1.0),
        };

        let integrator = McMurchieDavidson;
        assert_relative_eq!(integrator.overlap((&p, &p)), 1.0, epsilon = 1e-12);
        assert_relative_eq!(integrator.kinetic((&p, &p)), 2.5 * exponent, epsilon = 1e-12);
    }

    #[test]
    fn repulsion_decays_to_coulomb_law() {
        let integrator = McMurchieDavidson;
        let a = normalized_s(2.0, Vector3::zeros());
        let b = normalized_s(2.0, Vector3::new(0.0, 0.0, 12.0));

        assert_relative_eq!(
            integrator.electron_repulsion((&a, &a, &b, &b)),
            1.0 / 12.0,
            epsilon = 1e-10
        );
    }
}
