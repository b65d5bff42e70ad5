//! The projection of occupied orbitals from the trial basis onto the reference basis, and the
//! scalar objective built from it.
use nalgebra::{DMatrix, DVector};

use crate::{
    basis::{AtomicBasis, BasisPacker, BasisParameters},
    device::EvaluationContext,
    error::{Error, Result},
    hf::OccupiedOrbitals,
    integrals::OverlapEngine,
    optimize::{central_difference, Objective, DEFAULT_DIFFERENCE_STEP},
    overlap::{cross_overlap, CrossOverlap, GaussianCounts, Quadrant},
};

fn checked_mul(context: &'static str, a: &DMatrix<f64>, b: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    if a.ncols() != b.nrows() {
        return Err(Error::shape(
            context,
            format!("{} rows", a.ncols()),
            format!("{}x{}", b.nrows(), b.ncols()),
        ));
    }
    Ok(a * b)
}

/// P = C^T S21 S22^-1 S12 C, with C the occupied trial coefficients (trial functions x
/// occupied orbitals). The products are evaluated right to left.
pub fn projection(coefficients: &DMatrix<f64>, cross: &CrossOverlap) -> Result<DMatrix<f64>> {
    let s12 = cross.select(Quadrant::S12);
    let s21 = cross.select(Quadrant::S21);
    let s22 = cross.select(Quadrant::S22);

    let s22_inv = s22
        .try_inverse()
        .filter(|inverse| inverse.iter().all(|value| value.is_finite()))
        .ok_or(Error::SingularMatrix("reference overlap S_22"))?;

    let s12_c = checked_mul("S_12 * C", &s12, coefficients)?;
    let s22_s12c = checked_mul("S_22^-1 * S_12 C", &s22_inv, &s12_c)?;
    let s21_s22s12c = checked_mul("S_21 * S_22^-1 S_12 C", &s21, &s22_s12c)?;
    let projection = checked_mul("C^T * S_21 S_22^-1 S_12 C", &coefficients.transpose(), &s21_s22s12c)?;

    log::trace!("projection: {projection:0.6}");
    Ok(projection)
}

/// -sum_j P_jj occ_j / total_occupation
pub fn objective_value(
    projection: &DMatrix<f64>,
    occupations: &DVector<f64>,
    total_occupation: f64,
) -> Result<f64> {
    if !projection.is_square() || projection.nrows() != occupations.len() {
        return Err(Error::shape(
            "projection",
            format!("{0}x{0}", occupations.len()),
            format!("{}x{}", projection.nrows(), projection.ncols()),
        ));
    }

    let weighted_trace = projection
        .diagonal()
        .iter()
        .zip(occupations.iter())
        .map(|(p, occupation)| p * occupation)
        .sum::<f64>();

    Ok(-weighted_trace / total_occupation)
}

/// The objective minimized when fitting a trial basis to a reference basis.
///
/// Everything except the trial parameters is fixed at construction: the reference basis, the
/// geometry, and the occupied orbitals of the trial system. The cross overlap is recomputed on
/// every evaluation.
pub struct BasisObjective<E> {
    trial_packer: BasisPacker,
    reference_bases: Vec<AtomicBasis>,
    structure: String,
    orbitals: OccupiedOrbitals,
    total_occupation: f64,
    engine: E,
    context: EvaluationContext,
    difference_step: f64,
}

impl<E: OverlapEngine> BasisObjective<E> {
    pub fn new(
        trial_packer: BasisPacker,
        reference: BasisParameters,
        structure: impl Into<String>,
        orbitals: OccupiedOrbitals,
        total_occupation: f64,
        engine: E,
        context: EvaluationContext,
    ) -> Result<Self> {
        let reference_bases = reference.bases()?;

        Ok(Self {
            trial_packer,
            reference_bases,
            structure: structure.into(),
            orbitals,
            total_occupation,
            engine,
            context,
            difference_step: DEFAULT_DIFFERENCE_STEP,
        })
    }

    /// Step of the central difference gradient.
    pub fn set_difference_step(&mut self, step: f64) {
        self.difference_step = step;
    }

    /// Objective for already unpacked trial bases.
    pub fn evaluate_bases(&self, trial_bases: &[AtomicBasis]) -> Result<f64> {
        let counts = GaussianCounts::new(trial_bases, &self.reference_bases);
        log::debug!("gaussian counts: {} trial, {} reference", counts.n_trial, counts.n_ref);

        let bases = trial_bases
            .iter()
            .chain(&self.reference_bases)
            .cloned()
            .collect::<Vec<_>>();

        let matrix = cross_overlap(&self.structure, &bases, &self.engine, &self.context)?;
        let cross = CrossOverlap::new(matrix, counts)?;

        let projection = projection(&self.orbitals.coefficients, &cross)?;
        objective_value(&projection, &self.orbitals.occupations, self.total_occupation)
    }
}

impl<E: OverlapEngine> Objective for BasisObjective<E> {
    fn evaluate(&self, params: &DVector<f64>) -> Result<f64> {
        self.evaluate_bases(&self.trial_packer.unpack(params)?)
    }

    fn gradient(&self, params: &DVector<f64>) -> Result<DVector<f64>> {
        central_difference(|x| self.evaluate(x), params, self.difference_step)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::{DMatrix, DVector};
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use crate::{
        atom::AtomSpec,
        basis::{BasisLibrary, BasisParameters},
        device::EvaluationContext,
        error::{Error, Result},
        hf::{HartreeFockConfig, OccupiedOrbitals, RestrictedHartreeFock},
        integrals::{AtomBasisDescriptor, McMurchieDavidson, OverlapEngine},
        molecule::MolecularSystem,
        optimize::Objective,
        overlap::{CrossOverlap, GaussianCounts},
    };

    use super::{objective_value, projection, BasisObjective};

    fn random_matrix(rows: usize, columns: usize, seed: u64) -> DMatrix<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        DMatrix::from_fn(rows, columns, |_, _| rng.gen_range(-1.0..1.0))
    }

    fn doubled_identity(n: usize) -> CrossOverlap {
        let matrix = DMatrix::from_fn(2 * n, 2 * n, |i, j| if i % n == j % n { 1.0 } else { 0.0 });
        CrossOverlap::new(matrix, GaussianCounts { n_trial: n, n_ref: n }).unwrap()
    }

    #[test]
    fn identity_blocks_project_onto_gram_matrix() {
        let c = random_matrix(5, 2, 11);
        let p = projection(&c, &doubled_identity(5)).unwrap();
        assert_relative_eq!(p, c.transpose() * &c, epsilon = 1e-12);
    }

    #[test]
    fn objective_weights_diagonal_by_occupation() {
        let p = DMatrix::from_row_slice(2, 2, &[0.5, 7.0, 7.0, 0.25]);
        let occupations = DVector::from_vec(vec![2.0, 1.0]);
        assert_relative_eq!(
            objective_value(&p, &occupations, 3.0).unwrap(),
            -(0.5 * 2.0 + 0.25) / 3.0
        );

        assert!(matches!(
            objective_value(&p, &DVector::from_vec(vec![2.0]), 2.0),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn coefficient_rows_must_match_trial_functions() {
        let c = random_matrix(4, 2, 3);
        assert!(matches!(
            projection(&c, &doubled_identity(5)),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn singular_reference_overlap_is_reported() {
        let n = 3;
        let matrix = DMatrix::from_fn(2 * n, 2 * n, |i, j| if i < n && j < n && i == j { 1.0 } else { 0.0 });
        let cross = CrossOverlap::new(matrix, GaussianCounts { n_trial: n, n_ref: n }).unwrap();

        assert!(matches!(
            projection(&random_matrix(n, 1, 5), &cross),
            Err(Error::SingularMatrix(_))
        ));
    }

    /// Pretends trial and reference functions coincide one to one.
    struct MirrorEngine;

    impl OverlapEngine for MirrorEngine {
        fn overlap(
            &self,
            descriptors: &[AtomBasisDescriptor],
            _context: &EvaluationContext,
        ) -> Result<DMatrix<f64>> {
            let n = descriptors
                .iter()
                .map(|descriptor| descriptor.basis.n_functions())
                .sum::<usize>()
                / 2;
            Ok(DMatrix::from_fn(2 * n, 2 * n, |i, j| if i % n == j % n { 1.0 } else { 0.0 }))
        }
    }

    #[test]
    fn orthonormal_orbitals_with_mirror_engine_reach_minus_one() {
        let system = MolecularSystem::new(
            vec![
                AtomSpec::new("H", [0.0, 0.0, 0.0]),
                AtomSpec::new("H", [0.0, 0.0, 1.4]),
            ],
            "6-31g",
        )
        .unwrap();
        let library = BasisLibrary::new();
        let trial = system.basis_parameters(&library, true).unwrap();
        let reference = system.basis_parameters(&library, false).unwrap();

        // orthonormal columns: C^T C = I
        let coefficients = random_matrix(4, 2, 17).qr().q();
        let orbitals = OccupiedOrbitals {
            coefficients,
            occupations: DVector::from_vec(vec![2.0, 2.0]),
        };

        let objective = BasisObjective::new(
            trial.packer().clone(),
            reference,
            system.structure(),
            orbitals,
            4.0,
            MirrorEngine,
            EvaluationContext::serial(),
        )
        .unwrap();

        assert_relative_eq!(objective.evaluate(trial.values()).unwrap(), -1.0, epsilon = 1e-12);
    }

    fn objective_for(
        atoms: Vec<AtomSpec>,
        trial_basis: &str,
        reference_basis: &str,
    ) -> (BasisObjective<McMurchieDavidson>, BasisParameters) {
        let library = BasisLibrary::new();
        let trial_system = MolecularSystem::new(atoms.clone(), trial_basis).unwrap();
        let reference_system = MolecularSystem::new(atoms, reference_basis).unwrap();

        let provider = RestrictedHartreeFock::new(HartreeFockConfig::default());
        let solution = trial_system.solve_reference(&provider, &library).unwrap();

        let trial = trial_system.basis_parameters(&library, true).unwrap();
        let reference = reference_system.basis_parameters(&library, false).unwrap();

        let objective = BasisObjective::new(
            trial.packer().clone(),
            reference,
            trial_system.structure(),
            solution.occupied(),
            solution.total_occupation(),
            McMurchieDavidson,
            EvaluationContext::serial(),
        )
        .unwrap();

        (objective, trial)
    }

    #[test]
    fn lithium_dimer_against_itself_is_minus_one() {
        let atoms = vec![
            AtomSpec::new("Li", [1.0, 0.0, 0.0]),
            AtomSpec::new("Li", [-1.0, 0.0, 0.0]),
        ];
        let (objective, trial) = objective_for(atoms, "3-21G", "3-21G");

        assert_relative_eq!(objective.evaluate(trial.values()).unwrap(), -1.0, epsilon = 1e-6);
    }

    #[test]
    fn objective_does_not_depend_on_atom_order() {
        let lithium = AtomSpec::new("Li", [0.0, 0.0, 0.0]);
        let hydrogen = AtomSpec::new("H", [0.0, 0.0, 3.0]);

        let (forward, forward_trial) =
            objective_for(vec![lithium.clone(), hydrogen.clone()], "sto-3g", "3-21G");
        let (backward, backward_trial) = objective_for(vec![hydrogen, lithium], "sto-3g", "3-21G");

        let forward_value = forward.evaluate(forward_trial.values()).unwrap();
        let backward_value = backward.evaluate(backward_trial.values()).unwrap();

        assert!(forward_value < 0.0 && forward_value >= -1.0 - 1e-9);
        assert_relative_eq!(forward_value, backward_value, epsilon = 1e-6);
    }

    #[test]
    fn trial_parameter_length_is_checked() {
        let atoms = vec![
            AtomSpec::new("H", [0.0, 0.0, 0.0]),
            AtomSpec::new("H", [0.0, 0.0, 1.4]),
        ];
        let (objective, trial) = objective_for(atoms, "sto-3g", "6-31g");

        let too_long = DVector::zeros(trial.values().len() + 1);
        assert!(matches!(
            objective.evaluate(&too_long),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn gradient_matches_directional_difference() {
        let atoms = vec![
            AtomSpec::new("H", [0.0, 0.0, 0.0]),
            AtomSpec::new("H", [0.0, 0.0, 1.4]),
        ];
        let (objective, trial) = objective_for(atoms, "sto-3g", "6-31g");
        let params = trial.values().clone();

        let gradient = objective.gradient(&params).unwrap();
        assert_eq!(gradient.len(), params.len());

        let direction = gradient.normalize();
        let h = 1e-4;
        let forward = objective.evaluate(&(&params + h * &direction)).unwrap();
        let backward = objective.evaluate(&(&params - h * &direction)).unwrap();
        assert_relative_eq!((forward - backward) / (2.0 * h), gradient.norm(), max_relative = 1e-3);
    }
}
