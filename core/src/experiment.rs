//! Wiring a trial system and a reference system into a ready to minimize objective.
use nalgebra::DVector;

use crate::{
    basis::{AtomicBasis, BasisLoader, BasisParameters},
    device::EvaluationContext,
    error::{Error, Result},
    hf::{CoefficientProvider, ScfSolution},
    integrals::OverlapEngine,
    molecule::MolecularSystem,
    objective::BasisObjective,
    optimize::{self, Objective, OptimizationOutcome, OptimizerConfig},
};

/// Everything an optimizer run needs: the objective, the trainable start point and the SCF
/// solution the occupied orbitals were taken from.
pub struct Experiment<E> {
    pub objective: BasisObjective<E>,
    pub trial: BasisParameters,
    pub scf: ScfSolution,
}

impl<E: OverlapEngine> Experiment<E> {
    /// Solve the trial system, load both parameter sets and bind them into a [`BasisObjective`].
    ///
    /// Both systems must describe the same atoms; the geometry of the trial system is used for
    /// the cross overlap.
    pub fn prepare(
        trial_system: &MolecularSystem,
        reference_system: &MolecularSystem,
        loader: &impl BasisLoader,
        provider: &impl CoefficientProvider,
        engine: E,
        context: EvaluationContext,
    ) -> Result<Self> {
        if trial_system.atomic_numbers() != reference_system.atomic_numbers() {
            return Err(Error::shape(
                "reference system atoms",
                format!("{:?}", trial_system.atomic_numbers()),
                format!("{:?}", reference_system.atomic_numbers()),
            ));
        }

        let same_geometry = trial_system
            .atoms()
            .iter()
            .zip(reference_system.atoms())
            .all(|(trial, reference)| trial.position() == reference.position());
        if !same_geometry {
            return Err(Error::shape(
                "reference system geometry",
                trial_system.structure(),
                reference_system.structure(),
            ));
        }

        let scf = trial_system.solve_reference(provider, loader)?;
        let trial = trial_system.basis_parameters(loader, true)?;
        let reference = reference_system.basis_parameters(loader, false)?;

        let objective = BasisObjective::new(
            trial.packer().clone(),
            reference,
            trial_system.structure(),
            scf.occupied(),
            scf.total_occupation(),
            engine,
            context,
        )?;

        Ok(Self {
            objective,
            trial,
            scf,
        })
    }

    pub fn initial_params(&self) -> &DVector<f64> {
        self.trial.values()
    }

    /// The objective at the unperturbed trial parameters.
    pub fn evaluate(&self) -> Result<f64> {
        self.objective.evaluate(self.initial_params())
    }

    /// Run the optimizer named in `config`, with gradients taken at its difference step.
    pub fn optimize(&mut self, config: &OptimizerConfig) -> Result<OptimizationOutcome> {
        self.objective.set_difference_step(config.difference_step);
        optimize::minimize(&self.objective, self.initial_params().clone(), config)
    }

    /// Structured trial bases for a parameter vector, e.g. the best one an optimizer found.
    pub fn trial_bases(&self, params: &DVector<f64>) -> Result<Vec<AtomicBasis>> {
        self.trial.packer().unpack(params)
    }
}
