use nalgebra::DVector;

use crate::error::Result;

use super::{Objective, OptimizationOutcome, Optimizer};

/// Plain gradient descent with a fixed step.
#[derive(Copy, Clone, Debug)]
pub struct GradientDescent {
    step: f64,
    max_iterations: usize,
}

impl GradientDescent {
    pub fn new(step: f64, max_iterations: usize) -> Self {
        Self {
            step,
            max_iterations,
        }
    }
}

impl Optimizer for GradientDescent {
    fn minimize(
        &self,
        objective: &dyn Objective,
        initial: DVector<f64>,
    ) -> Result<OptimizationOutcome> {
        let mut params = initial;
        let mut outcome = OptimizationOutcome::start(&params, objective.evaluate(&params)?);

        for iteration in 1..=self.max_iterations {
            let gradient = objective.gradient(&params)?;
            params.axpy(-self.step, &gradient, 1.0);

            let value = objective.evaluate(&params)?;
            outcome.record(&params, value);
            outcome.iterations = iteration;

            log::info!(
                "gd iteration {iteration:<4} - objective {value:1.10}. |gradient| {:1.4e}",
                gradient.norm()
            );
        }

        Ok(outcome)
    }
}
