use nalgebra::DVector;

use crate::error::Result;

use super::{Objective, OptimizationOutcome, Optimizer};

/// Adam (Kingma & Ba, 2014) with bias corrected moment estimates.
#[derive(Copy, Clone, Debug)]
pub struct Adam {
    step: f64,
    max_iterations: usize,
    beta_1: f64,
    beta_2: f64,
    epsilon: f64,
}

impl Adam {
    pub fn new(step: f64, max_iterations: usize) -> Self {
        Self {
            step,
            max_iterations,
            beta_1: 0.9,
            beta_2: 0.999,
            epsilon: 1e-8,
        }
    }
}

impl Optimizer for Adam {
    fn minimize(
        &self,
        objective: &dyn Objective,
        initial: DVector<f64>,
    ) -> Result<OptimizationOutcome> {
        let mut params = initial;
        let mut outcome = OptimizationOutcome::start(&params, objective.evaluate(&params)?);

        let mut first_moment = DVector::zeros(params.len());
        let mut second_moment = DVector::zeros(params.len());

        for iteration in 1..=self.max_iterations {
            let gradient = objective.gradient(&params)?;

            first_moment = self.beta_1 * first_moment + (1.0 - self.beta_1) * &gradient;
            second_moment =
                self.beta_2 * second_moment + (1.0 - self.beta_2) * gradient.map(|g| g * g);

            let first_correction = 1.0 - self.beta_1.powi(iteration as i32);
            let second_correction = 1.0 - self.beta_2.powi(iteration as i32);

            params.zip_zip_apply(&first_moment, &second_moment, |x, m, v| {
                let m_hat = m / first_correction;
                let v_hat = v / second_correction;
                *x -= self.step * m_hat / (v_hat.sqrt() + self.epsilon);
            });

            let value = objective.evaluate(&params)?;
            outcome.record(&params, value);
            outcome.iterations = iteration;

            log::info!(
                "adam iteration {iteration:<4} - objective {value:1.10}. |gradient| {:1.4e}",
                gradient.norm()
            );
        }

        Ok(outcome)
    }
}
