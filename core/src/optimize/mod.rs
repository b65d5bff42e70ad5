//! Gradient based minimization of scalar objectives over flat parameter vectors.
mod adam;
mod gradient_descent;

use std::str::FromStr;

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

pub use adam::Adam;
pub use gradient_descent::GradientDescent;

use crate::error::{Error, Result};

/// Step of the central difference gradient.
pub const DEFAULT_DIFFERENCE_STEP: f64 = 1e-6;

/// A scalar function of a parameter vector.
pub trait Objective {
    fn evaluate(&self, params: &DVector<f64>) -> Result<f64>;

    /// Defaults to central differences with [`DEFAULT_DIFFERENCE_STEP`].
    fn gradient(&self, params: &DVector<f64>) -> Result<DVector<f64>> {
        central_difference(|x| self.evaluate(x), params, DEFAULT_DIFFERENCE_STEP)
    }
}

/// (f(x + h e_i) - f(x - h e_i)) / 2h for every component i. Errors of `f` abort the gradient.
pub fn central_difference(
    f: impl Fn(&DVector<f64>) -> Result<f64>,
    params: &DVector<f64>,
    step: f64,
) -> Result<DVector<f64>> {
    let mut gradient = DVector::zeros(params.len());
    let mut shifted = params.clone();

    for i in 0..params.len() {
        shifted[i] = params[i] + step;
        let forward = f(&shifted)?;
        shifted[i] = params[i] - step;
        let backward = f(&shifted)?;
        shifted[i] = params[i];

        gradient[i] = (forward - backward) / (2.0 * step);
    }

    Ok(gradient)
}

/// Best point found by an [`Optimizer`], and how it got there.
#[derive(Clone, Debug)]
pub struct OptimizationOutcome {
    pub best_params: DVector<f64>,
    pub best_value: f64,
    pub iterations: usize,
    /// objective value at every visited point, starting with the initial one
    pub history: Vec<f64>,
}

impl OptimizationOutcome {
    fn start(initial: &DVector<f64>, value: f64) -> Self {
        Self {
            best_params: initial.clone(),
            best_value: value,
            iterations: 0,
            history: vec![value],
        }
    }

    fn record(&mut self, params: &DVector<f64>, value: f64) {
        self.history.push(value);
        if value < self.best_value {
            self.best_value = value;
            self.best_params.copy_from(params);
        }
    }
}

pub trait Optimizer {
    fn minimize(
        &self,
        objective: &dyn Objective,
        initial: DVector<f64>,
    ) -> Result<OptimizationOutcome>;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OptimizationMethod {
    Adam,
    GradientDescent,
}

impl FromStr for OptimizationMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "adam" => Ok(OptimizationMethod::Adam),
            "gd" => Ok(OptimizationMethod::GradientDescent),
            _ => Err(Error::UnknownOptimizer(s.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// `adam` or `gd`
    pub method: String,
    pub step: f64,
    pub max_iterations: usize,
    /// step of the central difference gradient
    pub difference_step: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            method: "adam".to_string(),
            step: 2e-3,
            max_iterations: 50,
            difference_step: DEFAULT_DIFFERENCE_STEP,
        }
    }
}

/// Minimize `objective` from `initial` with the method named in `config`.
pub fn minimize(
    objective: &dyn Objective,
    initial: DVector<f64>,
    config: &OptimizerConfig,
) -> Result<OptimizationOutcome> {
    let optimizer: Box<dyn Optimizer> = match config.method.parse()? {
        OptimizationMethod::Adam => Box::new(Adam::new(config.step, config.max_iterations)),
        OptimizationMethod::GradientDescent => {
            Box::new(GradientDescent::new(config.step, config.max_iterations))
        }
    };

    log::info!(
        "minimizing over {} parameters with {} (step {}, {} iterations)",
        initial.len(),
        config.method,
        config.step,
        config.max_iterations
    );
    optimizer.minimize(objective, initial)
}

#[cfg(test)]
pub(crate) mod tests {
    use approx::assert_relative_eq;
    use nalgebra::DVector;

    use crate::error::{Error, Result};

    use super::{central_difference, minimize, Objective, OptimizerConfig};

    /// sum_i (x_i - c_i)^2, gradient by finite differences
    pub(crate) struct Quadratic {
        pub center: DVector<f64>,
    }

    impl Objective for Quadratic {
        fn evaluate(&self, params: &DVector<f64>) -> Result<f64> {
            Ok((params - &self.center).norm_squared())
        }
    }

    #[test]
    fn central_difference_of_quadratic_is_exact() {
        let quadratic = Quadratic {
            center: DVector::from_vec(vec![1.0, -2.0, 0.5]),
        };
        let x = DVector::from_vec(vec![0.0, 0.0, 0.0]);

        let gradient = quadratic.gradient(&x).unwrap();
        assert_relative_eq!(gradient, DVector::from_vec(vec![-2.0, 4.0, -1.0]), epsilon = 1e-6);
    }

    #[test]
    fn central_difference_propagates_errors() {
        let failing = |_: &DVector<f64>| -> Result<f64> { Err(Error::SingularMatrix("S_22")) };
        assert!(central_difference(failing, &DVector::zeros(2), 1e-6).is_err());
    }

    #[test]
    fn unknown_methods_are_rejected() {
        let quadratic = Quadratic {
            center: DVector::zeros(1),
        };
        let config = OptimizerConfig {
            method: "lbfgs".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            minimize(&quadratic, DVector::zeros(1), &config),
            Err(Error::UnknownOptimizer(_))
        ));
    }

    #[test]
    fn both_methods_decrease_a_quadratic() {
        let quadratic = Quadratic {
            center: DVector::from_vec(vec![1.0, -2.0]),
        };

        for method in ["adam", "gd"] {
            let config = OptimizerConfig {
                method: method.to_string(),
                step: 0.1,
                max_iterations: 200,
                ..Default::default()
            };
            let outcome = minimize(&quadratic, DVector::zeros(2), &config).unwrap();

            assert_eq!(outcome.history[0], 5.0);
            assert!(outcome.best_value < 1e-3, "{method}: {}", outcome.best_value);
            assert_relative_eq!(outcome.best_params, quadratic.center, epsilon = 0.05);
        }
    }
}
