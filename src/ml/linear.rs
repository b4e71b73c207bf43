//! Linear models backed by linfa: ordinary least squares and Lasso

use crate::structs::{CrimeError, LassoParams, Result};
use linfa::traits::{Fit, Predict};
use linfa::DatasetBase;
use linfa_elasticnet::ElasticNet;
use linfa_linear::{FittedLinearRegression, LinearRegression};
use ndarray::{Array1, Array2, Axis};

/// Ordinary least squares with intercept
pub struct OlsRegressor {
    model: FittedLinearRegression<f64>,
}

impl OlsRegressor {
    /// Fit coefficients minimising squared error
    ///
    /// # Errors
    /// Returns a model error if the normal equations cannot be solved
    pub fn fit(x: &Array2<f64>, y: &Array1<f64>) -> Result<Self> {
        let dataset = DatasetBase::new(x.clone(), y.clone());
        let model = LinearRegression::new()
            .fit(&dataset)
            .map_err(|e| CrimeError::Model(format!("Linear regression failed: {e}")))?;
        Ok(Self { model })
    }

    #[must_use]
    pub fn predict(&self, x: &Array2<f64>) -> Array1<f64> {
        self.model.predict(x)
    }

    #[must_use]
    pub fn coefficients(&self) -> &Array1<f64> {
        self.model.params()
    }

    #[must_use]
    pub fn intercept(&self) -> f64 {
        self.model.intercept()
    }
}

/// L1-regularised linear regression
///
/// Minimises `1/(2n) * ||y - Xw - b||^2 + alpha * ||w||_1` by coordinate
/// descent. Inputs are centered on the training means before they reach the
/// solver so that the intercept is exactly the target mean.
pub struct LassoRegressor {
    means: Array1<f64>,
    model: ElasticNet<f64>,
}

impl LassoRegressor {
    /// # Errors
    /// Returns a config error for a negative or non-finite `alpha` and a
    /// model error if the solver fails
    pub fn fit(params: LassoParams, x: &Array2<f64>, y: &Array1<f64>) -> Result<Self> {
        if !(params.alpha.is_finite() && params.alpha >= 0.0) {
            return Err(CrimeError::Config(format!(
                "Lasso alpha must be a non-negative number, got {}",
                params.alpha
            )));
        }

        let means = x
            .mean_axis(Axis(0))
            .ok_or_else(|| CrimeError::Model("Lasso needs at least one training row".into()))?;
        let centered = x - &means;

        let dataset = DatasetBase::new(centered, y.clone());
        let model = ElasticNet::<f64>::params()
            .penalty(params.alpha)
            .l1_ratio(1.0)
            .max_iterations(params.max_iterations)
            .tolerance(params.tolerance)
            .fit(&dataset)
            .map_err(|e| CrimeError::Model(format!("Lasso failed: {e}")))?;

        Ok(Self { means, model })
    }

    #[must_use]
    pub fn predict(&self, x: &Array2<f64>) -> Array1<f64> {
        let centered = x - &self.means;
        self.model.predict(&centered)
    }

    #[must_use]
    pub fn intercept(&self) -> f64 {
        self.model.intercept()
    }
}
