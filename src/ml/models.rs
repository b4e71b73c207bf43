//! Model bank: a uniform fit/predict contract over the regression strategies

use crate::ml::knn::KnnRegressor;
use crate::ml::linear::{LassoRegressor, OlsRegressor};
use crate::structs::{
    CrimeError, FeatureMatrix, KnnParams, LassoParams, ModelBank, ModelKind, ModelSpec, Result,
};
use log::debug;
use ndarray::Array1;

/// Fitted state of each strategy
enum Fitted {
    Baseline { mean: f64 },
    Linear(OlsRegressor),
    Knn(KnnRegressor),
    Lasso(LassoRegressor),
}

/// A model fitted on a fixed, named set of feature columns
pub struct TrainedModel {
    kind: ModelKind,
    feature_names: Vec<String>,
    fitted: Fitted,
}

impl ModelSpec {
    #[must_use]
    pub fn kind(&self) -> ModelKind {
        match self {
            Self::Baseline => ModelKind::Null,
            Self::LinearRegression => ModelKind::Mlr,
            Self::Knn(_) => ModelKind::Knn,
            Self::Lasso(_) => ModelKind::Lasso,
        }
    }

    /// Fit the model on training features and targets
    ///
    /// # Errors
    /// Returns a dimension mismatch if row counts differ, a numeric error for
    /// empty or non-finite input, and any error of the underlying strategy
    pub fn fit(&self, features: &FeatureMatrix, target: &Array1<f64>) -> Result<TrainedModel> {
        if features.n_samples() != target.len() {
            return Err(CrimeError::DimensionMismatch {
                features: features.n_samples(),
                targets: target.len(),
            });
        }
        if features.values.ncols() != features.n_features() {
            return Err(CrimeError::Schema(format!(
                "Feature matrix has {} columns but {} names",
                features.values.ncols(),
                features.n_features()
            )));
        }
        if target.is_empty() {
            return Err(CrimeError::Numeric {
                column: "target".into(),
                reason: format!("cannot fit {} on zero rows", self.kind()),
            });
        }
        check_finite(features, target)?;

        let fitted = match self {
            Self::Baseline => Fitted::Baseline {
                mean: target.mean().unwrap_or_default(),
            },
            Self::LinearRegression => {
                let model = OlsRegressor::fit(&features.values, target)?;
                debug!(
                    "MLR intercept {:.6}, coefficients {:.4}",
                    model.intercept(),
                    model.coefficients()
                );
                Fitted::Linear(model)
            }
            Self::Knn(params) => Fitted::Knn(KnnRegressor::fit(*params, &features.values, target)?),
            Self::Lasso(params) => {
                let model = LassoRegressor::fit(*params, &features.values, target)?;
                debug!("LASSO intercept {:.6}", model.intercept());
                Fitted::Lasso(model)
            }
        };

        debug!(
            "Fitted {} on {} rows x {} features",
            self.kind(),
            features.n_samples(),
            features.n_features()
        );

        Ok(TrainedModel {
            kind: self.kind(),
            feature_names: features.names.clone(),
            fitted,
        })
    }
}

/// Reject NaN and infinities before they reach a solver
fn check_finite(features: &FeatureMatrix, target: &Array1<f64>) -> Result<()> {
    if let Some(row) = target.iter().position(|v| !v.is_finite()) {
        return Err(CrimeError::Numeric {
            column: "target".into(),
            reason: format!("non-finite value at training row {row}"),
        });
    }
    for (name, column) in features.names.iter().zip(features.values.columns()) {
        if let Some(row) = column.iter().position(|v| !v.is_finite()) {
            return Err(CrimeError::Numeric {
                column: name.clone(),
                reason: format!("non-finite value at training row {row}"),
            });
        }
    }
    Ok(())
}

impl TrainedModel {
    #[must_use]
    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    /// Predict the target for every row
    ///
    /// # Errors
    /// Returns a schema error if the columns differ from those seen at fit time
    pub fn predict(&self, features: &FeatureMatrix) -> Result<Array1<f64>> {
        if features.names != self.feature_names {
            return Err(CrimeError::Schema(format!(
                "{} was fitted on [{}] but got [{}]",
                self.kind,
                self.feature_names.join(", "),
                features.names.join(", ")
            )));
        }
        if features.values.ncols() != self.feature_names.len() {
            return Err(CrimeError::Schema(format!(
                "{} expects {} columns, got {}",
                self.kind,
                self.feature_names.len(),
                features.values.ncols()
            )));
        }

        let x = &features.values;
        Ok(match &self.fitted {
            Fitted::Baseline { mean } => Array1::from_elem(x.nrows(), *mean),
            Fitted::Linear(model) => model.predict(x),
            Fitted::Knn(model) => model.predict(x),
            Fitted::Lasso(model) => model.predict(x),
        })
    }
}

impl ModelBank {
    /// Baseline, OLS and Lasso plus KNN with the given hyperparameters
    #[must_use]
    pub fn new(knn: KnnParams, lasso: LassoParams) -> Self {
        Self {
            models: vec![
                ModelSpec::Baseline,
                ModelSpec::LinearRegression,
                ModelSpec::Knn(knn),
                ModelSpec::Lasso(lasso),
            ],
        }
    }

    /// Result-table columns, in bank order
    #[must_use]
    pub fn kinds(&self) -> Vec<ModelKind> {
        self.models.iter().map(ModelSpec::kind).collect()
    }

    /// Check that the bank can fill a results table
    ///
    /// Table columns are keyed by model kind, so each kind may appear once.
    ///
    /// # Errors
    /// Returns a config error if the bank is empty or repeats a kind
    pub fn validate(&self) -> Result<()> {
        if self.models.is_empty() {
            return Err(CrimeError::Config("Model bank is empty".into()));
        }
        let kinds = self.kinds();
        for (i, kind) in kinds.iter().enumerate() {
            if kinds[..i].contains(kind) {
                return Err(CrimeError::Config(format!(
                    "Model bank lists {kind} more than once"
                )));
            }
        }
        Ok(())
    }
}

impl Default for ModelBank {
    fn default() -> Self {
        Self::new(KnnParams::default(), LassoParams::default())
    }
}
