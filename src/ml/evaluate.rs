//! Mean squared error and the model comparison table

use crate::structs::{CrimeError, ModelKind, ModelResult, Result, ResultsRow, ResultsTable};
use ndarray::Array1;

/// Average squared difference between predictions and ground truth
///
/// # Errors
/// Returns a length mismatch if the inputs differ in length and a numeric
/// error if they are empty
#[allow(clippy::cast_precision_loss)]
pub fn mean_squared_error(predicted: &Array1<f64>, truth: &Array1<f64>) -> Result<f64> {
    if predicted.len() != truth.len() {
        return Err(CrimeError::LengthMismatch {
            predicted: predicted.len(),
            truth: truth.len(),
        });
    }
    if truth.is_empty() {
        return Err(CrimeError::Numeric {
            column: "predictions".into(),
            reason: "cannot compute MSE of zero rows".into(),
        });
    }

    let sum: f64 = predicted
        .iter()
        .zip(truth)
        .map(|(p, t)| (p - t).powi(2))
        .sum();
    Ok(sum / truth.len() as f64)
}

impl ResultsTable {
    /// Empty table with one column per model
    #[must_use]
    pub fn new(models: Vec<ModelKind>) -> Self {
        Self {
            models,
            rows: Vec::new(),
        }
    }

    fn column(&self, model: ModelKind) -> Result<usize> {
        self.models
            .iter()
            .position(|&m| m == model)
            .ok_or_else(|| CrimeError::Config(format!("Model {model} is not a table column")))
    }

    /// Store one MSE, adding the feature-set row on first use
    ///
    /// # Errors
    /// Returns error if the model is not a column of the table
    pub fn record(&mut self, result: ModelResult) -> Result<()> {
        let col = self.column(result.model)?;
        let width = self.models.len();

        let existing = self
            .rows
            .iter()
            .position(|r| r.feature_set == result.feature_set);
        let index = if let Some(i) = existing {
            i
        } else {
            self.rows.push(ResultsRow {
                feature_set: result.feature_set,
                cells: vec![None; width],
            });
            self.rows.len() - 1
        };
        self.rows[index].cells[col] = Some(result.mse);
        Ok(())
    }

    /// Fold another table into this one; later values win
    ///
    /// # Errors
    /// Returns error if `other` has a model this table has no column for
    pub fn merge(&mut self, other: Self) -> Result<()> {
        for row in other.rows {
            for (model, cell) in other.models.iter().zip(row.cells) {
                if let Some(mse) = cell {
                    self.record(ModelResult {
                        model: *model,
                        feature_set: row.feature_set.clone(),
                        mse,
                    })?;
                }
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn get(&self, feature_set: &str, model: ModelKind) -> Option<f64> {
        let col = self.column(model).ok()?;
        self.rows
            .iter()
            .find(|r| r.feature_set == feature_set)
            .and_then(|r| r.cells[col])
    }

    /// Check that every cell holds a value
    ///
    /// # Errors
    /// Returns an error naming the first empty cell
    pub fn ensure_complete(&self) -> Result<()> {
        if self.rows.is_empty() {
            return Err(CrimeError::IncompleteResults("table has no rows".into()));
        }
        for row in &self.rows {
            if let Some(i) = row.cells.iter().position(Option::is_none) {
                return Err(CrimeError::IncompleteResults(format!(
                    "no MSE for {} on {}",
                    self.models[i], row.feature_set
                )));
            }
        }
        Ok(())
    }

    /// Lowest-MSE model of each row
    #[must_use]
    pub fn best_per_row(&self) -> Vec<(String, ModelKind, f64)> {
        self.rows
            .iter()
            .filter_map(|row| {
                self.models
                    .iter()
                    .zip(&row.cells)
                    .filter_map(|(m, c)| c.map(|v| (*m, v)))
                    .min_by(|a, b| a.1.total_cmp(&b.1))
                    .map(|(m, v)| (row.feature_set.clone(), m, v))
            })
            .collect()
    }
}
