use crate::structs::{CrimeError, FeatureMatrix, ModelFrame, Result};
use ndarray::{Array1, Axis};

impl FeatureMatrix {
    /// Keep only the named columns, in the given order
    ///
    /// # Errors
    /// Returns a schema error if a name is not a column of the matrix
    pub fn select(&self, names: &[String]) -> Result<Self> {
        let indices = names
            .iter()
            .map(|name| {
                self.column_index(name).ok_or_else(|| {
                    CrimeError::Schema(format!("Unknown feature column '{name}'"))
                })
            })
            .collect::<Result<Vec<usize>>>()?;

        Ok(Self {
            names: names.to_vec(),
            values: self.values.select(Axis(1), &indices),
        })
    }

    /// Keep only the given rows, in the given order
    #[must_use]
    pub fn rows(&self, indices: &[usize]) -> Self {
        Self {
            names: self.names.clone(),
            values: self.values.select(Axis(0), indices),
        }
    }
}

impl ModelFrame {
    /// Get number of samples
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.target.len()
    }

    /// Project the frame onto a subset of its predictors
    ///
    /// # Errors
    /// Returns a schema error if a name is unknown
    pub fn select(&self, names: &[String]) -> Result<Self> {
        Ok(Self {
            features: self.features.select(names)?,
            target: self.target.clone(),
            target_name: self.target_name.clone(),
        })
    }

    /// Features and target of the given rows
    ///
    /// # Panics
    /// Panics if an index is out of bounds
    #[must_use]
    pub fn subset(&self, indices: &[usize]) -> (FeatureMatrix, Array1<f64>) {
        (
            self.features.rows(indices),
            self.target.select(Axis(0), indices),
        )
    }
}
