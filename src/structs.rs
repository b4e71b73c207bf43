//! Consolidated public types for the crimefit crate
//!
//! This module contains all public structs, enums, and traits used across the crate.

use ndarray::{Array1, Array2};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug)]
pub enum CrimeError {
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Data access error: {0}")]
    DataAccess(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Numeric error in '{column}': {reason}")]
    Numeric { column: String, reason: String },

    #[error("Dimension mismatch: {features} feature rows but {targets} target values")]
    DimensionMismatch { features: usize, targets: usize },

    #[error("Length mismatch: {predicted} predictions but {truth} ground-truth values")]
    LengthMismatch { predicted: usize, truth: usize },

    #[error("Degenerate feature '{column}': zero variance, correlation is undefined")]
    DegenerateFeature { column: String },

    #[error("Incomplete results: {0}")]
    IncompleteResults(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, CrimeError>;

// ============================================================================
// Schema Types
// ============================================================================

/// Semantic type of a dataset column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Free text, e.g. the community name
    Label,
    /// Numeric code that identifies a row (state, county, ...)
    Identifier,
    /// Pre-assigned cross-validation fold
    Fold,
    /// Normalized decimal in [0, 1]
    Feature,
    /// Predictive count that is not range-checked
    RawCount,
    /// The value to predict
    Target,
}

impl ColumnKind {
    /// Whether the column may be used as a model input
    #[must_use]
    pub fn is_predictor(self) -> bool {
        matches!(self, Self::Feature | Self::RawCount)
    }

    /// Whether cells of this column hold numbers
    #[must_use]
    pub fn is_numeric(self) -> bool {
        !matches!(self, Self::Label)
    }

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Label => "label",
            Self::Identifier => "identifier",
            Self::Fold => "fold",
            Self::Feature => "feature",
            Self::RawCount => "raw-count",
            Self::Target => "target",
        }
    }
}

/// A named, typed column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

/// Ordered set of columns with exactly one target
#[derive(Debug, Clone)]
pub struct Schema {
    pub columns: Vec<Column>,
    /// Index of the target column
    pub target: usize,
}

// ============================================================================
// Dataset Types
// ============================================================================

/// A single typed cell
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Missing,
}

impl Cell {
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

/// One community: one cell per schema column
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub cells: Vec<Cell>,
}

/// Typed rows sharing one schema
#[derive(Debug, Clone)]
pub struct Dataset {
    pub schema: Schema,
    pub records: Vec<Record>,
}

impl Dataset {
    /// Get number of rows
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.records.len()
    }

    /// Get number of columns
    #[must_use]
    pub fn col_count(&self) -> usize {
        self.schema.columns.len()
    }

    /// Iterate over the cells of one column
    pub fn column_cells(&self, index: usize) -> impl Iterator<Item = &Cell> + '_ {
        self.records.iter().filter_map(move |r| r.cells.get(index))
    }

    /// Human-readable label of a row, built from its text columns
    #[must_use]
    pub fn row_label(&self, row: usize) -> String {
        let Some(record) = self.records.get(row) else {
            return format!("row {row}");
        };
        let parts: Vec<&str> = self
            .schema
            .columns
            .iter()
            .zip(&record.cells)
            .filter(|(c, _)| c.kind == ColumnKind::Label)
            .filter_map(|(_, cell)| match cell {
                Cell::Text(s) => Some(s.as_str()),
                _ => None,
            })
            .collect();
        if parts.is_empty() {
            format!("row {row}")
        } else {
            parts.join(" ")
        }
    }
}

// ============================================================================
// Missing-Value Types
// ============================================================================

/// Missing count for one column
#[derive(Debug, Clone)]
pub struct ColumnMissing {
    pub name: String,
    pub kind: ColumnKind,
    pub missing: usize,
}

/// Every numeric column that has at least one missing value
#[derive(Debug, Clone)]
pub struct MissingReport {
    pub row_count: usize,
    pub columns: Vec<ColumnMissing>,
}

/// How predictor columns with missing values are handled
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MissingPolicy {
    /// Drop every predictor column with a missing value
    Drop,
    /// Replace missing values with the column mean
    Mean,
    /// Impute columns whose missing fraction is at most `max_fraction`, drop the rest
    SparseMean { max_fraction: f64 },
}

impl Default for MissingPolicy {
    fn default() -> Self {
        Self::SparseMean { max_fraction: 0.01 }
    }
}

/// A column whose gaps were filled
#[derive(Debug, Clone)]
pub struct ImputedColumn {
    pub name: String,
    pub value: f64,
    pub filled: usize,
}

/// What the missing-value policy did
#[derive(Debug, Clone, Default)]
pub struct CleaningSummary {
    pub dropped: Vec<String>,
    pub imputed: Vec<ImputedColumn>,
}

// ============================================================================
// ML Types
// ============================================================================

/// Named dense feature matrix, rows are samples
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    /// Feature names (column headers)
    pub names: Vec<String>,
    pub values: Array2<f64>,
}

impl FeatureMatrix {
    /// Get number of samples (rows)
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.values.nrows()
    }

    /// Get number of features (columns)
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.names.len()
    }

    /// Get column index by name
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}

/// Dense predictors and target, ready for modeling
#[derive(Debug, Clone)]
pub struct ModelFrame {
    pub features: FeatureMatrix,
    pub target: Array1<f64>,
    pub target_name: String,
}

/// One feature's correlation with the target
#[derive(Debug, Clone, PartialEq)]
pub struct RankedFeature {
    pub name: String,
    pub correlation: f64,
    pub magnitude: f64,
}

/// Features ordered by absolute correlation with the target
#[derive(Debug, Clone)]
pub struct FeatureRanking {
    pub target: String,
    pub entries: Vec<RankedFeature>,
    /// Zero-variance columns left out of the ranking
    pub degenerate: Vec<String>,
}

/// Disjoint train/test row indices
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub seed: u64,
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Neighbour weighting for KNN
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weighting {
    Uniform,
    Distance,
}

/// Distance metric for KNN
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Euclidean,
    Manhattan,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KnnParams {
    pub k: usize,
    pub weighting: Weighting,
    pub metric: Metric,
}

impl Default for KnnParams {
    fn default() -> Self {
        Self {
            k: 10,
            weighting: Weighting::Distance,
            metric: Metric::Euclidean,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LassoParams {
    /// L1 regularization strength
    pub alpha: f64,
    pub max_iterations: u32,
    pub tolerance: f64,
}

impl Default for LassoParams {
    fn default() -> Self {
        Self {
            alpha: 1e-4,
            max_iterations: 1000,
            tolerance: 1e-4,
        }
    }
}

/// Regression strategy with its hyperparameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModelSpec {
    Baseline,
    LinearRegression,
    Knn(KnnParams),
    Lasso(LassoParams),
}

/// Column identifier of a model in the results table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ModelKind {
    #[serde(rename = "NULL")]
    Null,
    #[serde(rename = "MLR")]
    Mlr,
    #[serde(rename = "KNN")]
    Knn,
    #[serde(rename = "LASSO")]
    Lasso,
}

impl ModelKind {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Mlr => "MLR",
            Self::Knn => "KNN",
            Self::Lasso => "LASSO",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The set of models compared in one run
#[derive(Debug, Clone, PartialEq)]
pub struct ModelBank {
    pub models: Vec<ModelSpec>,
}

/// MSE of one model on one feature set
#[derive(Debug, Clone, PartialEq)]
pub struct ModelResult {
    pub model: ModelKind,
    pub feature_set: String,
    pub mse: f64,
}

/// One feature-set row of the results table
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsRow {
    pub feature_set: String,
    pub cells: Vec<Option<f64>>,
}

/// MSE per feature set (rows) and model (columns)
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsTable {
    pub models: Vec<ModelKind>,
    pub rows: Vec<ResultsRow>,
}

/// Split used by one experiment
#[derive(Debug, Clone, Serialize)]
pub struct ExperimentSplit {
    pub feature_set: String,
    pub features: Vec<String>,
    pub seed: u64,
    pub train_rows: usize,
    pub test_rows: usize,
}

/// Everything a pipeline run produces
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub ranking: FeatureRanking,
    pub table: ResultsTable,
    pub experiments: Vec<ExperimentSplit>,
}
