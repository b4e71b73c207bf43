//! Experiment pipeline that orchestrates ranking, splitting, fitting and scoring

use crate::ml::evaluate::mean_squared_error;
use crate::ml::ranking::rank_features;
use crate::ml::split::train_test_split;
use crate::structs::{
    CrimeError, ExperimentSplit, FeatureRanking, ModelBank, ModelFrame, ModelResult,
    PipelineOutcome, Result, ResultsTable,
};
use log::info;

/// Which columns an experiment trains on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureSelection {
    /// The `k` features most correlated with the target
    TopK(usize),
    /// Every predictor of the frame
    All,
}

/// One row of the results table
#[derive(Debug, Clone)]
pub struct Experiment {
    pub selection: FeatureSelection,
    pub seed: u64,
}

impl Experiment {
    #[must_use]
    pub fn top_k(k: usize, seed: u64) -> Self {
        Self {
            selection: FeatureSelection::TopK(k),
            seed,
        }
    }

    #[must_use]
    pub fn all(seed: u64) -> Self {
        Self {
            selection: FeatureSelection::All,
            seed,
        }
    }

    /// Row name in the results table, from the number of features actually used
    #[must_use]
    pub fn feature_set(&self, n_features: usize) -> String {
        match self.selection {
            FeatureSelection::TopK(_) => format!("top{n_features}_features"),
            FeatureSelection::All => "all_features".into(),
        }
    }
}

/// Configuration for the pipeline
pub struct PipelineConfig {
    pub experiments: Vec<Experiment>,
    pub bank: ModelBank,
    pub test_ratio: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            experiments: vec![Experiment::top_k(11, 12), Experiment::all(13)],
            bank: ModelBank::default(),
            test_ratio: 0.2,
        }
    }
}

/// Run one experiment on its own split and return its own table
///
/// # Errors
/// Returns error if the selection, split, any fit, or any score fails
pub fn run_experiment(
    frame: &ModelFrame,
    ranking: &FeatureRanking,
    experiment: &Experiment,
    bank: &ModelBank,
    test_ratio: f64,
) -> Result<(ResultsTable, ExperimentSplit)> {
    bank.validate()?;

    let selected = match experiment.selection {
        FeatureSelection::TopK(0) => {
            return Err(CrimeError::Config(
                "Top-k experiment selects zero features".into(),
            ));
        }
        FeatureSelection::TopK(k) => frame.select(&ranking.top_k(k))?,
        FeatureSelection::All => frame.clone(),
    };

    let split = train_test_split(selected.n_samples(), test_ratio, experiment.seed)?;
    let (train_x, train_y) = selected.subset(&split.train);
    let (test_x, test_y) = selected.subset(&split.test);
    let feature_set = experiment.feature_set(selected.features.n_features());

    info!(
        "Experiment '{}': {} features, {} train / {} test rows (seed {})",
        feature_set,
        train_x.n_features(),
        split.train.len(),
        split.test.len(),
        split.seed
    );

    let mut table = ResultsTable::new(bank.kinds());
    for spec in &bank.models {
        let model = spec.fit(&train_x, &train_y)?;
        let predicted = model.predict(&test_x)?;
        let mse = mean_squared_error(&predicted, &test_y)?;

        info!("  {:<5} MSE = {mse:.6}", model.kind().label());
        table.record(ModelResult {
            model: model.kind(),
            feature_set: feature_set.clone(),
            mse,
        })?;
    }

    Ok((
        table,
        ExperimentSplit {
            feature_set,
            features: selected.features.names,
            seed: split.seed,
            train_rows: split.train.len(),
            test_rows: split.test.len(),
        },
    ))
}

/// Rank features once, run every experiment, merge the tables
///
/// # Errors
/// Returns error if ranking or any experiment fails; the merged table is
/// checked to be complete
pub fn run_pipeline(frame: &ModelFrame, config: &PipelineConfig) -> Result<PipelineOutcome> {
    if config.experiments.is_empty() {
        return Err(CrimeError::Config("No experiments configured".into()));
    }
    config.bank.validate()?;

    let ranking = rank_features(frame)?;
    if ranking.is_empty() {
        return Err(CrimeError::Schema(
            "Every predictor has zero variance, nothing to rank".into(),
        ));
    }
    let mut table = ResultsTable::new(config.bank.kinds());
    let mut experiments = Vec::with_capacity(config.experiments.len());

    for experiment in &config.experiments {
        let (partial, split) =
            run_experiment(frame, &ranking, experiment, &config.bank, config.test_ratio)?;
        table.merge(partial)?;
        experiments.push(split);
    }

    table.ensure_complete()?;

    Ok(PipelineOutcome {
        ranking,
        table,
        experiments,
    })
}
