#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::uninlined_format_args)]

mod csv_reader;
mod ml;
mod schema;
mod structs;

use clap::{Args, Parser, Subcommand, ValueEnum};
use csv_reader::{CsvData, LoadOptions};
use env_logger::Env;
use log::info;
use ml::pipeline::{Experiment, PipelineConfig};
use std::path::{Path, PathBuf};
use structs::{
    Cell, CleaningSummary, CrimeError, Dataset, KnnParams, LassoParams, Metric, MissingPolicy,
    MissingReport, ModelBank, ModelFrame, Result, Schema, Weighting,
};

/// Crimefit - compare regression models for per-capita violent crime
#[derive(Parser, Debug)]
#[command(name = "crimefit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rank features, fit every model on both feature sets, write result files
    Run {
        #[command(flatten)]
        data: DataArgs,

        /// Number of top-ranked features in the first experiment
        #[arg(long, default_value = "11")]
        top_k: usize,

        /// Fraction of rows held out for testing
        #[arg(long, default_value = "0.2")]
        test_ratio: f64,

        /// Split seed of the top-k experiment
        #[arg(long, default_value = "12")]
        top_k_seed: u64,

        /// Split seed of the all-features experiment
        #[arg(long, default_value = "13")]
        all_seed: u64,

        /// Neighbours used by KNN
        #[arg(long, default_value = "10")]
        knn_k: usize,

        /// KNN neighbour weighting
        #[arg(long, value_enum, default_value = "distance")]
        knn_weights: WeightsArg,

        /// KNN distance metric
        #[arg(long, value_enum, default_value = "euclidean")]
        knn_metric: MetricArg,

        /// Lasso L1 penalty
        #[arg(long, default_value = "0.0001")]
        lasso_alpha: f64,

        /// Lasso coordinate-descent iteration cap
        #[arg(long, default_value = "1000")]
        lasso_max_iter: u32,

        /// Lasso convergence tolerance
        #[arg(long, default_value = "0.0001")]
        lasso_tol: f64,

        /// Output directory for result files
        #[arg(short, long, default_value = "./crimefit_output")]
        output_dir: PathBuf,
    },

    /// Print features ranked by absolute correlation with the target
    Rank {
        #[command(flatten)]
        data: DataArgs,

        /// Only print the first N features
        #[arg(long)]
        top_k: Option<usize>,
    },

    /// Print the shape, missing values and first rows of the input
    Inspect {
        #[command(flatten)]
        data: DataArgs,
    },
}

/// Options shared by every subcommand
#[derive(Args, Debug)]
struct DataArgs {
    /// Input CSV/TSV file
    #[arg(short, long)]
    csv: PathBuf,

    /// Column layout of the input
    #[arg(long, value_enum, default_value = "communities")]
    schema: SchemaArg,

    /// Target column (inferred schema only)
    #[arg(long, default_value = schema::COMMUNITIES_TARGET)]
    target: String,

    /// Non-predictive code column (inferred schema only, repeatable)
    #[arg(long = "identifier")]
    identifiers: Vec<String>,

    /// Treat input as TSV instead of CSV
    #[arg(long)]
    tsv: bool,

    /// The input has no header row
    #[arg(long)]
    no_header: bool,

    /// What to do with predictor columns that have missing values
    #[arg(long, value_enum, default_value = "sparse-mean")]
    missing: MissingArg,

    /// Largest missing fraction a column may have and still be imputed
    #[arg(long, default_value = "0.01")]
    impute_threshold: f64,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SchemaArg {
    /// The 128-column UCI Communities and Crime layout
    Communities,
    /// Derive column kinds from the header and the values
    Infer,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum MissingArg {
    Drop,
    Mean,
    SparseMean,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum WeightsArg {
    Distance,
    Uniform,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum MetricArg {
    Euclidean,
    Manhattan,
}

impl From<WeightsArg> for Weighting {
    fn from(arg: WeightsArg) -> Self {
        match arg {
            WeightsArg::Distance => Self::Distance,
            WeightsArg::Uniform => Self::Uniform,
        }
    }
}

impl From<MetricArg> for Metric {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::Euclidean => Self::Euclidean,
            MetricArg::Manhattan => Self::Manhattan,
        }
    }
}

impl DataArgs {
    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            delimiter: if self.tsv { b'\t' } else { b',' },
            has_headers: !self.no_header,
        }
    }

    fn policy(&self) -> MissingPolicy {
        match self.missing {
            MissingArg::Drop => MissingPolicy::Drop,
            MissingArg::Mean => MissingPolicy::Mean,
            MissingArg::SparseMean => MissingPolicy::SparseMean {
                max_fraction: self.impute_threshold,
            },
        }
    }

    /// Read the input and type it against the chosen schema
    fn load(&self) -> Result<Dataset> {
        let options = self.load_options();

        let dataset = match self.schema {
            SchemaArg::Communities => Dataset::load(&self.csv, &Schema::communities(), options)?,
            SchemaArg::Infer => {
                if self.no_header {
                    return Err(CrimeError::Config(
                        "An inferred schema needs a header row".into(),
                    ));
                }
                let csv = CsvData::from_file(&self.csv, options)?;
                let schema = Schema::infer(&csv, &self.target, &self.identifiers)?;
                Dataset::from_csv(&csv, &schema)?
            }
        };

        info!(
            "Loaded {} rows x {} columns from {}",
            dataset.row_count(),
            dataset.col_count(),
            self.csv.display()
        );
        Ok(dataset)
    }

    /// Load and clean into a model frame
    fn frame(&self) -> Result<(Dataset, ModelFrame, CleaningSummary)> {
        let dataset = self.load()?;
        let (frame, cleaning) = ModelFrame::from_dataset(&dataset, self.policy())?;
        info!(
            "Model frame: {} rows, {} predictors ({} dropped, {} imputed)",
            frame.n_samples(),
            frame.features.n_features(),
            cleaning.dropped.len(),
            cleaning.imputed.len()
        );
        Ok((dataset, frame, cleaning))
    }
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run {
            data,
            top_k,
            test_ratio,
            top_k_seed,
            all_seed,
            knn_k,
            knn_weights,
            knn_metric,
            lasso_alpha,
            lasso_max_iter,
            lasso_tol,
            output_dir,
        }) => {
            let config = PipelineConfig {
                experiments: vec![
                    Experiment::top_k(top_k, top_k_seed),
                    Experiment::all(all_seed),
                ],
                bank: ModelBank::new(
                    KnnParams {
                        k: knn_k,
                        weighting: knn_weights.into(),
                        metric: knn_metric.into(),
                    },
                    LassoParams {
                        alpha: lasso_alpha,
                        max_iterations: lasso_max_iter,
                        tolerance: lasso_tol,
                    },
                ),
                test_ratio,
            };
            run_pipeline(&data, &config, &output_dir)
        }

        Some(Commands::Rank { data, top_k }) => run_rank(&data, top_k),

        Some(Commands::Inspect { data }) => run_inspect(&data),

        None => {
            eprintln!("No subcommand provided. Use 'crimefit run', 'rank' or 'inspect'.");
            eprintln!("Run 'crimefit --help' for usage information.");
            std::process::exit(1);
        }
    }
}

/// Run both experiments and write every output file
fn run_pipeline(data: &DataArgs, config: &PipelineConfig, output_dir: &Path) -> Result<()> {
    let (dataset, frame, cleaning) = data.frame()?;
    let report = MissingReport::scan(&dataset);

    info!("Running experiments...");
    let outcome = ml::pipeline::run_pipeline(&frame, config)?;

    std::fs::create_dir_all(output_dir)?;
    info!("Writing output files...");

    let source = data.csv.display().to_string();
    let summary = ml::output::render_summary(&source, &frame, &cleaning, &outcome, 15)?;
    ml::output::write_results_csv(output_dir, &outcome.table)?;
    ml::output::write_results_json(output_dir, &frame, &outcome)?;
    ml::output::write_ranking_csv(output_dir, &outcome.ranking)?;
    ml::output::write_missing_csv(output_dir, &report, &cleaning)?;
    ml::output::write_summary(output_dir, &summary)?;

    for (feature_set, model, mse) in outcome.table.best_per_row() {
        info!("Best on {feature_set}: {model} (MSE {mse:.6})");
    }

    eprintln!("Output written to {}", output_dir.display());
    eprintln!("  - results.csv");
    eprintln!("  - results.json");
    eprintln!("  - ranking.csv");
    eprintln!("  - missing.csv");
    eprintln!("  - summary.txt");

    Ok(())
}

/// Print the feature ranking to stdout
fn run_rank(data: &DataArgs, top_k: Option<usize>) -> Result<()> {
    let (_, frame, _) = data.frame()?;
    let ranking = ml::ranking::rank_features(&frame)?;
    let limit = top_k.unwrap_or_else(|| ranking.len());

    println!("rank,feature,correlation,abs_correlation");
    for (i, entry) in ranking.entries.iter().take(limit).enumerate() {
        println!(
            "{},{},{:.6},{:.6}",
            i + 1,
            entry.name,
            entry.correlation,
            entry.magnitude
        );
    }
    if !ranking.degenerate.is_empty() {
        eprintln!("Constant columns skipped: {}", ranking.degenerate.join(", "));
    }

    Ok(())
}

/// Print shape, missing values and a preview of the input
fn run_inspect(data: &DataArgs) -> Result<()> {
    let dataset = data.load()?;
    let report = MissingReport::scan(&dataset);

    println!(
        "Shape: {} rows x {} columns (target: {})",
        dataset.row_count(),
        dataset.col_count(),
        dataset.schema.target_column().name
    );

    if report.columns.is_empty() {
        println!("No missing values");
    } else {
        println!("Columns with missing values:");
        for column in &report.columns {
            println!(
                "  {:<24} {:<10} {:>6}",
                column.name,
                column.kind.display_name(),
                column.missing
            );
        }
    }

    let names = dataset.schema.names();
    println!("First rows:");
    for (i, record) in dataset.records.iter().take(3).enumerate() {
        let preview: Vec<String> = names
            .iter()
            .zip(&record.cells)
            .take(8)
            .map(|(name, cell)| format!("{name}={}", cell_text(cell)))
            .collect();
        println!("  [{}] {}", dataset.row_label(i), preview.join(" "));
    }

    Ok(())
}

fn cell_text(cell: &Cell) -> String {
    match cell {
        Cell::Text(s) => s.clone(),
        Cell::Number(v) => format!("{v}"),
        Cell::Missing => "?".into(),
    }
}
