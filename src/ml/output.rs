//! Output file writers for a pipeline run

use crate::structs::{
    CleaningSummary, ExperimentSplit, FeatureRanking, MissingReport, ModelFrame, ModelKind,
    PipelineOutcome, Result, ResultsTable,
};
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// Width of the longest bar in the summary chart
const BAR_WIDTH: usize = 40;

/// Write `results.csv` - one row per feature set, one MSE column per model
///
/// # Errors
/// Returns error if the table is incomplete or the file cannot be written
pub fn write_results_csv(output_dir: &Path, table: &ResultsTable) -> Result<()> {
    table.ensure_complete()?;

    let path = output_dir.join("results.csv");
    let mut content = String::from("feature_set");
    for model in &table.models {
        let _ = write!(content, ",{model}");
    }
    content.push('\n');

    for row in &table.rows {
        content.push_str(&row.feature_set);
        for mse in row.cells.iter().flatten() {
            let _ = write!(content, ",{mse:.8}");
        }
        content.push('\n');
    }

    fs::write(path, content)?;
    Ok(())
}

/// Write `results.json` - machine-readable results with the split of each experiment
///
/// # Errors
/// Returns error if the table is incomplete or the file cannot be written
pub fn write_results_json(
    output_dir: &Path,
    frame: &ModelFrame,
    outcome: &PipelineOutcome,
) -> Result<()> {
    outcome.table.ensure_complete()?;

    let path = output_dir.join("results.json");
    let best = outcome.table.best_per_row();

    let results = outcome
        .table
        .rows
        .iter()
        .map(|row| FeatureSetEntry {
            feature_set: row.feature_set.clone(),
            scores: outcome
                .table
                .models
                .iter()
                .zip(row.cells.iter().flatten())
                .map(|(&model, &mse)| ModelScore { model, mse })
                .collect(),
            best: best
                .iter()
                .find(|(set, _, _)| *set == row.feature_set)
                .map(|(_, model, _)| *model),
        })
        .collect();

    let output = ResultsOutput {
        target: &frame.target_name,
        row_count: frame.n_samples(),
        predictor_count: frame.features.n_features(),
        models: &outcome.table.models,
        results,
        experiments: &outcome.experiments,
    };

    let json = serde_json::to_string_pretty(&output)?;
    fs::write(path, json)?;
    Ok(())
}

/// Write `ranking.csv` - every ranked feature with its correlation
///
/// # Errors
/// Returns error if file cannot be written
pub fn write_ranking_csv(output_dir: &Path, ranking: &FeatureRanking) -> Result<()> {
    let path = output_dir.join("ranking.csv");
    let mut content = String::from("rank,feature,correlation,abs_correlation\n");

    for (i, entry) in ranking.entries.iter().enumerate() {
        let _ = writeln!(
            content,
            "{},{},{:.6},{:.6}",
            i + 1,
            entry.name,
            entry.correlation,
            entry.magnitude
        );
    }

    fs::write(path, content)?;
    Ok(())
}

/// Write `missing.csv` - missing counts and what was done about them
///
/// # Errors
/// Returns error if file cannot be written
#[allow(clippy::cast_precision_loss)]
pub fn write_missing_csv(
    output_dir: &Path,
    report: &MissingReport,
    cleaning: &CleaningSummary,
) -> Result<()> {
    let path = output_dir.join("missing.csv");
    let mut content = String::from("column,kind,missing,fraction,action\n");

    for column in &report.columns {
        let action = if !column.kind.is_predictor() {
            "unused"
        } else if cleaning.dropped.contains(&column.name) {
            "dropped"
        } else if cleaning.imputed.iter().any(|c| c.name == column.name) {
            "imputed"
        } else {
            "kept"
        };
        let fraction = if report.row_count == 0 {
            0.0
        } else {
            column.missing as f64 / report.row_count as f64
        };
        let _ = writeln!(
            content,
            "{},{},{},{fraction:.4},{action}",
            column.name,
            column.kind.display_name(),
            column.missing
        );
    }

    fs::write(path, content)?;
    Ok(())
}

/// Write `summary.txt` - human readable overview
///
/// # Errors
/// Returns error if file cannot be written
pub fn write_summary(output_dir: &Path, content: &str) -> Result<()> {
    let path = output_dir.join("summary.txt");
    fs::write(path, content)?;
    Ok(())
}

/// Render the text of `summary.txt`
///
/// # Errors
/// Returns error if the results table is incomplete
pub fn render_summary(
    source: &str,
    frame: &ModelFrame,
    cleaning: &CleaningSummary,
    outcome: &PipelineOutcome,
    top_n: usize,
) -> Result<String> {
    outcome.table.ensure_complete()?;

    let mut out = String::new();
    let _ = writeln!(out, "=== CRIME RATE REGRESSION ===");
    let _ = writeln!(out, "Source: {source}");
    let _ = writeln!(out, "Target: {}", frame.target_name);
    let _ = writeln!(
        out,
        "Rows: {}  Predictors: {}",
        frame.n_samples(),
        frame.features.n_features()
    );
    out.push('\n');

    let _ = writeln!(out, "--- Missing values ---");
    if cleaning.dropped.is_empty() && cleaning.imputed.is_empty() {
        let _ = writeln!(out, "No predictor had missing values");
    }
    if !cleaning.dropped.is_empty() {
        let _ = writeln!(
            out,
            "Dropped {} columns: {}",
            cleaning.dropped.len(),
            cleaning.dropped.join(", ")
        );
    }
    for imputed in &cleaning.imputed {
        let _ = writeln!(
            out,
            "Imputed {} ({} cells) with mean {:.4}",
            imputed.name, imputed.filled, imputed.value
        );
    }
    out.push('\n');

    let _ = writeln!(
        out,
        "--- Top features by |r| with {} ---",
        outcome.ranking.target
    );
    for (i, entry) in outcome.ranking.entries.iter().take(top_n).enumerate() {
        let _ = writeln!(
            out,
            "{:>3}. {:<24} r = {:+.4}",
            i + 1,
            entry.name,
            entry.correlation
        );
    }
    if !outcome.ranking.degenerate.is_empty() {
        let _ = writeln!(
            out,
            "Constant columns skipped: {}",
            outcome.ranking.degenerate.join(", ")
        );
    }
    out.push('\n');

    let _ = writeln!(out, "--- Experiments ---");
    for split in &outcome.experiments {
        let _ = writeln!(out, "{}", describe_split(split));
    }
    out.push('\n');

    let _ = writeln!(out, "--- Test MSE ---");
    let _ = write!(out, "{:<16}", "feature_set");
    for model in &outcome.table.models {
        let _ = write!(out, "{:>12}", model.label());
    }
    out.push('\n');
    for row in &outcome.table.rows {
        let _ = write!(out, "{:<16}", row.feature_set);
        for mse in row.cells.iter().flatten() {
            let _ = write!(out, "{mse:>12.6}");
        }
        out.push('\n');
    }

    for row in &outcome.table.rows {
        out.push('\n');
        let _ = writeln!(out, "{}:", row.feature_set);
        out.push_str(&bar_chart(&outcome.table.models, row.cells.iter().flatten().copied()));
    }

    Ok(out)
}

fn describe_split(split: &ExperimentSplit) -> String {
    format!(
        "{}: {} features, {} train / {} test rows, seed {}",
        split.feature_set,
        split.features.len(),
        split.train_rows,
        split.test_rows,
        split.seed
    )
}

/// One bar per model, scaled to the largest MSE; the lowest is marked
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn bar_chart(models: &[ModelKind], values: impl Iterator<Item = f64>) -> String {
    let values: Vec<f64> = values.collect();
    let max = values.iter().copied().fold(0.0_f64, f64::max);
    let best = values
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i);

    let mut out = String::new();
    for (i, (model, mse)) in models.iter().zip(&values).enumerate() {
        let len = if max > 0.0 {
            ((mse / max) * BAR_WIDTH as f64).round() as usize
        } else {
            0
        };
        let marker = if Some(i) == best { "  <- best" } else { "" };
        let _ = writeln!(
            out,
            "  {:<6}|{:<width$}| {mse:.6}{marker}",
            model.label(),
            "#".repeat(len),
            width = BAR_WIDTH
        );
    }
    out
}

// JSON output structures

#[derive(Serialize)]
struct ResultsOutput<'a> {
    target: &'a str,
    row_count: usize,
    predictor_count: usize,
    models: &'a [ModelKind],
    results: Vec<FeatureSetEntry>,
    experiments: &'a [ExperimentSplit],
}

#[derive(Serialize)]
struct FeatureSetEntry {
    feature_set: String,
    scores: Vec<ModelScore>,
    best: Option<ModelKind>,
}

#[derive(Serialize)]
struct ModelScore {
    model: ModelKind,
    mse: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::{
        ColumnKind, ColumnMissing, CrimeError, FeatureMatrix, ImputedColumn, ModelResult,
        RankedFeature,
    };
    use ndarray::array;
    use tempfile::TempDir;

    fn table() -> ResultsTable {
        let mut table = ResultsTable::new(vec![ModelKind::Null, ModelKind::Mlr]);
        for (set, null, mlr) in [("top11_features", 0.06, 0.02), ("all_features", 0.05, 0.04)] {
            table
                .record(ModelResult {
                    model: ModelKind::Null,
                    feature_set: set.into(),
                    mse: null,
                })
                .expect("record");
            table
                .record(ModelResult {
                    model: ModelKind::Mlr,
                    feature_set: set.into(),
                    mse: mlr,
                })
                .expect("record");
        }
        table
    }

    fn outcome() -> PipelineOutcome {
        PipelineOutcome {
            ranking: FeatureRanking {
                target: "y".into(),
                entries: vec![
                    RankedFeature {
                        name: "a".into(),
                        correlation: -0.8,
                        magnitude: 0.8,
                    },
                    RankedFeature {
                        name: "b".into(),
                        correlation: 0.5,
                        magnitude: 0.5,
                    },
                ],
                degenerate: vec!["c".into()],
            },
            table: table(),
            experiments: vec![ExperimentSplit {
                feature_set: "top11_features".into(),
                features: vec!["a".into(), "b".into()],
                seed: 12,
                train_rows: 4,
                test_rows: 1,
            }],
        }
    }

    fn frame() -> ModelFrame {
        ModelFrame {
            features: FeatureMatrix {
                names: vec!["a".into(), "b".into()],
                values: array![[0.1, 0.2], [0.3, 0.4]],
            },
            target: array![0.5, 0.6],
            target_name: "y".into(),
        }
    }

    #[test]
    fn test_write_results_csv() {
        let dir = TempDir::new().expect("create temp dir");
        write_results_csv(dir.path(), &table()).expect("write results");

        let content = fs::read_to_string(dir.path().join("results.csv")).expect("read");
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "feature_set,NULL,MLR");
        assert_eq!(lines[1], "top11_features,0.06000000,0.02000000");
        assert_eq!(lines[2], "all_features,0.05000000,0.04000000");
    }

    #[test]
    fn test_incomplete_table_not_written() {
        let dir = TempDir::new().expect("create temp dir");
        let mut incomplete = ResultsTable::new(vec![ModelKind::Null, ModelKind::Knn]);
        incomplete
            .record(ModelResult {
                model: ModelKind::Null,
                feature_set: "all_features".into(),
                mse: 0.1,
            })
            .expect("record");

        assert!(matches!(
            write_results_csv(dir.path(), &incomplete),
            Err(CrimeError::IncompleteResults(_))
        ));
        assert!(!dir.path().join("results.csv").exists());
    }

    #[test]
    fn test_write_results_json() {
        let dir = TempDir::new().expect("create temp dir");
        write_results_json(dir.path(), &frame(), &outcome()).expect("write json");

        let content = fs::read_to_string(dir.path().join("results.json")).expect("read");
        let json: serde_json::Value = serde_json::from_str(&content).expect("parse");
        assert_eq!(json["target"], "y");
        assert_eq!(json["models"][1], "MLR");
        assert_eq!(json["results"][0]["best"], "MLR");
        assert_eq!(json["results"][1]["scores"][0]["model"], "NULL");
        assert_eq!(json["experiments"][0]["seed"], 12);
    }

    #[test]
    fn test_write_ranking_csv() {
        let dir = TempDir::new().expect("create temp dir");
        write_ranking_csv(dir.path(), &outcome().ranking).expect("write ranking");

        let content = fs::read_to_string(dir.path().join("ranking.csv")).expect("read");
        assert!(content.starts_with("rank,feature,correlation,abs_correlation\n"));
        assert!(content.contains("1,a,-0.800000,0.800000"));
        assert!(content.contains("2,b,0.500000,0.500000"));
    }

    #[test]
    fn test_write_missing_csv() {
        let dir = TempDir::new().expect("create temp dir");
        let report = MissingReport {
            row_count: 100,
            columns: vec![
                ColumnMissing {
                    name: "OtherPerCap".into(),
                    kind: ColumnKind::Feature,
                    missing: 1,
                },
                ColumnMissing {
                    name: "LemasSwornFT".into(),
                    kind: ColumnKind::Feature,
                    missing: 84,
                },
                ColumnMissing {
                    name: "county".into(),
                    kind: ColumnKind::Identifier,
                    missing: 59,
                },
            ],
        };
        let cleaning = CleaningSummary {
            dropped: vec!["LemasSwornFT".into()],
            imputed: vec![ImputedColumn {
                name: "OtherPerCap".into(),
                value: 0.28,
                filled: 1,
            }],
        };

        write_missing_csv(dir.path(), &report, &cleaning).expect("write missing");

        let content = fs::read_to_string(dir.path().join("missing.csv")).expect("read");
        assert!(content.contains("OtherPerCap,feature,1,0.0100,imputed"));
        assert!(content.contains("LemasSwornFT,feature,84,0.8400,dropped"));
        assert!(content.contains("county,identifier,59,0.5900,unused"));
    }

    #[test]
    fn test_summary_marks_best_model() {
        let cleaning = CleaningSummary {
            dropped: vec!["LemasSwornFT".into()],
            imputed: Vec::new(),
        };
        let text = render_summary("data.csv", &frame(), &cleaning, &outcome(), 5)
            .expect("render summary");

        assert!(text.contains("Source: data.csv"));
        assert!(text.contains("Dropped 1 columns: LemasSwornFT"));
        assert!(text.contains("--- Top features by |r| with y ---"));
        assert!(text.contains("1. a"));
        assert!(text.contains("Constant columns skipped: c"));
        assert!(text.contains("top11_features: 2 features, 4 train / 1 test rows, seed 12"));

        let best_lines: Vec<&str> = text.lines().filter(|l| l.contains("<- best")).collect();
        assert_eq!(best_lines.len(), 2);
        assert!(best_lines.iter().all(|l| l.trim_start().starts_with("MLR")));

        let dir = TempDir::new().expect("create temp dir");
        write_summary(dir.path(), &text).expect("write summary");
        let written = fs::read_to_string(dir.path().join("summary.txt")).expect("read");
        assert_eq!(written, text);
    }

    #[test]
    fn test_bar_chart_scales_to_largest() {
        let chart = bar_chart(&[ModelKind::Null, ModelKind::Mlr], [0.08, 0.02].into_iter());
        let lines: Vec<&str> = chart.lines().collect();

        assert_eq!(lines[0].matches('#').count(), BAR_WIDTH);
        assert_eq!(lines[1].matches('#').count(), BAR_WIDTH / 4);
        assert!(lines[1].ends_with("<- best"));
    }
}
