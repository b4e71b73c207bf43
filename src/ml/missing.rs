//! Missing-value scan and the explicit drop/impute policy
//!
//! The loader keeps gaps as [`Cell::Missing`]; this is the only place they are
//! resolved, so that every dropped or imputed column ends up in the
//! [`CleaningSummary`].

use crate::ml::stats::mean;
use crate::structs::{
    Cell, CleaningSummary, ColumnMissing, CrimeError, Dataset, FeatureMatrix, ImputedColumn,
    MissingPolicy, MissingReport, ModelFrame, Result,
};
use log::{info, warn};
use ndarray::{Array1, Array2};

impl MissingReport {
    /// List every numeric column with at least one missing value
    #[must_use]
    pub fn scan(dataset: &Dataset) -> Self {
        let columns = dataset
            .schema
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.kind.is_numeric())
            .filter_map(|(i, c)| {
                let missing = dataset.column_cells(i).filter(|cell| cell.is_missing()).count();
                (missing > 0).then(|| ColumnMissing {
                    name: c.name.clone(),
                    kind: c.kind,
                    missing,
                })
            })
            .collect();

        Self {
            row_count: dataset.row_count(),
            columns,
        }
    }
}

impl MissingPolicy {
    /// Decide whether a column with gaps is imputed (`true`) or dropped
    #[allow(clippy::cast_precision_loss)]
    fn imputes(self, missing: usize, rows: usize) -> bool {
        if missing >= rows {
            return false;
        }
        match self {
            Self::Drop => false,
            Self::Mean => true,
            Self::SparseMean { max_fraction } => missing as f64 / rows as f64 <= max_fraction,
        }
    }

    fn validate(self) -> Result<()> {
        if let Self::SparseMean { max_fraction } = self {
            if !(0.0..=1.0).contains(&max_fraction) {
                return Err(CrimeError::Config(format!(
                    "Imputation threshold must be within [0, 1], got {max_fraction}"
                )));
            }
        }
        Ok(())
    }
}

impl ModelFrame {
    /// Build a dense frame of predictors and target from a typed dataset
    ///
    /// Identifier, fold and label columns are never predictors. Predictor
    /// columns with gaps are dropped or mean-imputed according to `policy`.
    ///
    /// # Errors
    /// Returns a numeric error if the target has a missing value, a schema error
    /// if no predictor column survives, and a config error for an invalid policy
    pub fn from_dataset(dataset: &Dataset, policy: MissingPolicy) -> Result<(Self, CleaningSummary)> {
        policy.validate()?;

        let rows = dataset.row_count();
        let target_column = dataset.schema.target_column();

        let target = dataset
            .column_cells(dataset.schema.target)
            .enumerate()
            .map(|(row, cell)| {
                cell.as_number().ok_or_else(|| CrimeError::Numeric {
                    column: target_column.name.clone(),
                    reason: format!("missing target value at data row {}", row + 1),
                })
            })
            .collect::<Result<Vec<f64>>>()?;

        let mut summary = CleaningSummary::default();
        let mut names = Vec::new();
        let mut columns: Vec<Vec<f64>> = Vec::new();

        for index in dataset.schema.predictor_indices() {
            let name = &dataset.schema.columns[index].name;
            let cells: Vec<Option<f64>> = dataset.column_cells(index).map(Cell::as_number).collect();
            let missing = cells.iter().filter(|v| v.is_none()).count();

            if missing == 0 {
                names.push(name.clone());
                columns.push(cells.into_iter().flatten().collect());
                continue;
            }

            if !policy.imputes(missing, rows) {
                summary.dropped.push(name.clone());
                continue;
            }

            let present: Vec<f64> = cells.iter().flatten().copied().collect();
            let Some(fill) = mean(&present) else {
                summary.dropped.push(name.clone());
                continue;
            };

            info!("Imputed {missing} missing values in '{name}' with mean {fill:.4}");
            summary.imputed.push(ImputedColumn {
                name: name.clone(),
                value: fill,
                filled: missing,
            });
            names.push(name.clone());
            columns.push(cells.into_iter().map(|v| v.unwrap_or(fill)).collect());
        }

        if !summary.dropped.is_empty() {
            warn!(
                "Dropped {} predictor columns with missing values: {}",
                summary.dropped.len(),
                summary.dropped.join(", ")
            );
        }

        if names.is_empty() {
            return Err(CrimeError::Schema(
                "No predictor columns left after missing-value handling".into(),
            ));
        }

        let values = Array2::from_shape_fn((rows, names.len()), |(r, c)| columns[c][r]);

        Ok((
            Self {
                features: FeatureMatrix { names, values },
                target: Array1::from(target),
                target_name: target_column.name.clone(),
            },
            summary,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::{Column, ColumnKind, Record, Schema};

    fn dataset(rows: &[[Cell; 5]]) -> Dataset {
        let schema = Schema::new(vec![
            Column { name: "code".into(), kind: ColumnKind::Identifier },
            Column { name: "a".into(), kind: ColumnKind::Feature },
            Column { name: "b".into(), kind: ColumnKind::Feature },
            Column { name: "c".into(), kind: ColumnKind::RawCount },
            Column { name: "y".into(), kind: ColumnKind::Target },
        ])
        .expect("schema");
        Dataset {
            schema,
            records: rows
                .iter()
                .map(|r| Record { cells: r.to_vec() })
                .collect(),
        }
    }

    fn n(v: f64) -> Cell {
        Cell::Number(v)
    }

    /// Column `b` misses one of four values, `c` misses three, `code` misses one
    fn gappy() -> Dataset {
        dataset(&[
            [Cell::Missing, n(0.1), n(0.2), n(1.0), n(0.5)],
            [n(2.0), n(0.2), Cell::Missing, Cell::Missing, n(0.6)],
            [n(3.0), n(0.3), n(0.4), Cell::Missing, n(0.7)],
            [n(4.0), n(0.4), n(0.6), Cell::Missing, n(0.8)],
        ])
    }

    #[test]
    fn test_scan_reports_all_numeric_gaps() {
        let report = MissingReport::scan(&gappy());

        let missing_in = |name: &str| {
            report
                .columns
                .iter()
                .find(|c| c.name == name)
                .map_or(0, |c| c.missing)
        };

        assert_eq!(report.row_count, 4);
        assert_eq!(missing_in("code"), 1);
        assert_eq!(missing_in("b"), 1);
        assert_eq!(missing_in("c"), 3);
        assert_eq!(missing_in("a"), 0);
    }

    #[test]
    fn test_drop_policy() {
        let (frame, summary) = ModelFrame::from_dataset(&gappy(), MissingPolicy::Drop).expect("frame");

        assert_eq!(frame.features.names, vec!["a"]);
        assert_eq!(summary.dropped, vec!["b", "c"]);
        assert!(summary.imputed.is_empty());
        assert_eq!(frame.target.len(), 4);
        assert_eq!(frame.target_name, "y");
    }

    #[test]
    fn test_mean_policy() {
        let (frame, summary) = ModelFrame::from_dataset(&gappy(), MissingPolicy::Mean).expect("frame");

        assert_eq!(frame.features.names, vec!["a", "b", "c"]);
        assert!(summary.dropped.is_empty());
        // b's gap filled with mean(0.2, 0.4, 0.6)
        assert!((frame.features.values[[1, 1]] - 0.4).abs() < 1e-12);
        // c's gaps filled with its only value
        assert!((frame.features.values[[3, 2]] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_sparse_mean_policy() {
        let policy = MissingPolicy::SparseMean { max_fraction: 0.25 };
        let (frame, summary) = ModelFrame::from_dataset(&gappy(), policy).expect("frame");

        assert_eq!(frame.features.names, vec!["a", "b"]);
        assert_eq!(summary.dropped, vec!["c"]);
        assert_eq!(summary.imputed.len(), 1);
        assert_eq!(summary.imputed[0].name, "b");
        assert_eq!(summary.imputed[0].filled, 1);
    }

    #[test]
    fn test_identifiers_never_predictors() {
        let (frame, _) = ModelFrame::from_dataset(&gappy(), MissingPolicy::Mean).expect("frame");
        assert!(frame.features.column_index("code").is_none());
        assert!(frame.features.column_index("y").is_none());
    }

    #[test]
    fn test_missing_target_is_numeric_error() {
        let data = dataset(&[
            [n(1.0), n(0.1), n(0.2), n(1.0), n(0.5)],
            [n(2.0), n(0.2), n(0.3), n(2.0), Cell::Missing],
        ]);

        match ModelFrame::from_dataset(&data, MissingPolicy::default()) {
            Err(CrimeError::Numeric { column, reason }) => {
                assert_eq!(column, "y");
                assert!(reason.contains("row 2"));
            }
            other => panic!("expected numeric error, got {other:?}"),
        }
    }

    #[test]
    fn test_no_predictors_left() {
        let data = dataset(&[
            [n(1.0), Cell::Missing, Cell::Missing, Cell::Missing, n(0.5)],
            [n(2.0), n(0.2), n(0.3), n(2.0), n(0.6)],
        ]);

        assert!(matches!(
            ModelFrame::from_dataset(&data, MissingPolicy::Drop),
            Err(CrimeError::Schema(_))
        ));
    }

    #[test]
    fn test_invalid_threshold() {
        let policy = MissingPolicy::SparseMean { max_fraction: 1.5 };
        assert!(matches!(
            ModelFrame::from_dataset(&gappy(), policy),
            Err(CrimeError::Config(_))
        ));
    }
}
