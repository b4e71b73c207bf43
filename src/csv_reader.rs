use crate::structs::{Cell, ColumnKind, CrimeError, Dataset, Record, Result, Schema};
use csv::ReaderBuilder;
use log::{debug, warn};
use std::path::Path;

/// Represents a parsed CSV/TSV file with headers and rows
#[derive(Debug, Clone)]
pub struct CsvData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// How to read the input file
#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    pub delimiter: u8,
    pub has_headers: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_headers: true,
        }
    }
}

/// Whether a raw field denotes a missing value
#[must_use]
pub fn is_missing_token(s: &str) -> bool {
    let s = s.trim();
    s.is_empty() || s == "?" || s.eq_ignore_ascii_case("na") || s.eq_ignore_ascii_case("nan")
}

impl CsvData {
    /// Parse a CSV or TSV file
    ///
    /// Rows must all have the same number of fields. Without a header row the
    /// headers are left empty and must come from a declared schema.
    ///
    /// # Errors
    /// Returns a data access error if the file is missing, unreadable, empty,
    /// or has a row with the wrong number of fields
    pub fn from_file(path: &Path, options: LoadOptions) -> Result<Self> {
        if !path.is_file() {
            return Err(CrimeError::DataAccess(format!(
                "File not found: {}",
                path.display()
            )));
        }

        let mut reader = ReaderBuilder::new()
            .delimiter(options.delimiter)
            .has_headers(options.has_headers)
            .flexible(true)
            .from_path(path)
            .map_err(|e| {
                CrimeError::DataAccess(format!("Cannot read {}: {e}", path.display()))
            })?;

        let headers: Vec<String> = if options.has_headers {
            reader
                .headers()?
                .iter()
                .map(|s| s.trim().to_string())
                .collect()
        } else {
            Vec::new()
        };

        let mut rows: Vec<Vec<String>> = Vec::new();
        for result in reader.records() {
            let record = result?;
            let row: Vec<String> = record.iter().map(ToString::to_string).collect();

            let expected = if headers.is_empty() {
                rows.first().map_or(row.len(), Vec::len)
            } else {
                headers.len()
            };
            if row.len() != expected {
                let line = record
                    .position()
                    .map_or(rows.len() + 1, |p| usize::try_from(p.line()).unwrap_or(0));
                return Err(CrimeError::DataAccess(format!(
                    "Malformed row at line {line}: expected {expected} fields, found {}",
                    row.len()
                )));
            }
            rows.push(row);
        }

        if rows.is_empty() {
            return Err(CrimeError::DataAccess(format!(
                "No data rows in {}",
                path.display()
            )));
        }

        debug!(
            "Read {} rows x {} fields from {}",
            rows.len(),
            rows[0].len(),
            path.display()
        );

        Ok(Self { headers, rows })
    }

    /// Get number of rows
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get number of columns
    #[must_use]
    pub fn col_count(&self) -> usize {
        if self.headers.is_empty() {
            self.rows.first().map_or(0, Vec::len)
        } else {
            self.headers.len()
        }
    }

    /// Get column index by name
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Get a column as a vector of strings
    #[must_use]
    pub fn column(&self, index: usize) -> Option<Vec<&str>> {
        if index >= self.col_count() {
            return None;
        }
        Some(
            self.rows
                .iter()
                .filter_map(|row| row.get(index).map(String::as_str))
                .collect(),
        )
    }
}

impl Dataset {
    /// Type raw CSV rows against a schema
    ///
    /// Header-less data takes its column names from the schema. No cleaning is
    /// done here: missing tokens become [`Cell::Missing`].
    ///
    /// # Errors
    /// Returns a schema error if the headers (or the field count) do not match
    /// the schema, and a data access error for unparseable numeric values
    pub fn from_csv(csv: &CsvData, schema: &Schema) -> Result<Self> {
        if csv.headers.is_empty() {
            if csv.col_count() != schema.columns.len() {
                return Err(CrimeError::Schema(format!(
                    "File has {} columns, schema declares {}",
                    csv.col_count(),
                    schema.columns.len()
                )));
            }
        } else {
            schema.check_headers(&csv.headers)?;
        }

        let mut out_of_range = vec![0usize; schema.columns.len()];
        let mut records = Vec::with_capacity(csv.row_count());

        for (row_idx, row) in csv.rows.iter().enumerate() {
            let mut cells = Vec::with_capacity(schema.columns.len());
            for (col_idx, column) in schema.columns.iter().enumerate() {
                let raw = row.get(col_idx).map_or("", String::as_str);
                let cell = if is_missing_token(raw) {
                    Cell::Missing
                } else if column.kind == ColumnKind::Label {
                    Cell::Text(raw.trim().to_string())
                } else {
                    let value = raw
                        .trim()
                        .parse::<f64>()
                        .ok()
                        .filter(|v| v.is_finite())
                        .ok_or_else(|| {
                            CrimeError::DataAccess(format!(
                                "Malformed value '{raw}' in column '{}' at data row {}",
                                column.name,
                                row_idx + 1
                            ))
                        })?;
                    if column.kind == ColumnKind::Feature && !(0.0..=1.0).contains(&value) {
                        out_of_range[col_idx] += 1;
                    }
                    Cell::Number(value)
                };
                cells.push(cell);
            }
            records.push(Record { cells });
        }

        for (column, &count) in schema.columns.iter().zip(&out_of_range) {
            if count > 0 {
                warn!(
                    "Feature '{}' has {count} values outside [0, 1]",
                    column.name
                );
            }
        }

        Ok(Self {
            schema: schema.clone(),
            records,
        })
    }

    /// Parse and type a file in one step
    ///
    /// # Errors
    /// Returns error if reading or typing fails
    pub fn load(path: &Path, schema: &Schema, options: LoadOptions) -> Result<Self> {
        let csv = CsvData::from_file(path, options)?;
        Self::from_csv(&csv, schema)
    }
}
