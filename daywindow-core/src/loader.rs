//! Dense matrix loading from CSV.
//!
//! This reads the output of the ingestion step; it does not resample or
//! fill. The file must already satisfy the matrix contract:
//! - a header row naming every column
//! - an optional leading `date` column (`YYYY-MM-DD`), one calendar day per row
//! - every other cell a finite number
//!
//! Any violation is reported with its data row (0-based, header excluded)
//! and column name.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate};
use ndarray::Array2;
use thiserror::Error;
use tracing::debug;

use crate::error::WindowError;
use crate::matrix::SeriesMatrix;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("open {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("header has no series columns")]
    NoColumns,

    #[error("no data rows")]
    Empty,

    #[error("row {row}: expected {expected} fields, found {found}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("row {row}, column '{column}': missing value")]
    Missing { row: usize, column: String },

    #[error("row {row}, column '{column}': '{value}' is not a finite number")]
    NotNumeric {
        row: usize,
        column: String,
        value: String,
    },

    #[error("row {row}: cannot parse date '{value}'")]
    BadDate { row: usize, value: String },

    #[error("row {row}: date {found} does not follow {previous} by one day")]
    DateGap {
        row: usize,
        previous: NaiveDate,
        found: NaiveDate,
    },

    #[error(transparent)]
    Matrix(#[from] WindowError),
}

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Load a dense matrix from a CSV file.
pub fn load_csv(path: &Path) -> Result<SeriesMatrix, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let matrix = read_csv(file)?;
    debug!(
        path = %path.display(),
        rows = matrix.n_rows(),
        cols = matrix.n_cols(),
        "loaded series matrix"
    );
    Ok(matrix)
}

/// Read a dense matrix from any CSV source.
pub fn read_csv<R: Read>(source: R) -> Result<SeriesMatrix, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let has_dates = headers
        .first()
        .is_some_and(|h| h.eq_ignore_ascii_case("date"));
    let first_series = usize::from(has_dates);
    let columns: Vec<String> = headers[first_series..].to_vec();
    if columns.is_empty() {
        return Err(LoadError::NoColumns);
    }

    let mut values: Vec<f64> = Vec::new();
    let mut start_date: Option<NaiveDate> = None;
    let mut previous: Option<NaiveDate> = None;
    let mut rows = 0usize;

    for (row, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() != headers.len() {
            return Err(LoadError::Ragged {
                row,
                expected: headers.len(),
                found: record.len(),
            });
        }

        if has_dates {
            let raw = &record[0];
            let date = NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| {
                LoadError::BadDate {
                    row,
                    value: raw.to_string(),
                }
            })?;
            match previous {
                Some(prev) if date != prev + Duration::days(1) => {
                    return Err(LoadError::DateGap {
                        row,
                        previous: prev,
                        found: date,
                    });
                }
                None => start_date = Some(date),
                _ => {}
            }
            previous = Some(date);
        }

        for (column, raw) in columns.iter().zip(record.iter().skip(first_series)) {
            values.push(parse_cell(row, column, raw)?);
        }
        rows += 1;
    }

    if rows == 0 {
        return Err(LoadError::Empty);
    }

    let array = Array2::from_shape_vec((rows, columns.len()), values)
        .map_err(|e| WindowError::InvalidMatrix {
            reason: e.to_string(),
        })?;
    let matrix = SeriesMatrix::new(array, columns)?;
    Ok(match start_date {
        Some(date) => matrix.with_start_date(date),
        None => matrix,
    })
}

fn parse_cell(row: usize, column: &str, raw: &str) -> Result<f64, LoadError> {
    if raw.is_empty() {
        return Err(LoadError::Missing {
            row,
            column: column.to_string(),
        });
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(LoadError::NotNumeric {
            row,
            column: column.to_string(),
            value: raw.to_string(),
        }),
    }
}
