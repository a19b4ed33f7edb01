//! The dense, read-only series matrix every generator reads from.
//!
//! Rows are consecutive calendar days, columns are named series. The
//! ingestion side is responsible for producing a gap-free, fully populated
//! matrix; construction here only verifies that contract.

use chrono::{Duration, NaiveDate};
use ndarray::{Array2, ArrayView1};

use crate::error::{Result, WindowError};
use crate::fingerprint;

/// A dense (N, C) matrix of finite values, one row per calendar day.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesMatrix {
    values: Array2<f64>,
    columns: Vec<String>,
    start_date: Option<NaiveDate>,
}

impl SeriesMatrix {
    /// Wrap an array, checking shape against `columns` and rejecting any
    /// non-finite value.
    pub fn new(values: Array2<f64>, columns: Vec<String>) -> Result<Self> {
        let (rows, cols) = values.dim();
        if rows == 0 || cols == 0 {
            return Err(WindowError::matrix(format!(
                "matrix must have at least one row and one column, got ({rows}, {cols})"
            )));
        }
        if columns.len() != cols {
            return Err(WindowError::matrix(format!(
                "{} column name(s) for {cols} column(s)",
                columns.len()
            )));
        }
        if let Some(((r, c), v)) = values.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(WindowError::matrix(format!(
                "non-finite value {v} at row {r}, column '{}'",
                columns[c]
            )));
        }

        Ok(Self {
            values,
            columns,
            start_date: None,
        })
    }

    /// Build from row vectors. Every row must have `columns.len()` values.
    pub fn from_rows(rows: &[Vec<f64>], columns: Vec<String>) -> Result<Self> {
        let width = columns.len();
        if let Some((r, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != width) {
            return Err(WindowError::matrix(format!(
                "row {r} has {} value(s), expected {width}",
                row.len()
            )));
        }
        let flat: Vec<f64> = rows.iter().flatten().copied().collect();
        let values = Array2::from_shape_vec((rows.len(), width), flat)
            .map_err(|e| WindowError::matrix(e.to_string()))?;
        Self::new(values, columns)
    }

    /// Wrap an array with generated column names `s0, s1, ...`.
    pub fn unnamed(values: Array2<f64>) -> Result<Self> {
        let columns = (0..values.ncols()).map(|c| format!("s{c}")).collect();
        Self::new(values, columns)
    }

    /// Synthetic ramp: `value[r, c] = r + c / 10`. Every row is
    /// distinguishable, which makes window alignment easy to read off.
    pub fn ramp(rows: usize, cols: usize) -> Result<Self> {
        let values = Array2::from_shape_fn((rows, cols), |(r, c)| r as f64 + c as f64 / 10.0);
        Self::unnamed(values)
    }

    /// Attach the calendar date of row 0.
    pub fn with_start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_cols(&self) -> usize {
        self.values.ncols()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn row(&self, r: usize) -> ArrayView1<'_, f64> {
        self.values.row(r)
    }

    pub fn value(&self, r: usize, c: usize) -> f64 {
        self.values[[r, c]]
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.start_date
    }

    /// Calendar date of row `r`, if the matrix carries a start date.
    pub fn date_of(&self, r: usize) -> Option<NaiveDate> {
        self.start_date.map(|d| d + Duration::days(r as i64))
    }

    /// Last calendar day covered by the matrix.
    pub fn end_date(&self) -> Option<NaiveDate> {
        self.date_of(self.n_rows() - 1)
    }

    /// BLAKE3 content hash of shape, names, start date and values.
    pub fn dataset_hash(&self) -> String {
        fingerprint::dataset_hash(self)
    }
}
