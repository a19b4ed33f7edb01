//! Batch buffers and the row gathers that fill them.
//!
//! Every gather asserts its row index against the matrix height. Construction
//! already guarantees the bound, so a failing assertion is a bug in the bound
//! arithmetic and must not be papered over by clamping.

use ndarray::{s, Array2, Array3};

use crate::direction::{DOWN, UP};
use crate::error::Result;
use crate::matrix::SeriesMatrix;
use crate::options::BatchOptions;
use crate::pool::StartDays;
use crate::window::{Window, WindowBounds};

/// One batch of examples.
///
/// - `inputs`: (batch, |learn window|, columns)
/// - `targets`: (batch, |predict window|) for regression, (batch, 1) for direction
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub inputs: Array3<f64>,
    pub targets: Array2<f64>,
}

impl Batch {
    pub fn zeros(batch_size: usize, learn_len: usize, columns: usize, target_len: usize) -> Self {
        Self {
            inputs: Array3::zeros((batch_size, learn_len, columns)),
            targets: Array2::zeros((batch_size, target_len)),
        }
    }

    /// Number of examples.
    pub fn len(&self) -> usize {
        self.inputs.dim().0
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn checked_row(matrix: &SeriesMatrix, row: usize, start: usize, what: &str) -> usize {
    assert!(
        row < matrix.n_rows(),
        "{what} row {row} for start day {start} is past the last matrix row {}",
        matrix.n_rows() - 1
    );
    row
}

/// `inputs[slot] = matrix[start + learn, :]`, in learn-window order.
pub(crate) fn gather_inputs(
    batch: &mut Batch,
    slot: usize,
    matrix: &SeriesMatrix,
    learn: &Window,
    start: usize,
) {
    for (j, &offset) in learn.offsets().iter().enumerate() {
        let row = checked_row(matrix, start + offset, start, "learn");
        batch
            .inputs
            .slice_mut(s![slot, j, ..])
            .assign(&matrix.row(row));
    }
}

/// `targets[slot] = matrix[start + Lcap + predict, reference]`.
pub(crate) fn gather_targets(
    batch: &mut Batch,
    slot: usize,
    matrix: &SeriesMatrix,
    bounds: &WindowBounds,
    predict: &Window,
    start: usize,
    reference: usize,
) {
    let base = bounds.target_base(start);
    for (k, &offset) in predict.offsets().iter().enumerate() {
        let row = checked_row(matrix, base + offset, start, "target");
        batch.targets[[slot, k]] = matrix.value(row, reference);
    }
}

/// [`UP`] if the reference value rises from the last learn row to the next
/// row, else [`DOWN`]. Ties are labelled down.
pub(crate) fn direction_label(
    matrix: &SeriesMatrix,
    bounds: &WindowBounds,
    start: usize,
    reference: usize,
) -> f64 {
    let next = checked_row(matrix, bounds.target_base(start), start, "label");
    let prev = next - 1;
    if matrix.value(next, reference) > matrix.value(prev, reference) {
        UP
    } else {
        DOWN
    }
}

/// Materialize every start day of `start_days` as one batch, in ascending
/// order. Unlike [`crate::WindowIterator`] nothing is truncated: the result
/// has exactly one row per pool day.
pub fn gather_all(
    matrix: &SeriesMatrix,
    learn: &Window,
    predict: &Window,
    start_days: &StartDays,
    reference_column: usize,
) -> Result<Batch> {
    BatchOptions::new(1)
        .with_reference_column(reference_column)
        .check(matrix)?;
    let bounds = WindowBounds::regression(matrix.n_rows(), learn, predict)?;
    let days = start_days.resolve(&bounds)?;

    let mut batch = Batch::zeros(days.len(), learn.len(), matrix.n_cols(), predict.len());
    for (slot, &start) in days.iter().enumerate() {
        gather_inputs(&mut batch, slot, matrix, learn, start);
        gather_targets(
            &mut batch,
            slot,
            matrix,
            &bounds,
            predict,
            start,
            reference_column,
        );
    }
    Ok(batch)
}
