//! Deterministic, exhaustive regression batches.
//!
//! Walks the pool in ascending order, `batch_size` start days at a time.
//! Only full batches are yielded: with `M` pool days the iterator produces
//! exactly `floor(M / batch_size)` batches and the trailing `M % batch_size`
//! start days are dropped. A pool smaller than one batch yields nothing.

use tracing::debug;

use crate::batch::{gather_inputs, gather_targets, Batch};
use crate::error::Result;
use crate::matrix::SeriesMatrix;
use crate::options::BatchOptions;
use crate::window::{Window, WindowBounds};

#[derive(Debug, Clone)]
pub struct WindowIterator<'a> {
    matrix: &'a SeriesMatrix,
    learn: Window,
    predict: Window,
    bounds: WindowBounds,
    pool: Vec<usize>,
    batch_size: usize,
    reference_column: usize,
    /// Index of the next batch to yield.
    cursor: usize,
}

impl<'a> WindowIterator<'a> {
    /// `options.seed` is ignored.
    pub fn new(
        matrix: &'a SeriesMatrix,
        learn: Window,
        predict: Window,
        options: &BatchOptions,
    ) -> Result<Self> {
        options.check(matrix)?;
        let bounds = WindowBounds::regression(matrix.n_rows(), &learn, &predict)?;
        let pool = options.start_days.resolve(&bounds)?;
        let dropped = pool.len() % options.batch_size;
        debug!(
            pool = pool.len(),
            batch_size = options.batch_size,
            batches = pool.len() / options.batch_size,
            dropped,
            "window iterator ready"
        );

        Ok(Self {
            matrix,
            learn,
            predict,
            bounds,
            pool,
            batch_size: options.batch_size,
            reference_column: options.reference_column,
            cursor: 0,
        })
    }

    /// Total number of batches in a full pass.
    pub fn num_batches(&self) -> usize {
        self.pool.len() / self.batch_size
    }

    /// Start days covered by a full pass, in order.
    pub fn covered_days(&self) -> &[usize] {
        &self.pool[..self.num_batches() * self.batch_size]
    }

    pub fn bounds(&self) -> &WindowBounds {
        &self.bounds
    }

    /// Rewind to the first batch.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Start days of batch `index`.
    fn days_of(&self, index: usize) -> &[usize] {
        let from = index * self.batch_size;
        &self.pool[from..from + self.batch_size]
    }

    fn build(&self, index: usize) -> Batch {
        let mut batch = Batch::zeros(
            self.batch_size,
            self.learn.len(),
            self.matrix.n_cols(),
            self.predict.len(),
        );
        for (slot, &start) in self.days_of(index).iter().enumerate() {
            gather_inputs(&mut batch, slot, self.matrix, &self.learn, start);
            gather_targets(
                &mut batch,
                slot,
                self.matrix,
                &self.bounds,
                &self.predict,
                start,
                self.reference_column,
            );
        }
        batch
    }
}

impl Iterator for WindowIterator<'_> {
    type Item = Batch;

    fn next(&mut self) -> Option<Batch> {
        if self.cursor >= self.num_batches() {
            return None;
        }
        let batch = self.build(self.cursor);
        self.cursor += 1;
        Some(batch)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.num_batches() - self.cursor;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for WindowIterator<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::StartDays;

    fn iter(m: &SeriesMatrix, opts: BatchOptions) -> WindowIterator<'_> {
        WindowIterator::new(
            m,
            Window::range(10).unwrap(),
            Window::range(5).unwrap(),
            &opts,
        )
        .unwrap()
    }

    #[test]
    fn partial_final_batch_is_dropped() {
        let m = SeriesMatrix::ramp(1000, 1).unwrap();
        // 985 start days in batches of 100
        let it = iter(&m, BatchOptions::new(100));
        assert_eq!(it.len(), 9);
        assert_eq!(it.covered_days().len(), 900);
        assert_eq!(it.count(), 9);
    }

    #[test]
    fn visits_each_day_once_in_order() {
        let m = SeriesMatrix::ramp(60, 1).unwrap();
        let starts: Vec<f64> = iter(&m, BatchOptions::new(5))
            .flat_map(|b| (0..5).map(move |s| b.inputs[[s, 0, 0]]).collect::<Vec<_>>())
            .collect();
        let expected: Vec<f64> = (0..45).map(|d| d as f64).collect();
        assert_eq!(starts, expected);
    }

    #[test]
    fn explicit_pool_iterated_ascending() {
        let m = SeriesMatrix::ramp(1000, 1).unwrap();
        let opts = BatchOptions::new(3).with_start_days(StartDays::explicit([200, 0, 100]));
        let batches: Vec<Batch> = iter(&m, opts).collect();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].inputs[[0, 0, 0]], 0.0);
        assert_eq!(batches[0].inputs[[1, 0, 0]], 100.0);
        assert_eq!(batches[0].inputs[[2, 9, 0]], 209.0);
        assert_eq!(batches[0].targets[[2, 4]], 214.0);
    }

    #[test]
    fn pool_smaller_than_batch_yields_nothing() {
        let m = SeriesMatrix::ramp(1000, 1).unwrap();
        let opts = BatchOptions::new(4).with_start_days(StartDays::explicit([1, 2, 3]));
        assert_eq!(iter(&m, opts).next(), None);
    }

    #[test]
    fn reset_replays_identical_sequence() {
        let m = SeriesMatrix::ramp(100, 2).unwrap();
        let mut it = iter(&m, BatchOptions::new(7));
        let first: Vec<Batch> = it.by_ref().collect();
        assert!(it.next().is_none());
        it.reset();
        let second: Vec<Batch> = it.collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 85 / 7);
    }

    #[test]
    fn size_hint_counts_down() {
        let m = SeriesMatrix::ramp(100, 1).unwrap();
        let mut it = iter(&m, BatchOptions::new(10));
        assert_eq!(it.size_hint(), (8, Some(8)));
        it.next();
        assert_eq!(it.len(), 7);
    }
}
