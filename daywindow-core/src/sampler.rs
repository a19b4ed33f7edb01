//! Random regression batches.
//!
//! Start days are drawn uniformly with replacement from the pool, within a
//! batch and across batches. The stream never ends; callers stop pulling.

use rand::rngs::StdRng;
use rand::Rng;
use tracing::debug;

use crate::batch::{gather_inputs, gather_targets, Batch};
use crate::error::Result;
use crate::matrix::SeriesMatrix;
use crate::options::BatchOptions;
use crate::window::{Window, WindowBounds};

/// Infinite source of (learn window, predict window) regression batches.
///
/// Owns its RNG: two samplers built with the same seed, pool and windows
/// produce identical batch sequences regardless of what else draws random
/// numbers in between.
#[derive(Debug, Clone)]
pub struct WindowSampler<'a> {
    matrix: &'a SeriesMatrix,
    learn: Window,
    predict: Window,
    bounds: WindowBounds,
    pool: Vec<usize>,
    batch_size: usize,
    reference_column: usize,
    rng: StdRng,
}

impl<'a> WindowSampler<'a> {
    pub fn new(
        matrix: &'a SeriesMatrix,
        learn: Window,
        predict: Window,
        options: &BatchOptions,
    ) -> Result<Self> {
        options.check(matrix)?;
        let bounds = WindowBounds::regression(matrix.n_rows(), &learn, &predict)?;
        let pool = options.start_days.resolve(&bounds)?;
        debug!(
            rows = matrix.n_rows(),
            lcap = bounds.lcap(),
            pcap = bounds.pcap(),
            pool = pool.len(),
            batch_size = options.batch_size,
            seeded = options.seed.is_some(),
            "window sampler ready"
        );

        Ok(Self {
            matrix,
            learn,
            predict,
            bounds,
            pool,
            batch_size: options.batch_size,
            reference_column: options.reference_column,
            rng: options.rng(),
        })
    }

    pub fn bounds(&self) -> &WindowBounds {
        &self.bounds
    }

    pub fn pool(&self) -> &[usize] {
        &self.pool
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// An empty batch with this sampler's shape.
    pub fn empty_batch(&self) -> Batch {
        Batch::zeros(
            self.batch_size,
            self.learn.len(),
            self.matrix.n_cols(),
            self.predict.len(),
        )
    }

    /// Draw one start day from the pool.
    fn draw(&mut self) -> usize {
        self.pool[self.rng.gen_range(0..self.pool.len())]
    }

    /// Draw a full batch.
    pub fn sample_batch(&mut self) -> Batch {
        let mut batch = self.empty_batch();
        self.sample_into(&mut batch);
        batch
    }

    /// Refill `batch` in place. The batch must have this sampler's shape.
    pub fn sample_into(&mut self, batch: &mut Batch) {
        assert_eq!(
            batch.inputs.dim(),
            (self.batch_size, self.learn.len(), self.matrix.n_cols()),
            "batch inputs shape does not match sampler"
        );
        assert_eq!(
            batch.targets.dim(),
            (self.batch_size, self.predict.len()),
            "batch targets shape does not match sampler"
        );
        for slot in 0..self.batch_size {
            let start = self.draw();
            self.fill_slot(batch, slot, start);
        }
    }

    fn fill_slot(&self, batch: &mut Batch, slot: usize, start: usize) {
        gather_inputs(batch, slot, self.matrix, &self.learn, start);
        gather_targets(
            batch,
            slot,
            self.matrix,
            &self.bounds,
            &self.predict,
            start,
            self.reference_column,
        );
    }
}

impl Iterator for WindowSampler<'_> {
    type Item = Batch;

    fn next(&mut self) -> Option<Batch> {
        Some(self.sample_batch())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}
