//! Random up/down classification batches.
//!
//! Same draw mechanics as [`crate::WindowSampler`], but the target is a
//! single label per example: `1.0` when the reference column rises from the
//! last learn row (`i + Lcap - 1`) to the next row (`i + Lcap`), otherwise
//! `0.0`. An unchanged value counts as down.

use rand::rngs::StdRng;
use rand::Rng;
use tracing::debug;

use crate::batch::{direction_label, gather_inputs, Batch};
use crate::error::Result;
use crate::matrix::SeriesMatrix;
use crate::options::BatchOptions;
use crate::window::{Window, WindowBounds};

pub const UP: f64 = 1.0;
pub const DOWN: f64 = 0.0;

#[derive(Debug, Clone)]
pub struct DirectionSampler<'a> {
    matrix: &'a SeriesMatrix,
    learn: Window,
    bounds: WindowBounds,
    pool: Vec<usize>,
    batch_size: usize,
    reference_column: usize,
    rng: StdRng,
}

impl<'a> DirectionSampler<'a> {
    /// The default pool is `[0, N - Lcap - 1)`; an explicit pool in
    /// `options.start_days` is validated against the same bound.
    pub fn new(matrix: &'a SeriesMatrix, learn: Window, options: &BatchOptions) -> Result<Self> {
        options.check(matrix)?;
        let bounds = WindowBounds::direction(matrix.n_rows(), &learn)?;
        let pool = options.start_days.resolve(&bounds)?;
        debug!(
            rows = matrix.n_rows(),
            lcap = bounds.lcap(),
            pool = pool.len(),
            batch_size = options.batch_size,
            "direction sampler ready"
        );

        Ok(Self {
            matrix,
            learn,
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

    pub fn sample_batch(&mut self) -> Batch {
        let mut batch = Batch::zeros(self.batch_size, self.learn.len(), self.matrix.n_cols(), 1);
        for slot in 0..self.batch_size {
            let start = self.pool[self.rng.gen_range(0..self.pool.len())];
            gather_inputs(&mut batch, slot, self.matrix, &self.learn, start);
            batch.targets[[slot, 0]] =
                direction_label(self.matrix, &self.bounds, start, self.reference_column);
        }
        batch
    }
}

impl Iterator for DirectionSampler<'_> {
    type Item = Batch;

    fn next(&mut self) -> Option<Batch> {
        Some(self.sample_batch())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WindowError;
    use crate::pool::StartDays;

    /// Alternating up/flat series: row r is r/2 rounded down, so every even
    /// row rises and every odd row repeats the previous value.
    fn stairs(rows: usize) -> SeriesMatrix {
        let data: Vec<Vec<f64>> = (0..rows).map(|r| vec![(r / 2) as f64, r as f64]).collect();
        SeriesMatrix::from_rows(&data, vec!["close".into(), "day".into()]).unwrap()
    }

    #[test]
    fn labels_match_next_step_direction() {
        let m = stairs(200);
        let opts = BatchOptions::new(64).with_seed(11);
        let mut s = DirectionSampler::new(&m, Window::range(5).unwrap(), &opts).unwrap();
        let batch = s.sample_batch();
        assert_eq!(batch.targets.dim(), (64, 1));
        for slot in 0..64 {
            let start = batch.inputs[[slot, 0, 1]] as usize;
            let next_row = start + 5;
            let expected = if next_row % 2 == 0 { UP } else { DOWN };
            assert_eq!(batch.targets[[slot, 0]], expected, "start day {start}");
        }
    }

    #[test]
    fn tie_is_down() {
        // Start day 0, learn window 0..3: compares rows 2 and 3 which are equal.
        let data = vec![vec![5.0], vec![4.0], vec![7.0], vec![7.0], vec![9.0], vec![1.0]];
        let m = SeriesMatrix::from_rows(&data, vec!["close".into()]).unwrap();
        let opts = BatchOptions::new(8)
            .with_seed(0)
            .with_start_days(StartDays::explicit([0]));
        let mut s = DirectionSampler::new(&m, Window::range(3).unwrap(), &opts).unwrap();
        let batch = s.sample_batch();
        assert!(batch.targets.iter().all(|&y| y == DOWN));
    }

    #[test]
    fn default_pool_excludes_last_possible_day() {
        let m = stairs(50);
        let s = DirectionSampler::new(&m, Window::range(10).unwrap(), &BatchOptions::new(1))
            .unwrap();
        assert_eq!(s.pool().len(), 39);
        assert_eq!(s.bounds().pcap(), 1);
    }

    #[test]
    fn seeded_direction_sampler_is_reproducible() {
        let m = stairs(300);
        let opts = BatchOptions::new(16).with_seed(21);
        let a: Vec<Batch> = DirectionSampler::new(&m, Window::range(7).unwrap(), &opts)
            .unwrap()
            .take(4)
            .collect();
        let b: Vec<Batch> = DirectionSampler::new(&m, Window::range(7).unwrap(), &opts)
            .unwrap()
            .take(4)
            .collect();
        assert_eq!(a, b);
    }

    #[test]
    fn too_short_matrix_rejected() {
        let m = stairs(11);
        let err = DirectionSampler::new(&m, Window::range(10).unwrap(), &BatchOptions::new(1))
            .unwrap_err();
        assert!(matches!(err, WindowError::InvalidWindow { .. }));
    }
}
