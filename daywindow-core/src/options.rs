//! Per-generator options that are not window offsets.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::{Result, WindowError};
use crate::matrix::SeriesMatrix;
use crate::pool::StartDays;

/// Batch size, start-day pool, seed and reference column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
    pub batch_size: usize,
    pub start_days: StartDays,
    /// `None` seeds from OS entropy; batches are then not reproducible.
    pub seed: Option<u64>,
    /// Column used for regression targets and direction labels.
    pub reference_column: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            batch_size: 32,
            start_days: StartDays::Full,
            seed: None,
            reference_column: 0,
        }
    }
}

impl BatchOptions {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_start_days(mut self, start_days: StartDays) -> Self {
        self.start_days = start_days;
        self
    }

    pub fn with_reference_column(mut self, column: usize) -> Self {
        self.reference_column = column;
        self
    }

    /// Checks that do not depend on the windows.
    pub(crate) fn check(&self, matrix: &SeriesMatrix) -> Result<()> {
        if self.batch_size == 0 {
            return Err(WindowError::InvalidBatchSize);
        }
        if self.reference_column >= matrix.n_cols() {
            return Err(WindowError::InvalidReferenceColumn {
                column: self.reference_column,
                columns: matrix.n_cols(),
            });
        }
        Ok(())
    }

    /// A fresh generator owned by exactly one sampler.
    pub(crate) fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}
