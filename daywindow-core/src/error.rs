//! Construction-time errors shared by every generator.
//!
//! All of these are raised eagerly, before the first batch is produced.
//! Gather indices that escape the matrix after construction are not errors:
//! they panic, because they can only mean the bound arithmetic is wrong.

use thiserror::Error;

/// Errors from window, pool and matrix validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WindowError {
    #[error("invalid window: {reason}")]
    InvalidWindow { reason: String },

    #[error("start day {day} is outside the valid range [0, {limit})")]
    InvalidPool { day: usize, limit: usize },

    #[error("start-day pool is empty")]
    EmptyPool,

    #[error("batch size must be positive")]
    InvalidBatchSize,

    #[error("reference column {column} out of range for {columns} column(s)")]
    InvalidReferenceColumn { column: usize, columns: usize },

    #[error("invalid series matrix: {reason}")]
    InvalidMatrix { reason: String },

    #[error("calendar pool requested but the matrix has no start date")]
    MissingCalendar,

    #[error("split fraction {fraction} must lie strictly between 0 and 1")]
    InvalidSplit { fraction: f64 },
}

impl WindowError {
    pub(crate) fn window(reason: impl Into<String>) -> Self {
        Self::InvalidWindow {
            reason: reason.into(),
        }
    }

    pub(crate) fn matrix(reason: impl Into<String>) -> Self {
        Self::InvalidMatrix {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, WindowError>;
