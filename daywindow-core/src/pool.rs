//! Start-day pools: which rows a generator may start a learn window on.

use chrono::{Datelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{Result, WindowError};
use crate::matrix::SeriesMatrix;
use crate::window::WindowBounds;

/// The set of start days eligible for sampling or iteration.
///
/// Explicit pools are kept sorted ascending with duplicates removed, so the
/// deterministic iterator visits each day once and in order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StartDays {
    /// Every valid start day, `[0, N - Lcap - Pcap)`.
    #[default]
    Full,
    Explicit(Vec<usize>),
}

impl StartDays {
    pub fn explicit(days: impl IntoIterator<Item = usize>) -> Self {
        let mut days: Vec<usize> = days.into_iter().collect();
        days.sort_unstable();
        days.dedup();
        Self::Explicit(days)
    }

    /// Configuration convention: an empty list means the full range.
    pub fn from_list(days: Vec<usize>) -> Self {
        if days.is_empty() {
            Self::Full
        } else {
            Self::explicit(days)
        }
    }

    /// Materialize the pool against concrete bounds.
    pub fn resolve(&self, bounds: &WindowBounds) -> Result<Vec<usize>> {
        match self {
            Self::Full => Ok((0..bounds.limit()).collect()),
            Self::Explicit(days) => {
                if days.is_empty() {
                    return Err(WindowError::EmptyPool);
                }
                if let Some(&day) = days.iter().find(|&&d| !bounds.contains(d)) {
                    return Err(WindowError::InvalidPool {
                        day,
                        limit: bounds.limit(),
                    });
                }
                Ok(days.clone())
            }
        }
    }

    /// Valid start days that fall on Monday through Friday.
    pub fn weekdays(matrix: &SeriesMatrix, bounds: &WindowBounds) -> Result<Self> {
        let start = matrix.start_date().ok_or(WindowError::MissingCalendar)?;
        let offset = start.weekday().num_days_from_monday() as usize;
        let days = (0..bounds.limit()).filter(|r| {
            let weekday = (offset + r) % 7;
            weekday < Weekday::Sat.num_days_from_monday() as usize
        });
        Ok(Self::explicit(days))
    }

    /// Chronological split of the full valid range into (earlier, later)
    /// pools. The first `floor(limit * fraction)` start days go to the first
    /// pool.
    pub fn split(bounds: &WindowBounds, fraction: f64) -> Result<(Self, Self)> {
        if !(fraction > 0.0 && fraction < 1.0) {
            return Err(WindowError::InvalidSplit { fraction });
        }
        let cut = (bounds.limit() as f64 * fraction) as usize;
        if cut == 0 || cut >= bounds.limit() {
            return Err(WindowError::EmptyPool);
        }
        Ok((
            Self::Explicit((0..cut).collect()),
            Self::Explicit((cut..bounds.limit()).collect()),
        ))
    }

    pub fn is_full(&self) -> bool {
        matches!(self, Self::Full)
    }
}

/// Config-level choice of a derived pool, resolved once the matrix and
/// bounds are known.
///
/// ```toml
/// pool = "weekdays"
/// pool = { train = 0.8 }        # first 80% of valid start days
/// pool = { validation = 0.8 }   # the remaining 20%
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolSpec {
    #[default]
    Full,
    Weekdays,
    Train(f64),
    Validation(f64),
}

impl PoolSpec {
    pub fn is_full(&self) -> bool {
        matches!(self, Self::Full)
    }

    /// Matrix-independent check of the split fraction.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::Train(fraction) | Self::Validation(fraction)
                if !(fraction > 0.0 && fraction < 1.0) =>
            {
                Err(WindowError::InvalidSplit { fraction })
            }
            _ => Ok(()),
        }
    }

    pub fn start_days(&self, matrix: &SeriesMatrix, bounds: &WindowBounds) -> Result<StartDays> {
        match *self {
            Self::Full => Ok(StartDays::Full),
            Self::Weekdays => StartDays::weekdays(matrix, bounds),
            Self::Train(fraction) => Ok(StartDays::split(bounds, fraction)?.0),
            Self::Validation(fraction) => Ok(StartDays::split(bounds, fraction)?.1),
        }
    }
}
