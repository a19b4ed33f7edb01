//! Window offsets and the start-day bound arithmetic shared by all generators.
//!
//! For a start day `i`:
//! - inputs are rows `i + learn[j]` for each learn offset, in order
//! - regression targets are rows `i + Lcap + predict[k]`
//! - direction labels compare rows `i + Lcap` and `i + Lcap - 1`
//!
//! where `Lcap = max(learn) + 1`. The valid start days are `[0, N - Lcap - Pcap)`.

use serde::{Deserialize, Serialize};

use crate::error::{Result, WindowError};

/// An ordered, non-empty set of day offsets relative to a start day.
///
/// Order is preserved exactly: it defines the feature ordering downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<i64>", into = "Vec<u64>")]
pub struct Window {
    offsets: Vec<usize>,
}

impl Window {
    /// Offsets must fit in an `i64` so every window survives a round trip
    /// through its signed config form.
    pub fn new(offsets: Vec<usize>) -> Result<Self> {
        if offsets.is_empty() {
            return Err(WindowError::window("window must contain at least one offset"));
        }
        if let Some(&o) = offsets.iter().find(|&&o| i64::try_from(o).is_err()) {
            return Err(WindowError::window(format!("offset {o} exceeds {}", i64::MAX)));
        }
        Ok(Self { offsets })
    }

    /// The contiguous window `0..len`.
    pub fn range(len: usize) -> Result<Self> {
        Self::new((0..len).collect())
    }

    /// Accept signed offsets, rejecting negatives.
    pub fn from_signed(offsets: &[i64]) -> Result<Self> {
        let converted = offsets
            .iter()
            .map(|&o| {
                usize::try_from(o)
                    .map_err(|_| WindowError::window(format!("negative offset {o}")))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(converted)
    }

    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// True only for an empty offset list, which `new` rejects.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Rows needed to realize this window from a start day: `max + 1`.
    pub fn cap(&self) -> usize {
        self.offsets
            .iter()
            .max()
            .map_or(0, |m| m.saturating_add(1))
    }
}

impl TryFrom<Vec<i64>> for Window {
    type Error = WindowError;

    fn try_from(offsets: Vec<i64>) -> Result<Self> {
        Self::from_signed(&offsets)
    }
}

impl From<Window> for Vec<u64> {
    fn from(w: Window) -> Self {
        w.offsets.into_iter().map(|o| o as u64).collect()
    }
}

/// Bounds for one (matrix, learn window, predict extent) combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowBounds {
    rows: usize,
    lcap: usize,
    pcap: usize,
    limit: usize,
}

impl WindowBounds {
    /// Bounds for regression targets: `Pcap = max(predict) + 1`.
    pub fn regression(rows: usize, learn: &Window, predict: &Window) -> Result<Self> {
        Self::new(rows, learn.cap(), predict.cap())
    }

    /// Bounds for direction labels: `Pcap = 1`.
    pub fn direction(rows: usize, learn: &Window) -> Result<Self> {
        Self::new(rows, learn.cap(), 1)
    }

    fn new(rows: usize, lcap: usize, pcap: usize) -> Result<Self> {
        let needed = lcap
            .checked_add(pcap)
            .ok_or_else(|| WindowError::window("window offsets overflow"))?;
        match rows.checked_sub(needed) {
            Some(limit) if limit > 0 => Ok(Self {
                rows,
                lcap,
                pcap,
                limit,
            }),
            _ => Err(WindowError::window(format!(
                "need more than {needed} rows (Lcap {lcap} + Pcap {pcap}), matrix has {rows}"
            ))),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn lcap(&self) -> usize {
        self.lcap
    }

    pub fn pcap(&self) -> usize {
        self.pcap
    }

    /// Exclusive upper bound of valid start days: `N - Lcap - Pcap`.
    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn contains(&self, day: usize) -> bool {
        day < self.limit
    }

    /// First row after the learn window for start day `start`.
    pub fn target_base(&self, start: usize) -> usize {
        start + self.lcap
    }
}
