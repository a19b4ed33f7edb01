//! daywindow core: windowed training batches over dense daily time series.
//!
//! A [`SeriesMatrix`] holds one row per calendar day and one column per
//! series. Three generators carve it into (learn window, target) examples:
//! - [`WindowSampler`]: infinite random regression batches
//! - [`WindowIterator`]: one deterministic pass over every start day
//! - [`DirectionSampler`]: infinite random up/down label batches
//!
//! Generators borrow the matrix read-only and own their cursor and RNG, so
//! any number of them can share one matrix.

pub mod batch;
pub mod config;
pub mod direction;
pub mod error;
pub mod fingerprint;
pub mod iterator;
pub mod loader;
pub mod matrix;
pub mod options;
pub mod pool;
pub mod sampler;
pub mod window;

pub use batch::{gather_all, Batch};
pub use config::{ConfigError, GeneratorConfig};
pub use direction::DirectionSampler;
pub use error::WindowError;
pub use fingerprint::StreamFingerprint;
pub use iterator::WindowIterator;
pub use loader::{load_csv, read_csv, LoadError};
pub use matrix::SeriesMatrix;
pub use options::BatchOptions;
pub use pool::{PoolSpec, StartDays};
pub use sampler::WindowSampler;
pub use window::{Window, WindowBounds};
