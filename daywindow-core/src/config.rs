//! TOML generator configuration.
//!
//! ```toml
//! batch_size = 32
//! learn_window = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9]   # or: learn_len = 10
//! predict_len = 5                                 # or: predict_window = [...]
//! start_days = []          # empty = every valid start day
//! pool = "weekdays"        # or { train = 0.8 } / { validation = 0.8 }; excludes start_days
//! seed = 42                # omit for entropy seeding
//! reference_column = 0
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::direction::DirectionSampler;
use crate::error::WindowError;
use crate::fingerprint::{hash_json, StreamFingerprint};
use crate::iterator::WindowIterator;
use crate::matrix::SeriesMatrix;
use crate::options::BatchOptions;
use crate::pool::{PoolSpec, StartDays};
use crate::sampler::WindowSampler;
use crate::window::{Window, WindowBounds};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{field}: give either explicit offsets or a length, not both")]
    Ambiguous { field: &'static str },

    #[error("{first} and {second} cannot both be set")]
    Conflict {
        first: &'static str,
        second: &'static str,
    },

    #[error("{field} is required")]
    Missing { field: &'static str },

    #[error(transparent)]
    Window(#[from] WindowError),

    #[error("serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Serializable parameters shared by all three generators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorConfig {
    pub batch_size: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learn_window: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learn_len: Option<usize>,

    /// Not needed by the direction sampler.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predict_window: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predict_len: Option<usize>,

    #[serde(default)]
    pub start_days: Vec<usize>,
    /// Derived pool; only valid with an empty `start_days`.
    #[serde(default, skip_serializing_if = "PoolSpec::is_full")]
    pub pool: PoolSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default)]
    pub reference_column: usize,
}

/// Resolved form used for hashing, so `learn_len = 10` and
/// `learn_window = [0..9]` fingerprint identically.
#[derive(Serialize)]
struct Canonical<'a> {
    batch_size: usize,
    learn: &'a [usize],
    predict: Option<&'a [usize]>,
    start_days: &'a StartDays,
    pool: PoolSpec,
    reference_column: usize,
}

fn resolve_window(
    field: &'static str,
    offsets: &Option<Vec<i64>>,
    len: Option<usize>,
) -> Result<Option<Window>, ConfigError> {
    match (offsets, len) {
        (Some(_), Some(_)) => Err(ConfigError::Ambiguous { field }),
        (Some(offsets), None) => Ok(Some(Window::from_signed(offsets)?)),
        (None, Some(len)) => Ok(Some(Window::range(len)?)),
        (None, None) => Ok(None),
    }
}

impl GeneratorConfig {
    /// Contiguous `0..learn_len` / `0..predict_len` windows.
    pub fn contiguous(batch_size: usize, learn_len: usize, predict_len: usize) -> Self {
        Self {
            batch_size,
            learn_window: None,
            learn_len: Some(learn_len),
            predict_window: None,
            predict_len: Some(predict_len),
            start_days: Vec::new(),
            pool: PoolSpec::Full,
            seed: None,
            reference_column: 0,
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Matrix-independent checks. Bounds against a concrete matrix are
    /// checked when a generator is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(WindowError::InvalidBatchSize.into());
        }
        self.learn()?;
        resolve_window("predict_window", &self.predict_window, self.predict_len)?;
        if !self.start_days.is_empty() && !self.pool.is_full() {
            return Err(ConfigError::Conflict {
                first: "start_days",
                second: "pool",
            });
        }
        self.pool.validate()?;
        Ok(())
    }

    pub fn learn(&self) -> Result<Window, ConfigError> {
        resolve_window("learn_window", &self.learn_window, self.learn_len)?
            .ok_or(ConfigError::Missing {
                field: "learn_window",
            })
    }

    pub fn predict(&self) -> Result<Window, ConfigError> {
        resolve_window("predict_window", &self.predict_window, self.predict_len)?.ok_or(
            ConfigError::Missing {
                field: "predict_window",
            },
        )
    }

    /// Options with the pool taken from `start_days`. A derived `pool` is
    /// only resolved by the generator builders, which know the bounds.
    pub fn options(&self) -> BatchOptions {
        BatchOptions {
            batch_size: self.batch_size,
            start_days: StartDays::from_list(self.start_days.clone()),
            seed: self.seed,
            reference_column: self.reference_column,
        }
    }

    fn options_for(
        &self,
        matrix: &SeriesMatrix,
        bounds: &WindowBounds,
    ) -> Result<BatchOptions, ConfigError> {
        let options = self.options();
        if self.pool.is_full() {
            return Ok(options);
        }
        Ok(options.with_start_days(self.pool.start_days(matrix, bounds)?))
    }

    pub fn window_sampler<'a>(
        &self,
        matrix: &'a SeriesMatrix,
    ) -> Result<WindowSampler<'a>, ConfigError> {
        let (learn, predict) = (self.learn()?, self.predict()?);
        let bounds = WindowBounds::regression(matrix.n_rows(), &learn, &predict)?;
        let options = self.options_for(matrix, &bounds)?;
        Ok(WindowSampler::new(matrix, learn, predict, &options)?)
    }

    pub fn window_iterator<'a>(
        &self,
        matrix: &'a SeriesMatrix,
    ) -> Result<WindowIterator<'a>, ConfigError> {
        let (learn, predict) = (self.learn()?, self.predict()?);
        let bounds = WindowBounds::regression(matrix.n_rows(), &learn, &predict)?;
        let options = self.options_for(matrix, &bounds)?;
        Ok(WindowIterator::new(matrix, learn, predict, &options)?)
    }

    pub fn direction_sampler<'a>(
        &self,
        matrix: &'a SeriesMatrix,
    ) -> Result<DirectionSampler<'a>, ConfigError> {
        let learn = self.learn()?;
        let bounds = WindowBounds::direction(matrix.n_rows(), &learn)?;
        let options = self.options_for(matrix, &bounds)?;
        Ok(DirectionSampler::new(matrix, learn, &options)?)
    }

    /// BLAKE3 of the resolved configuration, excluding the seed.
    pub fn config_hash(&self) -> Result<String, ConfigError> {
        let learn = self.learn()?;
        let predict = resolve_window("predict_window", &self.predict_window, self.predict_len)?;
        let start_days = StartDays::from_list(self.start_days.clone());
        let canonical = Canonical {
            batch_size: self.batch_size,
            learn: learn.offsets(),
            predict: predict.as_ref().map(|w| w.offsets()),
            start_days: &start_days,
            pool: self.pool,
            reference_column: self.reference_column,
        };
        Ok(hash_json(&canonical)?)
    }

    pub fn fingerprint(&self, matrix: &SeriesMatrix) -> Result<StreamFingerprint, ConfigError> {
        Ok(StreamFingerprint {
            dataset_hash: matrix.dataset_hash(),
            config_hash: self.config_hash()?,
            seed: self.seed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPLICIT: &str = r#"
batch_size = 8
learn_window = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9]
predict_window = [0, 1, 2, 3, 4]
seed = 42
"#;

    #[test]
    fn parses_explicit_windows() {
        let config = GeneratorConfig::from_toml(EXPLICIT).unwrap();
        assert_eq!(config.batch_size, 8);
        assert_eq!(config.learn().unwrap(), Window::range(10).unwrap());
        assert_eq!(config.predict().unwrap().cap(), 5);
        assert_eq!(config.options().seed, Some(42));
        assert!(config.options().start_days.is_full());
    }

    #[test]
    fn length_shorthand_equals_explicit_range() {
        let short = GeneratorConfig::from_toml(
            "batch_size = 8\nlearn_len = 10\npredict_len = 5\nseed = 42\n",
        )
        .unwrap();
        let long = GeneratorConfig::from_toml(EXPLICIT).unwrap();
        assert_eq!(short.learn().unwrap(), long.learn().unwrap());
        assert_eq!(short.config_hash().unwrap(), long.config_hash().unwrap());
    }

    #[test]
    fn negative_offset_rejected() {
        let err = GeneratorConfig::from_toml("batch_size = 1\nlearn_window = [0, -1]\n")
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Window(WindowError::InvalidWindow { .. })
        ));
    }

    #[test]
    fn empty_learn_window_rejected() {
        let err = GeneratorConfig::from_toml("batch_size = 1\nlearn_window = []\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Window(WindowError::InvalidWindow { .. })
        ));
    }

    #[test]
    fn both_forms_are_ambiguous() {
        let err = GeneratorConfig::from_toml("batch_size = 1\nlearn_window = [0]\nlearn_len = 3\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Ambiguous { field: "learn_window" }));
    }

    #[test]
    fn learn_window_required() {
        let err = GeneratorConfig::from_toml("batch_size = 1\npredict_len = 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::Missing { field: "learn_window" }));
    }

    #[test]
    fn unknown_fields_rejected() {
        assert!(matches!(
            GeneratorConfig::from_toml("batch_size = 1\nlearn_len = 3\nwindow = 4\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn zero_batch_size_rejected() {
        let err = GeneratorConfig::from_toml("batch_size = 0\nlearn_len = 3\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Window(WindowError::InvalidBatchSize)
        ));
    }

    #[test]
    fn direction_config_needs_no_predict_window() {
        let toml = "batch_size = 4\nlearn_len = 5\nseed = 1\n";
        let config = GeneratorConfig::from_toml(toml).unwrap();
        let m = SeriesMatrix::ramp(100, 2).unwrap();
        assert!(config.direction_sampler(&m).is_ok());
        assert!(matches!(
            config.window_sampler(&m),
            Err(ConfigError::Missing { field: "predict_window" })
        ));
    }

    #[test]
    fn start_days_become_explicit_pool() {
        let config = GeneratorConfig::from_toml(
            "batch_size = 2\nlearn_len = 10\npredict_len = 5\nstart_days = [200, 0, 100]\n",
        )
        .unwrap();
        assert_eq!(
            config.options().start_days,
            StartDays::Explicit(vec![0, 100, 200])
        );
        let m = SeriesMatrix::ramp(1000, 1).unwrap();
        assert_eq!(config.window_iterator(&m).unwrap().len(), 1);
    }

    #[test]
    fn out_of_range_start_day_fails_at_build() {
        let config = GeneratorConfig::from_toml(
            "batch_size = 2\nlearn_len = 10\npredict_len = 5\nstart_days = [0, 985]\n",
        )
        .unwrap();
        let m = SeriesMatrix::ramp(1000, 1).unwrap();
        assert!(matches!(
            config.window_sampler(&m),
            Err(ConfigError::Window(WindowError::InvalidPool { day: 985, .. }))
        ));
    }

    const WEEKDAYS: &str = r#"
batch_size = 4
learn_len = 10
predict_len = 5
pool = "weekdays"
seed = 1
"#;

    #[test]
    fn weekday_pool_from_config() {
        let config = GeneratorConfig::from_toml(WEEKDAYS).unwrap();
        assert_eq!(config.pool, PoolSpec::Weekdays);

        // 2024-01-06 is a Saturday; limit is 985.
        let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 6).unwrap();
        let m = SeriesMatrix::ramp(1000, 1).unwrap().with_start_date(start);
        let s = config.window_sampler(&m).unwrap();
        assert_eq!(s.pool()[..3], [2, 3, 4]);
        assert!(s.pool().iter().all(|d| !matches!(d % 7, 0 | 1)));

        let undated = SeriesMatrix::ramp(1000, 1).unwrap();
        assert!(matches!(
            config.window_sampler(&undated),
            Err(ConfigError::Window(WindowError::MissingCalendar))
        ));
    }

    #[test]
    fn split_pools_from_config() {
        let m = SeriesMatrix::ramp(1000, 1).unwrap();
        let train = GeneratorConfig::from_toml(
            "batch_size = 4\nlearn_len = 10\npredict_len = 5\npool = { train = 0.5 }\n",
        )
        .unwrap();
        let valid = GeneratorConfig::from_toml(
            "batch_size = 4\nlearn_len = 10\npredict_len = 5\npool = { validation = 0.5 }\n",
        )
        .unwrap();
        assert_eq!(train.window_iterator(&m).unwrap().covered_days().len(), 492);
        assert_eq!(valid.window_sampler(&m).unwrap().pool()[0], 492);
        // Direction bounds differ: limit 989.
        assert_eq!(train.direction_sampler(&m).unwrap().pool().len(), 494);
        assert_ne!(train.config_hash().unwrap(), valid.config_hash().unwrap());
    }

    #[test]
    fn pool_and_start_days_conflict() {
        let err = GeneratorConfig::from_toml(
            "batch_size = 1\nlearn_len = 3\nstart_days = [1]\npool = \"weekdays\"\n",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Conflict {
                first: "start_days",
                second: "pool"
            }
        ));
    }

    #[test]
    fn bad_split_fraction_rejected_at_parse() {
        let toml = "batch_size = 1\nlearn_len = 3\npool = { train = 1.0 }\n";
        let err = GeneratorConfig::from_toml(toml).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Window(WindowError::InvalidSplit { .. })
        ));
    }

    #[test]
    fn config_hash_tracks_parameters_not_seed() {
        let base = GeneratorConfig::contiguous(8, 10, 5);
        let mut other = base.clone();
        other.seed = Some(99);
        assert_eq!(base.config_hash().unwrap(), other.config_hash().unwrap());

        other.batch_size = 16;
        assert_ne!(base.config_hash().unwrap(), other.config_hash().unwrap());
    }

    #[test]
    fn fingerprint_combines_dataset_and_seed() {
        let m = SeriesMatrix::ramp(100, 1).unwrap();
        let mut config = GeneratorConfig::contiguous(8, 10, 5);
        config.seed = Some(3);
        let fp = config.fingerprint(&m).unwrap();
        assert_eq!(fp.dataset_hash, m.dataset_hash());
        assert_eq!(fp.seed, Some(3));
        assert_eq!(fp.id(), config.fingerprint(&m).unwrap().id());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = GeneratorConfig::from_file(Path::new("/nonexistent/daywindow.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/daywindow.toml"));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gen.toml");
        std::fs::write(&path, EXPLICIT).unwrap();
        let config = GeneratorConfig::from_file(&path).unwrap();
        assert_eq!(config.seed, Some(42));
    }
}
