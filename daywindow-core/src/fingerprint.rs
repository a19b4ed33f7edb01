//! Deterministic identification of batch streams.
//!
//! - `dataset_hash`: content hash of a series matrix.
//! - `StreamFingerprint`: dataset + canonical generator config + seed. Two
//!   seeded samplers with equal fingerprints produce identical batches.

use serde::{Deserialize, Serialize};

use crate::matrix::SeriesMatrix;

/// BLAKE3 over shape, column names, start date and every value in
/// row-major order.
pub fn dataset_hash(matrix: &SeriesMatrix) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(matrix.n_rows() as u64).to_le_bytes());
    hasher.update(&(matrix.n_cols() as u64).to_le_bytes());
    for name in matrix.columns() {
        hasher.update(name.as_bytes());
        hasher.update(&[0]);
    }
    if let Some(date) = matrix.start_date() {
        hasher.update(date.to_string().as_bytes());
    }
    for v in matrix.values().iter() {
        hasher.update(&v.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// BLAKE3 over canonical JSON bytes.
pub(crate) fn hash_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let json = serde_json::to_vec(value)?;
    Ok(blake3::hash(&json).to_hex().to_string())
}

/// Identity of one reproducible batch stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamFingerprint {
    pub dataset_hash: String,
    pub config_hash: String,
    pub seed: Option<u64>,
}

impl StreamFingerprint {
    /// Short id for logs and file names. Unseeded streams are never
    /// reproducible, so their id says so.
    pub fn id(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.dataset_hash.as_bytes());
        hasher.update(self.config_hash.as_bytes());
        match self.seed {
            Some(seed) => {
                hasher.update(&seed.to_le_bytes());
                hasher.finalize().to_hex().as_str()[..16].to_string()
            }
            None => "unseeded".to_string(),
        }
    }
}
