//! Run manifest: what a run consumed and which seeds it used.

use crate::config::{RunConfig, SelectionPolicy};
use crate::data::SampleTable;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Identity and inputs of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    /// SHA-256 of the raw input bytes, or of the table contents when the
    /// table did not come from a file.
    pub dataset_sha256: String,
    pub rows: usize,
    pub features: usize,
    pub split_seed: u64,
    pub cv_seed: u64,
    pub selection: SelectionPolicy,
    pub platform: String,
}

impl RunManifest {
    pub fn capture(config: &RunConfig, table: &SampleTable, dataset_sha256: String) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            dataset_sha256,
            rows: table.len(),
            features: table.n_features(),
            split_seed: config.split.seed,
            cv_seed: config.tuning.seed,
            selection: config.tuning.selection,
            platform: format!("{} {}", std::env::consts::OS, std::env::consts::ARCH),
        }
    }
}

/// Digest of an in-memory table: header names, then each row's features and label.
pub fn table_fingerprint(table: &SampleTable) -> String {
    let mut hasher = Sha256::new();
    for name in table.feature_names() {
        hasher.update(name.as_bytes());
        hasher.update(b"\n");
    }
    for (row, &label) in table.features().rows().into_iter().zip(table.labels()) {
        for value in row {
            hasher.update(value.to_le_bytes());
        }
        hasher.update([label]);
    }
    format!("{:x}", hasher.finalize())
}
