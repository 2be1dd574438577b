//! Data source abstraction for loading the feature table.

use crate::data::table::SampleTable;
use crate::error::MlError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;

/// Information about a loaded source, kept for the run manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSourceInfo {
    pub source_type: String,
    pub location: String,
    pub accessed_at: DateTime<Utc>,
    pub row_count: usize,
    /// SHA-256 of the raw bytes that were parsed.
    pub sha256: String,
}

/// A table together with where it came from.
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub table: SampleTable,
    pub info: DataSourceInfo,
}

/// Trait for loading a sample table.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn load(&self) -> Result<LoadedDataset, MlError>;
}

// ---------------------------------------------------------------------------
// CsvSource
// ---------------------------------------------------------------------------

/// Delimited text file with a header row, numeric feature columns and one
/// binary label column.
pub struct CsvSource {
    pub path: PathBuf,
    pub label_column: String,
    pub delimiter: char,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>, label_column: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            label_column: label_column.into(),
            delimiter: ',',
        }
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Parse an in-memory buffer; errors are attributed to `self.path`.
    pub fn parse(&self, bytes: &[u8]) -> Result<SampleTable, MlError> {
        let delimiter = u8::try_from(self.delimiter)
            .map_err(|_| MlError::load(&self.path, "delimiter must be a single-byte character"))?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .trim(csv::Trim::All)
            .from_reader(bytes);

        let headers = reader
            .headers()
            .map_err(|e| MlError::load(&self.path, format!("unreadable header: {e}")))?
            .clone();

        let label_idx = headers
            .iter()
            .position(|h| h == self.label_column)
            .ok_or_else(|| {
                MlError::load(
                    &self.path,
                    format!("label column '{}' not found in header", self.label_column),
                )
            })?;

        let feature_names: Vec<String> = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != label_idx)
            .map(|(_, h)| h.to_string())
            .collect();
        if feature_names.is_empty() {
            return Err(MlError::load(&self.path, "no feature columns besides the label"));
        }

        let mut flat = Vec::new();
        let mut labels = Vec::new();
        for (row_idx, record) in reader.records().enumerate() {
            // Header is line 1.
            let line = row_idx + 2;
            let record =
                record.map_err(|e| MlError::load(&self.path, format!("line {line}: {e}")))?;

            for (col_idx, field) in record.iter().enumerate() {
                if col_idx == label_idx {
                    labels.push(parse_label(field).ok_or_else(|| {
                        MlError::load(
                            &self.path,
                            format!("line {line}: label '{field}' is not 0 or 1"),
                        )
                    })?);
                } else {
                    let value: f64 = field.parse().map_err(|_| {
                        MlError::load(
                            &self.path,
                            format!("line {line}: '{}' is not numeric", field),
                        )
                    })?;
                    if !value.is_finite() {
                        return Err(MlError::load(
                            &self.path,
                            format!("line {line}: non-finite value '{field}'"),
                        ));
                    }
                    flat.push(value);
                }
            }
        }

        if labels.is_empty() {
            return Err(MlError::load(&self.path, "no data rows"));
        }

        let features = Array2::from_shape_vec((labels.len(), feature_names.len()), flat)
            .map_err(|e| MlError::load(&self.path, e.to_string()))?;
        SampleTable::new(feature_names, features, labels)
            .map_err(|e| MlError::load(&self.path, e.to_string()))
    }
}

fn parse_label(field: &str) -> Option<u8> {
    match field.parse::<f64>().ok()? {
        v if v == 0.0 => Some(0),
        v if v == 1.0 => Some(1),
        _ => None,
    }
}

#[async_trait]
impl DataSource for CsvSource {
    async fn load(&self) -> Result<LoadedDataset, MlError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| MlError::load(&self.path, e.to_string()))?;

        let table = self.parse(&bytes)?;
        let sha256 = format!("{:x}", Sha256::digest(&bytes));

        tracing::info!(
            path = %self.path.display(),
            rows = table.len(),
            features = table.n_features(),
            "Loaded dataset"
        );

        let info = DataSourceInfo {
            source_type: "csv".to_string(),
            location: self.path.display().to_string(),
            accessed_at: Utc::now(),
            row_count: table.len(),
            sha256,
        };
        Ok(LoadedDataset { table, info })
    }
}
