//! In-memory sample table: a dense feature matrix plus one binary label per row.

use crate::error::MlError;
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

/// Ordered rows of `(feature vector, label)`, with a fixed feature width.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleTable {
    feature_names: Vec<String>,
    features: Array2<f64>,
    labels: Vec<u8>,
}

impl SampleTable {
    /// Build a table, checking that shapes agree and labels are binary.
    pub fn new(
        feature_names: Vec<String>,
        features: Array2<f64>,
        labels: Vec<u8>,
    ) -> Result<Self, MlError> {
        if features.nrows() != labels.len() {
            return Err(MlError::config(
                "table",
                format!(
                    "{} feature rows but {} labels",
                    features.nrows(),
                    labels.len()
                ),
            ));
        }
        if features.ncols() != feature_names.len() {
            return Err(MlError::config(
                "table",
                format!(
                    "{} feature columns but {} names",
                    features.ncols(),
                    feature_names.len()
                ),
            ));
        }
        if let Some(bad) = labels.iter().find(|&&l| l > 1) {
            return Err(MlError::config("table", format!("label {bad} is not binary")));
        }
        Ok(Self {
            feature_names,
            features,
            labels,
        })
    }

    /// Build a table from row tuples; feature names are generated as `pc1..pcD`.
    pub fn from_rows(rows: &[(Vec<f64>, u8)]) -> Result<Self, MlError> {
        let width = rows.first().map(|(f, _)| f.len()).unwrap_or(0);
        let mut flat = Vec::with_capacity(rows.len() * width);
        let mut labels = Vec::with_capacity(rows.len());
        for (i, (features, label)) in rows.iter().enumerate() {
            if features.len() != width {
                return Err(MlError::config(
                    "table",
                    format!("row {i} has {} features, expected {width}", features.len()),
                ));
            }
            flat.extend_from_slice(features);
            labels.push(*label);
        }
        let features = Array2::from_shape_vec((rows.len(), width), flat)
            .map_err(|e| MlError::config("table", e.to_string()))?;
        let names = (1..=width).map(|i| format!("pc{i}")).collect();
        Self::new(names, features, labels)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn features(&self) -> &Array2<f64> {
        &self.features
    }

    pub fn labels(&self) -> &[u8] {
        &self.labels
    }

    /// Count of `[class 0, class 1]` rows.
    pub fn class_counts(&self) -> [usize; 2] {
        let positives = self.labels.iter().filter(|&&l| l == 1).count();
        [self.labels.len() - positives, positives]
    }

    /// Rows at `indices`, in the given order.
    pub fn select(&self, indices: &[usize]) -> SampleTable {
        SampleTable {
            feature_names: self.feature_names.clone(),
            features: self.features.select(Axis(0), indices),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
        }
    }
}
