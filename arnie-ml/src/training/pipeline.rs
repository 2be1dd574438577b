//! Two-stage pipeline: standardize, then classify.

use crate::algorithms::Classifier;
use crate::data::StandardScaler;
use crate::error::MlError;
use ndarray::Array2;

/// Scaler and estimator fitted together, so the scaler only ever sees the rows
/// the estimator trains on.
#[derive(Debug)]
pub struct Pipeline {
    scaler: StandardScaler,
    model: Box<dyn Classifier>,
}

impl Pipeline {
    pub fn new(model: Box<dyn Classifier>) -> Self {
        Self {
            scaler: StandardScaler::new(),
            model,
        }
    }

    pub fn model_id(&self) -> &str {
        self.model.id()
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &[u8]) -> Result<(), MlError> {
        let scaled = self
            .scaler
            .fit_transform(x)
            .map_err(|e| e.with_model(self.model.id()))?;
        self.model.fit(&scaled, y)
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Vec<u8>, MlError> {
        let scaled = self
            .scaler
            .transform(x)
            .map_err(|e| e.with_model(self.model.id()))?;
        self.model.predict(&scaled)
    }

    /// Fraction of rows predicted correctly.
    pub fn score(&self, x: &Array2<f64>, y: &[u8]) -> Result<f64, MlError> {
        let predicted = self.predict(x)?;
        if y.is_empty() {
            return Ok(0.0);
        }
        let correct = predicted.iter().zip(y).filter(|(p, t)| p == t).count();
        Ok(correct as f64 / y.len() as f64)
    }
}
