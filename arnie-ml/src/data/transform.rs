//! Feature standardization.

use crate::error::MlError;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Standard scaling (z-score): `(x - mean) / std`, per column.
///
/// Uses the population standard deviation; zero-variance columns are only
/// centered.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Option<Array1<f64>>,
    scale: Option<Array1<f64>>,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fit(&mut self, x: &Array2<f64>) -> Result<&mut Self, MlError> {
        if x.nrows() == 0 {
            return Err(MlError::fit("scaler", "cannot fit on zero rows"));
        }
        let mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| MlError::fit("scaler", "cannot fit on zero rows"))?;
        let scale = x
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s > f64::EPSILON { s } else { 1.0 });
        self.mean = Some(mean);
        self.scale = Some(scale);
        Ok(self)
    }

    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>, MlError> {
        let (Some(mean), Some(scale)) = (&self.mean, &self.scale) else {
            return Err(MlError::fit("scaler", "transform called before fit"));
        };
        if x.ncols() != mean.len() {
            return Err(MlError::fit(
                "scaler",
                format!("fitted on {} features, got {}", mean.len(), x.ncols()),
            ));
        }
        Ok((x - mean) / scale)
    }

    pub fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>, MlError> {
        self.fit(x)?;
        self.transform(x)
    }
}
