//! L2-regularized logistic regression.

use super::{Classifier, check_training_data, check_width};
use crate::error::MlError;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

pub const ID: &str = "logistic_regression";

/// Logistic regression fitted by batch gradient descent.
///
/// Minimizes `mean(log_loss) + ||w||² / (2 · C · n)`, the per-sample form of the
/// usual `½||w||² + C · Σ log_loss` objective. The intercept is not penalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Inverse regularization strength.
    pub c: f64,
    pub max_iter: usize,
    pub tol: f64,
    pub learning_rate: f64,
    weights: Option<Array1<f64>>,
    intercept: f64,
}

impl LogisticRegression {
    pub fn new(c: f64) -> Result<Self, MlError> {
        if !(c.is_finite() && c > 0.0) {
            return Err(MlError::fit(ID, format!("C must be positive, got {c}")));
        }
        Ok(Self {
            c,
            max_iter: 2000,
            tol: 1e-6,
            learning_rate: 0.5,
            weights: None,
            intercept: 0.0,
        })
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    fn sigmoid(z: f64) -> f64 {
        if z >= 0.0 {
            1.0 / (1.0 + (-z).exp())
        } else {
            let e = z.exp();
            e / (1.0 + e)
        }
    }

    /// Probability of class 1 for each row.
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>, MlError> {
        let weights = self
            .weights
            .as_ref()
            .ok_or_else(|| MlError::fit(ID, "predict called before fit"))?;
        check_width(ID, weights.len(), x)?;
        Ok((x.dot(weights) + self.intercept).mapv(Self::sigmoid))
    }
}

impl Classifier for LogisticRegression {
    fn id(&self) -> &str {
        ID
    }

    fn fit(&mut self, x: &Array2<f64>, y: &[u8]) -> Result<(), MlError> {
        check_training_data(ID, x, y)?;
        let n = x.nrows() as f64;
        let targets: Array1<f64> = y.iter().map(|&l| f64::from(l)).collect();
        let penalty = 1.0 / (self.c * n);

        let mut weights = Array1::<f64>::zeros(x.ncols());
        let mut bias = 0.0;
        for _ in 0..self.max_iter {
            let predictions = (x.dot(&weights) + bias).mapv(Self::sigmoid);
            let errors = &predictions - &targets;
            let dw = x.t().dot(&errors) / n + &weights * penalty;
            let db = errors.sum() / n;

            let grad_norm = (dw.mapv(|v| v * v).sum() + db * db).sqrt();
            if grad_norm < self.tol {
                break;
            }
            weights = weights - dw * self.learning_rate;
            bias -= self.learning_rate * db;
        }

        if weights.iter().any(|w| !w.is_finite()) || !bias.is_finite() {
            return Err(MlError::fit(ID, "gradient descent diverged"));
        }
        self.weights = Some(weights);
        self.intercept = bias;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<u8>, MlError> {
        Ok(self
            .predict_proba(x)?
            .iter()
            .map(|&p| u8::from(p >= 0.5))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::test_data::{accuracy, blobs};

    #[test]
    fn test_separates_blobs() {
        let (x, y) = blobs(40, 3, 1);
        let mut model = LogisticRegression::new(1.0).unwrap();
        model.fit(&x, &y).unwrap();
        let pred = model.predict(&x).unwrap();
        assert!(accuracy(&pred, &y) > 0.95);
    }

    #[test]
    fn test_stronger_regularization_shrinks_weights() {
        let (x, y) = blobs(40, 2, 2);
        let mut loose = LogisticRegression::new(10.0).unwrap();
        let mut tight = LogisticRegression::new(0.01).unwrap();
        loose.fit(&x, &y).unwrap();
        tight.fit(&x, &y).unwrap();
        let norm = |m: &LogisticRegression| m.weights.as_ref().unwrap().mapv(|w| w * w).sum();
        assert!(norm(&tight) < norm(&loose));
    }

    #[test]
    fn test_probabilities_in_unit_interval() {
        let (x, y) = blobs(10, 2, 3);
        let mut model = LogisticRegression::new(0.1).unwrap();
        model.fit(&x, &y).unwrap();
        let proba = model.predict_proba(&x).unwrap();
        assert!(proba.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn test_invalid_c() {
        assert!(LogisticRegression::new(0.0).is_err());
        assert!(LogisticRegression::new(-1.0).is_err());
        assert!(LogisticRegression::new(f64::NAN).is_err());
    }

    #[test]
    fn test_predict_before_fit() {
        let model = LogisticRegression::new(1.0).unwrap();
        assert!(model.predict(&Array2::zeros((1, 2))).is_err());
    }
}
