//! Soft-margin support vector classifier trained with SMO (Sequential Minimal
//! Optimization).

use super::{Classifier, check_training_data, check_width};
use crate::error::MlError;
use ndarray::{Array1, Array2, ArrayView1};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

pub const ID: &str = "svm";

/// Beyond this the eager kernel matrix gets too large to hold.
const MAX_KERNEL_MATRIX_SAMPLES: usize = 10_000;

/// Kernel choice exposed as a hyperparameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SvmKernel {
    /// K(x, y) = x · y
    Linear,
    /// K(x, y) = exp(-γ ||x - y||²), γ = 1 / (n_features · Var(X))
    Rbf,
}

impl SvmKernel {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "linear" => Some(Self::Linear),
            "rbf" => Some(Self::Rbf),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FittedSvm {
    support_vectors: Array2<f64>,
    /// α_i · y_i for each support vector.
    coefficients: Array1<f64>,
    bias: f64,
    gamma: f64,
}

/// Binary support vector classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SvmClassifier {
    pub c: f64,
    pub kernel: SvmKernel,
    pub tol: f64,
    pub max_iter: usize,
    pub seed: u64,
    fitted: Option<FittedSvm>,
}

impl SvmClassifier {
    pub fn new(c: f64, kernel: SvmKernel, seed: u64) -> Result<Self, MlError> {
        if !(c.is_finite() && c > 0.0) {
            return Err(MlError::fit(ID, format!("C must be positive, got {c}")));
        }
        Ok(Self {
            c,
            kernel,
            tol: 1e-3,
            max_iter: 200,
            seed,
            fitted: None,
        })
    }

    fn kernel_value(kernel: SvmKernel, gamma: f64, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        match kernel {
            SvmKernel::Linear => a.dot(&b),
            SvmKernel::Rbf => {
                let sq: f64 = a.iter().zip(b.iter()).map(|(p, q)| (p - q).powi(2)).sum();
                (-gamma * sq).exp()
            }
        }
    }

    fn scale_gamma(x: &Array2<f64>) -> f64 {
        let var = x.var(0.0);
        if var > f64::EPSILON {
            1.0 / (x.ncols() as f64 * var)
        } else {
            1.0
        }
    }

    /// Decision values; positive means class 1.
    pub fn decision_function(&self, x: &Array2<f64>) -> Result<Array1<f64>, MlError> {
        let fitted = self
            .fitted
            .as_ref()
            .ok_or_else(|| MlError::fit(ID, "predict called before fit"))?;
        check_width(ID, fitted.support_vectors.ncols(), x)?;

        Ok(x.rows()
            .into_iter()
            .map(|row| {
                fitted
                    .support_vectors
                    .rows()
                    .into_iter()
                    .zip(fitted.coefficients.iter())
                    .map(|(sv, coef)| coef * Self::kernel_value(self.kernel, fitted.gamma, sv, row))
                    .sum::<f64>()
                    + fitted.bias
            })
            .collect())
    }

    fn smo(&self, kernel: &Array2<f64>, y: &Array1<f64>) -> (Array1<f64>, f64) {
        let n = y.len();
        let c = self.c;
        let mut alphas = Array1::<f64>::zeros(n);
        let mut bias = 0.0;
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        let output = |alphas: &Array1<f64>, bias: f64, i: usize| -> f64 {
            let mut sum = bias;
            for k in 0..n {
                if alphas[k] > 0.0 {
                    sum += alphas[k] * y[k] * kernel[[k, i]];
                }
            }
            sum
        };

        let max_passes = 5;
        let mut passes = 0;
        let mut iterations = 0;
        while passes < max_passes && iterations < self.max_iter {
            let mut changed = 0;
            for i in 0..n {
                let e_i = output(&alphas, bias, i) - y[i];
                let violates = (y[i] * e_i < -self.tol && alphas[i] < c)
                    || (y[i] * e_i > self.tol && alphas[i] > 0.0);
                if !violates {
                    continue;
                }

                let j = loop {
                    let j = rng.gen_range(0..n);
                    if j != i {
                        break j;
                    }
                };
                let e_j = output(&alphas, bias, j) - y[j];
                let (alpha_i_old, alpha_j_old) = (alphas[i], alphas[j]);

                let (low, high) = if y[i] != y[j] {
                    ((alpha_j_old - alpha_i_old).max(0.0), (c + alpha_j_old - alpha_i_old).min(c))
                } else {
                    ((alpha_i_old + alpha_j_old - c).max(0.0), (alpha_i_old + alpha_j_old).min(c))
                };
                if (high - low).abs() < 1e-10 {
                    continue;
                }

                let eta = 2.0 * kernel[[i, j]] - kernel[[i, i]] - kernel[[j, j]];
                if eta >= 0.0 {
                    continue;
                }

                let alpha_j = (alpha_j_old - y[j] * (e_i - e_j) / eta).clamp(low, high);
                if (alpha_j - alpha_j_old).abs() < 1e-5 {
                    continue;
                }
                let alpha_i = alpha_i_old + y[i] * y[j] * (alpha_j_old - alpha_j);
                alphas[i] = alpha_i;
                alphas[j] = alpha_j;

                let b1 = bias
                    - e_i
                    - y[i] * (alpha_i - alpha_i_old) * kernel[[i, i]]
                    - y[j] * (alpha_j - alpha_j_old) * kernel[[i, j]];
                let b2 = bias
                    - e_j
                    - y[i] * (alpha_i - alpha_i_old) * kernel[[i, j]]
                    - y[j] * (alpha_j - alpha_j_old) * kernel[[j, j]];
                bias = if alpha_i > 0.0 && alpha_i < c {
                    b1
                } else if alpha_j > 0.0 && alpha_j < c {
                    b2
                } else {
                    (b1 + b2) / 2.0
                };
                changed += 1;
            }

            iterations += 1;
            if changed == 0 {
                passes += 1;
            } else {
                passes = 0;
            }
        }
        (alphas, bias)
    }
}

impl Classifier for SvmClassifier {
    fn id(&self) -> &str {
        ID
    }

    fn fit(&mut self, x: &Array2<f64>, y: &[u8]) -> Result<(), MlError> {
        check_training_data(ID, x, y)?;
        let n = x.nrows();
        if n > MAX_KERNEL_MATRIX_SAMPLES {
            return Err(MlError::fit(
                ID,
                format!("{n} rows exceed the kernel matrix limit of {MAX_KERNEL_MATRIX_SAMPLES}"),
            ));
        }

        let gamma = match self.kernel {
            SvmKernel::Linear => 0.0,
            SvmKernel::Rbf => Self::scale_gamma(x),
        };
        let signed: Array1<f64> = y.iter().map(|&l| if l == 1 { 1.0 } else { -1.0 }).collect();

        let mut kernel = Array2::<f64>::zeros((n, n));
        for i in 0..n {
            for j in i..n {
                let v = Self::kernel_value(self.kernel, gamma, x.row(i), x.row(j));
                kernel[[i, j]] = v;
                kernel[[j, i]] = v;
            }
        }

        let (alphas, bias) = self.smo(&kernel, &signed);
        let support: Vec<usize> = (0..n).filter(|&i| alphas[i] > 1e-8).collect();
        if support.is_empty() {
            // Decision function collapses to the bias term.
            tracing::debug!(rows = n, "SMO left every multiplier at zero");
        }

        self.fitted = Some(FittedSvm {
            support_vectors: x.select(ndarray::Axis(0), &support),
            coefficients: support.iter().map(|&i| alphas[i] * signed[i]).collect(),
            bias,
            gamma,
        });
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<u8>, MlError> {
        Ok(self
            .decision_function(x)?
            .iter()
            .map(|&d| u8::from(d >= 0.0))
            .collect())
    }
}
