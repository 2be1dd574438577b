//! K-fold cross-validation splitting and score aggregation.

use crate::config::TuningConfig;
use crate::error::MlError;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Cross-validation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CvStrategy {
    /// Contiguous folds over (optionally shuffled) rows.
    KFold { n_splits: usize, shuffle: bool },
    /// Each class dealt round-robin across folds.
    StratifiedKFold { n_splits: usize, shuffle: bool },
}

impl CvStrategy {
    pub fn n_splits(&self) -> usize {
        match self {
            Self::KFold { n_splits, .. } | Self::StratifiedKFold { n_splits, .. } => *n_splits,
        }
    }
}

/// A single train/validation split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CvSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub fold_idx: usize,
}

/// Cross-validation splitter.
#[derive(Debug, Clone)]
pub struct CrossValidator {
    strategy: CvStrategy,
    seed: u64,
}

impl CrossValidator {
    pub fn new(strategy: CvStrategy, seed: u64) -> Self {
        Self { strategy, seed }
    }

    pub fn from_config(config: &TuningConfig) -> Self {
        let strategy = if config.stratified {
            CvStrategy::StratifiedKFold {
                n_splits: config.n_folds,
                shuffle: config.shuffle,
            }
        } else {
            CvStrategy::KFold {
                n_splits: config.n_folds,
                shuffle: config.shuffle,
            }
        };
        Self::new(strategy, config.seed)
    }

    pub fn strategy(&self) -> CvStrategy {
        self.strategy
    }

    /// Generate the folds for `labels.len()` rows.
    pub fn split(&self, labels: &[u8]) -> Result<Vec<CvSplit>, MlError> {
        let n_samples = labels.len();
        let n_splits = self.strategy.n_splits();
        if n_splits < 2 {
            return Err(MlError::config(
                "tuning.n_folds",
                format!("must be at least 2, got {n_splits}"),
            ));
        }
        if n_samples < n_splits {
            return Err(MlError::config(
                "tuning.n_folds",
                format!("{n_splits} folds need at least {n_splits} rows, got {n_samples}"),
            ));
        }

        let folds = match self.strategy {
            CvStrategy::KFold { shuffle, .. } => self.k_fold(n_samples, n_splits, shuffle),
            CvStrategy::StratifiedKFold { shuffle, .. } => {
                self.stratified_k_fold(labels, n_splits, shuffle)
            }
        };

        Ok((0..n_splits)
            .map(|fold_idx| {
                let mut test_indices = folds[fold_idx].clone();
                test_indices.sort_unstable();
                let mut train_indices: Vec<usize> = folds
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != fold_idx)
                    .flat_map(|(_, f)| f.iter().copied())
                    .collect();
                train_indices.sort_unstable();
                CvSplit {
                    train_indices,
                    test_indices,
                    fold_idx,
                }
            })
            .collect())
    }

    fn k_fold(&self, n_samples: usize, n_splits: usize, shuffle: bool) -> Vec<Vec<usize>> {
        let mut indices: Vec<usize> = (0..n_samples).collect();
        if shuffle {
            indices.shuffle(&mut ChaCha8Rng::seed_from_u64(self.seed));
        }

        // The first `n % k` folds get one extra row.
        let base = n_samples / n_splits;
        let remainder = n_samples % n_splits;
        let mut folds = Vec::with_capacity(n_splits);
        let mut start = 0;
        for i in 0..n_splits {
            let size = if i < remainder { base + 1 } else { base };
            folds.push(indices[start..start + size].to_vec());
            start += size;
        }
        folds
    }

    fn stratified_k_fold(&self, labels: &[u8], n_splits: usize, shuffle: bool) -> Vec<Vec<usize>> {
        let mut by_class: [Vec<usize>; 2] = [Vec::new(), Vec::new()];
        for (i, &label) in labels.iter().enumerate() {
            by_class[usize::from(label.min(1))].push(i);
        }
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut folds = vec![Vec::new(); n_splits];
        // Continue dealing where the previous class stopped so fold sizes stay even.
        let mut next = 0;
        for indices in by_class.iter_mut() {
            if shuffle {
                indices.shuffle(&mut rng);
            }
            for &idx in indices.iter() {
                folds[next % n_splits].push(idx);
                next += 1;
            }
        }
        folds
    }
}

/// Aggregated fold scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossValidationResult {
    pub fold_scores: Vec<f64>,
    pub mean_score: f64,
    pub std_score: f64,
    pub metric_name: String,
}

impl CrossValidationResult {
    pub fn from_scores(scores: Vec<f64>, metric_name: &str) -> Self {
        let n = scores.len().max(1) as f64;
        let mean = scores.iter().sum::<f64>() / n;
        let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
        Self {
            fold_scores: scores,
            mean_score: mean,
            std_score: variance.sqrt(),
            metric_name: metric_name.to_string(),
        }
    }
}
