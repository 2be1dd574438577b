//! Random forest: bagged decision trees with per-split feature subsampling.

use super::tree::DecisionTree;
use super::{Classifier, check_training_data, check_width};
use crate::error::MlError;
use ndarray::Array2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

pub const ID: &str = "random_forest";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub seed: u64,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn new(n_estimators: usize, max_depth: Option<usize>, seed: u64) -> Result<Self, MlError> {
        if n_estimators == 0 {
            return Err(MlError::fit(ID, "n_estimators must be at least 1"));
        }
        if max_depth == Some(0) {
            return Err(MlError::fit(ID, "max_depth must be at least 1 or none"));
        }
        Ok(Self {
            n_estimators,
            max_depth,
            seed,
            trees: Vec::new(),
        })
    }

    /// Mean class-1 probability across trees, per row.
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>, MlError> {
        let first = self
            .trees
            .first()
            .ok_or_else(|| MlError::fit(ID, "predict called before fit"))?;
        check_width(ID, first.n_features(), x)?;

        let n_trees = self.trees.len() as f64;
        x.rows()
            .into_iter()
            .map(|row| {
                let mut sum = 0.0;
                for tree in &self.trees {
                    sum += tree.positive_fraction(row)?;
                }
                Ok(sum / n_trees)
            })
            .collect()
    }
}

impl Classifier for RandomForest {
    fn id(&self) -> &str {
        ID
    }

    fn fit(&mut self, x: &Array2<f64>, y: &[u8]) -> Result<(), MlError> {
        check_training_data(ID, x, y)?;
        let n = x.nrows();
        let max_features = ((x.ncols() as f64).sqrt().round() as usize).max(1);

        // Each tree owns a seed derived from its position, so the forest does not
        // depend on which thread grows which tree.
        self.trees = (0..self.n_estimators)
            .into_par_iter()
            .map(|t| {
                let tree_seed = self.seed.wrapping_mul(1_000_003).wrapping_add(t as u64);
                let mut rng = ChaCha8Rng::seed_from_u64(tree_seed);
                let bootstrap: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                let mut tree =
                    DecisionTree::new(self.max_depth, tree_seed).with_max_features(max_features);
                tree.fit_rows(x, y, &bootstrap);
                tree
            })
            .collect();
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<u8>, MlError> {
        Ok(self
            .predict_proba(x)?
            .into_iter()
            .map(|p| u8::from(p > 0.5))
            .collect())
    }
}
