//! CART decision tree for binary classification (Gini impurity).

use super::{Classifier, check_training_data, check_width};
use crate::error::MlError;
use ndarray::{Array2, ArrayView1};
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

pub const ID: &str = "decision_tree";

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Node {
    Leaf {
        /// Fraction of class-1 rows that reached this leaf.
        positive_fraction: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// Decision tree classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    /// Features considered per split; `None` considers all of them.
    pub max_features: Option<usize>,
    pub seed: u64,
    n_features: usize,
    root: Option<Node>,
}

fn gini(positives: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let p = positives as f64 / total as f64;
    2.0 * p * (1.0 - p)
}

impl DecisionTree {
    pub fn new(max_depth: Option<usize>, seed: u64) -> Self {
        Self {
            max_depth,
            min_samples_split: 2,
            max_features: None,
            seed,
            n_features: 0,
            root: None,
        }
    }

    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features.max(1));
        self
    }

    /// Grow the tree on the rows named by `indices` (duplicates allowed, as in a
    /// bootstrap sample). Does not require both classes to be present.
    pub(crate) fn fit_rows(&mut self, x: &Array2<f64>, y: &[u8], indices: &[usize]) {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        self.n_features = x.ncols();
        self.root = Some(self.build(x, y, indices, 0, &mut rng));
    }

    fn build(
        &self,
        x: &Array2<f64>,
        y: &[u8],
        indices: &[usize],
        depth: usize,
        rng: &mut ChaCha8Rng,
    ) -> Node {
        let total = indices.len();
        let positives = indices.iter().filter(|&&i| y[i] == 1).count();
        let leaf = Node::Leaf {
            positive_fraction: if total == 0 {
                0.0
            } else {
                positives as f64 / total as f64
            },
        };

        let pure = positives == 0 || positives == total;
        let too_deep = self.max_depth.is_some_and(|d| depth >= d);
        if pure || too_deep || total < self.min_samples_split {
            return leaf;
        }

        let Some((feature, threshold)) = self.best_split(x, y, indices, positives, rng) else {
            return leaf;
        };
        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, feature]] <= threshold);

        Node::Split {
            feature,
            threshold,
            left: Box::new(self.build(x, y, &left, depth + 1, rng)),
            right: Box::new(self.build(x, y, &right, depth + 1, rng)),
        }
    }

    fn best_split(
        &self,
        x: &Array2<f64>,
        y: &[u8],
        indices: &[usize],
        positives: usize,
        rng: &mut ChaCha8Rng,
    ) -> Option<(usize, f64)> {
        let n_features = x.ncols();
        let mut features: Vec<usize> = (0..n_features).collect();
        let take = self.max_features.unwrap_or(n_features).min(n_features);
        if take < n_features {
            features.shuffle(rng);
        }

        let total = indices.len();
        let parent = gini(positives, total);
        let mut best: Option<(usize, f64, f64)> = None;

        for &feature in &features[..take] {
            let mut column: Vec<(f64, u8)> =
                indices.iter().map(|&i| (x[[i, feature]], y[i])).collect();
            column.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_pos = 0usize;
            for split in 1..total {
                left_pos += usize::from(column[split - 1].1);
                if column[split - 1].0 == column[split].0 {
                    continue;
                }
                let right_pos = positives - left_pos;
                let weighted = (split as f64 * gini(left_pos, split)
                    + (total - split) as f64 * gini(right_pos, total - split))
                    / total as f64;
                let gain = parent - weighted;
                if gain > 1e-12 && best.is_none_or(|(_, _, g)| gain > g) {
                    let threshold = (column[split - 1].0 + column[split].0) / 2.0;
                    best = Some((feature, threshold, gain));
                }
            }
        }
        best.map(|(feature, threshold, _)| (feature, threshold))
    }

    /// Class-1 probability for one row.
    pub(crate) fn positive_fraction(&self, row: ArrayView1<f64>) -> Result<f64, MlError> {
        let mut node = self
            .root
            .as_ref()
            .ok_or_else(|| MlError::fit(ID, "predict called before fit"))?;
        loop {
            match node {
                Node::Leaf { positive_fraction } => return Ok(*positive_fraction),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold { left } else { right };
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        fn walk(node: &Node) -> usize {
            match node {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(left).max(walk(right)),
            }
        }
        self.root.as_ref().map_or(0, walk)
    }

    pub(crate) fn n_features(&self) -> usize {
        self.n_features
    }
}

impl Classifier for DecisionTree {
    fn id(&self) -> &str {
        ID
    }

    fn fit(&mut self, x: &Array2<f64>, y: &[u8]) -> Result<(), MlError> {
        check_training_data(ID, x, y)?;
        let indices: Vec<usize> = (0..x.nrows()).collect();
        self.fit_rows(x, y, &indices);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<u8>, MlError> {
        check_width(ID, self.n_features, x)?;
        x.rows()
            .into_iter()
            .map(|row| Ok(u8::from(self.positive_fraction(row)? > 0.5)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::test_data::{accuracy, rings};
    use ndarray::array;

    #[test]
    fn test_fits_training_data_fully() {
        let (x, y) = rings(60, 7);
        let mut tree = DecisionTree::new(None, 0);
        tree.fit(&x, &y).unwrap();
        assert_eq!(accuracy(&tree.predict(&x).unwrap(), &y), 1.0);
    }

    #[test]
    fn test_max_depth_respected() {
        let (x, y) = rings(60, 8);
        let mut tree = DecisionTree::new(Some(2), 0);
        tree.fit(&x, &y).unwrap();
        assert!(tree.depth() <= 2);
    }

    #[test]
    fn test_threshold_is_midpoint() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = [0, 0, 1, 1];
        let mut tree = DecisionTree::new(None, 0);
        tree.fit(&x, &y).unwrap();
        assert_eq!(tree.predict(&array![[2.4], [2.6]]).unwrap(), vec![0, 1]);
        assert_eq!(tree.depth(), 1);
    }

    #[test]
    fn test_gini() {
        assert_eq!(gini(0, 10), 0.0);
        assert_eq!(gini(5, 10), 0.5);
    }
}
