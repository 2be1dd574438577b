//! Binary classification metrics (positive class = label 1).

use serde::{Deserialize, Serialize};

/// 2×2 counts indexed `[true label][predicted label]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub counts: [[usize; 2]; 2],
}

impl ConfusionMatrix {
    pub fn from_predictions(truth: &[u8], predicted: &[u8]) -> Self {
        let mut counts = [[0usize; 2]; 2];
        for (&t, &p) in truth.iter().zip(predicted) {
            counts[usize::from(t.min(1))][usize::from(p.min(1))] += 1;
        }
        Self { counts }
    }

    pub fn true_negatives(&self) -> usize {
        self.counts[0][0]
    }

    pub fn false_positives(&self) -> usize {
        self.counts[0][1]
    }

    pub fn false_negatives(&self) -> usize {
        self.counts[1][0]
    }

    pub fn true_positives(&self) -> usize {
        self.counts[1][1]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn max_count(&self) -> usize {
        self.counts.iter().flatten().copied().max().unwrap_or(0)
    }
}

/// Holdout metrics for the selected model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub confusion_matrix: ConfusionMatrix,
}

/// `num / den`, or 0 when the denominator is 0.
fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 { 0.0 } else { num / den }
}

impl ClassificationMetrics {
    pub fn compute(truth: &[u8], predicted: &[u8]) -> Self {
        Self::from_confusion(ConfusionMatrix::from_predictions(truth, predicted))
    }

    pub fn from_confusion(matrix: ConfusionMatrix) -> Self {
        let tp = matrix.true_positives() as f64;
        let fp = matrix.false_positives() as f64;
        let fn_ = matrix.false_negatives() as f64;
        let tn = matrix.true_negatives() as f64;

        let accuracy = ratio(tp + tn, matrix.total() as f64);
        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        let f1_score = ratio(2.0 * precision * recall, precision + recall);

        Self {
            accuracy,
            precision,
            recall,
            f1_score,
            confusion_matrix: matrix,
        }
    }
}
