//! Binary classifiers used as pipeline estimators.
//!
//! Every estimator implements [`Classifier`] over dense `f64` features and `u8`
//! labels in `{0, 1}`. Estimators are cheap to construct and are fitted from
//! scratch for every cross-validation fold.

pub mod forest;
pub mod logistic;
pub mod svm;
pub mod tree;

pub use forest::RandomForest;
pub use logistic::LogisticRegression;
pub use svm::{SvmClassifier, SvmKernel};
pub use tree::DecisionTree;

use crate::error::MlError;
use ndarray::Array2;

/// Capability every registry entry provides: fit on labeled rows, predict labels.
pub trait Classifier: Send + Sync + std::fmt::Debug {
    /// Model id used in error messages.
    fn id(&self) -> &str;

    fn fit(&mut self, x: &Array2<f64>, y: &[u8]) -> Result<(), MlError>;

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<u8>, MlError>;
}

/// Shared precondition for `fit`: matching lengths, at least one row, both classes.
pub(crate) fn check_training_data(model: &str, x: &Array2<f64>, y: &[u8]) -> Result<(), MlError> {
    if x.nrows() != y.len() {
        return Err(MlError::fit(
            model,
            format!("{} feature rows but {} labels", x.nrows(), y.len()),
        ));
    }
    if y.is_empty() {
        return Err(MlError::fit(model, "no training rows"));
    }
    let positives = y.iter().filter(|&&l| l == 1).count();
    if positives == 0 || positives == y.len() {
        return Err(MlError::fit(
            model,
            "training data contains a single class",
        ));
    }
    Ok(())
}

/// Shared precondition for `predict`: fitted width matches.
pub(crate) fn check_width(model: &str, expected: usize, x: &Array2<f64>) -> Result<(), MlError> {
    if x.ncols() != expected {
        return Err(MlError::fit(
            model,
            format!("fitted on {expected} features, got {}", x.ncols()),
        ));
    }
    Ok(())
}
