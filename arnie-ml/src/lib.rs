//! # arnie-ml: model selection for the Arnie face classifier
//!
//! Loads a PCA-reduced feature table, splits it into training and holdout rows,
//! tunes every registered classifier with cross-validated grid search behind a
//! standard-scaling pipeline, evaluates the selected configuration on the holdout
//! rows, and renders the results.
//!
//! ```text
//! load -> split -> tune (every registry entry) -> select -> evaluate -> report
//! ```
//!
//! [`ExperimentRunner`] drives the whole workflow; the stages are also usable on
//! their own.

// Foundation
pub mod config;
pub mod error;

// Data
pub mod data;

// Estimators and the registry that binds them to search spaces
pub mod algorithms;
pub mod zoo;

// Tuning, selection and evaluation
pub mod training;

// Output
pub mod report;

// Re-exports
pub use config::{RunConfig, SelectionPolicy, load_config};
pub use data::{CsvSource, DataSource, SampleTable};
pub use error::MlError;
pub use training::{ExperimentRunner, RunOutcome, RunStage};
pub use zoo::ModelRegistry;
