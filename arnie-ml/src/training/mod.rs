//! Training workflow: pipelines, cross-validation, grid search, selection, evaluation.

pub mod cross_validation;
pub mod evaluator;
pub mod metrics;
pub mod pipeline;
pub mod reproducibility;
pub mod runner;
pub mod selection;
pub mod sweep;
pub mod tuner;

pub use cross_validation::{CrossValidationResult, CrossValidator, CvSplit, CvStrategy};
pub use evaluator::{EvaluationReport, evaluate};
pub use metrics::{ClassificationMetrics, ConfusionMatrix};
pub use pipeline::Pipeline;
pub use reproducibility::RunManifest;
pub use runner::{ExperimentRunner, RunOutcome, RunStage};
pub use selection::select_best;
pub use sweep::{ParamValue, Params, SearchSpace};
pub use tuner::{CandidateResult, GridPoint, TuningEngine};
