//! Run reporting: console text, confusion-matrix heatmap, JSON summary.

pub mod console;
pub mod heatmap;
pub mod summary;

pub use console::render_console;
pub use heatmap::{render_heatmap, write_heatmap};
pub use summary::{RunSummary, write_summary};

use crate::config::ReportConfig;
use crate::error::MlError;
use crate::training::{RunOutcome, RunStage};
use std::path::PathBuf;

/// Write every configured artifact for `outcome`, returning the paths written.
pub fn write_artifacts(
    config: &ReportConfig,
    outcome: &RunOutcome,
) -> Result<Vec<PathBuf>, MlError> {
    tracing::info!(stage = %RunStage::Report, "Stage started");
    let mut written = Vec::new();

    let title = format!("Confusion Matrix: {}", outcome.evaluation.display_name);
    write_heatmap(
        &config.heatmap_path,
        &outcome.evaluation.metrics.confusion_matrix,
        &config.class_names,
        &title,
    )?;
    written.push(config.heatmap_path.clone());

    if let Some(path) = &config.summary_path {
        write_summary(path, outcome)?;
        written.push(path.clone());
    }
    Ok(written)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::config::{RunConfig, SelectionPolicy};
    use crate::data::SampleTable;
    use crate::training::cross_validation::CrossValidationResult;
    use crate::training::evaluator::EvaluationReport;
    use crate::training::metrics::{ClassificationMetrics, ConfusionMatrix};
    use crate::training::reproducibility::RunManifest;
    use crate::training::sweep::Params;
    use crate::training::tuner::CandidateResult;
    use crate::training::RunOutcome;

    fn candidate(id: &str, name: &str, param: &str, value: f64, score: f64) -> CandidateResult {
        let mut params = Params::default();
        params.insert(param, value);
        CandidateResult {
            model_id: id.to_string(),
            display_name: name.to_string(),
            best_params: params,
            cv_score: score,
            cv: CrossValidationResult::from_scores(vec![score; 5], "accuracy"),
            grid: Vec::new(),
        }
    }

    /// Outcome shaped like the reference run: 38 holdout rows, 8 positive.
    pub(crate) fn outcome() -> RunOutcome {
        let mut config = RunConfig::default();
        config.tuning.selection = SelectionPolicy::FirstEntry;
        let table = SampleTable::from_rows(&[(vec![0.0], 0), (vec![1.0], 1)]).unwrap();
        let candidates = vec![
            candidate("logistic_regression", "Logistic Regression", "C", 0.1, 0.82),
            candidate("svm", "SVM", "C", 1.0, 0.8),
        ];
        let evaluation = EvaluationReport {
            model_id: "logistic_regression".into(),
            display_name: "Logistic Regression".into(),
            params: candidates[0].best_params.clone(),
            train_rows: 152,
            test_rows: 38,
            metrics: ClassificationMetrics::from_confusion(ConfusionMatrix {
                counts: [[27, 3], [5, 3]],
            }),
        };
        RunOutcome {
            manifest: RunManifest::capture(&config, &table, "00".repeat(32)),
            train_rows: 152,
            test_rows: 38,
            candidates,
            selected: 0,
            evaluation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_artifacts_honors_summary_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ReportConfig::default();
        config.heatmap_path = dir.path().join("cm.svg");

        let written = write_artifacts(&config, &fixtures::outcome()).unwrap();
        assert_eq!(written, vec![dir.path().join("cm.svg")]);

        config.summary_path = Some(dir.path().join("summary.json"));
        let written = write_artifacts(&config, &fixtures::outcome()).unwrap();
        assert_eq!(written.len(), 2);
        assert!(dir.path().join("summary.json").exists());
    }
}
