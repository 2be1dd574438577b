//! End-to-end runs of the model-selection workflow on synthetic PCA tables.

mod common;

use arnie_ml::data::train_test_split;
use arnie_ml::report::{render_console, write_artifacts};
use arnie_ml::training::ParamValue;
use arnie_ml::{ExperimentRunner, MlError, RunConfig, SelectionPolicy};
use pretty_assertions::assert_eq;

fn logistic_only() -> RunConfig {
    let mut config = RunConfig::default();
    config.models.enabled = Some(vec!["logistic_regression".to_string()]);
    config
}

#[tokio::test]
async fn reference_scenario_from_csv() {
    let dir = tempfile::tempdir().unwrap();
    let csv = common::pca_csv(40, 150, 10, 7);
    let path = common::write_csv(dir.path(), "arnie_pca.csv", &csv);

    let mut config = logistic_only();
    config.data.path = path;
    let outcome = ExperimentRunner::new(config).unwrap().run().await.unwrap();

    assert_eq!(outcome.manifest.rows, 190);
    assert_eq!(outcome.manifest.features, 10);
    assert_eq!(outcome.manifest.dataset_sha256.len(), 64);
    assert_eq!(outcome.test_rows, 38);
    assert_eq!(outcome.train_rows, 152);

    let candidate = outcome.selected_candidate();
    assert_eq!(candidate.model_id, "logistic_regression");
    assert_eq!(candidate.grid.len(), 4);
    let c = candidate.best_params.get("C").and_then(ParamValue::as_f64).unwrap();
    assert!([0.01, 0.1, 1.0, 10.0].contains(&c));
    assert!((0.0..=1.0).contains(&candidate.cv_score));

    let matrix = outcome.evaluation.metrics.confusion_matrix;
    assert_eq!(matrix.total(), 38);
    // Stratified holdout: 8 positives, 30 negatives.
    assert_eq!(matrix.counts[1][0] + matrix.counts[1][1], 8);
    assert_eq!(matrix.counts[0][0] + matrix.counts[0][1], 30);

    let m = &outcome.evaluation.metrics;
    for value in [m.accuracy, m.precision, m.recall, m.f1_score] {
        assert!((0.0..=1.0).contains(&value));
    }
}

#[test]
fn stratified_split_of_reference_table() {
    let table = common::pca_table(40, 150, 10, 7);
    let split = train_test_split(&table, &RunConfig::default().split).unwrap();
    assert_eq!(split.test.len(), 38);
    assert_eq!(split.test.class_counts(), [30, 8]);
    assert_eq!(split.train.class_counts(), [120, 32]);
}

#[test]
fn repeated_runs_are_identical() {
    let table = common::pca_table(40, 150, 6, 11);
    let runner = ExperimentRunner::new(logistic_only()).unwrap();
    let first = runner.execute(table.clone()).unwrap();
    let second = runner.execute(table).unwrap();

    assert_eq!(first.candidates, second.candidates);
    assert_eq!(first.evaluation, second.evaluation);
    assert_eq!(first.manifest.dataset_sha256, second.manifest.dataset_sha256);
    assert_ne!(first.manifest.run_id, second.manifest.run_id);
}

#[test]
fn full_registry_selects_top_scorer() {
    let table = common::pca_table(30, 60, 4, 3);
    let runner = ExperimentRunner::new(RunConfig::default()).unwrap();
    let outcome = runner.execute(table).unwrap();

    let ids: Vec<&str> = outcome.candidates.iter().map(|c| c.model_id.as_str()).collect();
    assert_eq!(ids, ["logistic_regression", "svm", "random_forest"]);
    assert_eq!(outcome.candidates[1].grid.len(), 6);
    assert_eq!(outcome.candidates[2].grid.len(), 9);

    let best = outcome
        .candidates
        .iter()
        .map(|c| c.cv_score)
        .fold(f64::MIN, f64::max);
    assert_eq!(outcome.selected_candidate().cv_score, best);
    assert_eq!(outcome.evaluation.model_id, outcome.selected_candidate().model_id);
}

#[test]
fn first_entry_policy_always_evaluates_first_model() {
    let table = common::pca_table(30, 60, 4, 3);
    let mut config = RunConfig::default();
    config.models.enabled = Some(vec!["svm".to_string(), "logistic_regression".to_string()]);
    config.tuning.selection = SelectionPolicy::FirstEntry;
    let outcome = ExperimentRunner::new(config).unwrap().execute(table).unwrap();
    assert_eq!(outcome.selected, 0);
    assert_eq!(outcome.evaluation.model_id, "svm");
}

#[tokio::test]
async fn missing_file_is_load_error_naming_path() {
    let mut config = logistic_only();
    config.data.path = "/definitely/not/here.csv".into();
    let err = ExperimentRunner::new(config).unwrap().run().await.unwrap_err();
    assert!(matches!(err, MlError::Load { .. }));
    assert!(err.to_string().contains("/definitely/not/here.csv"));
}

#[tokio::test]
async fn missing_label_column_is_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_csv(dir.path(), "bad.csv", "pc1,pc2,target\n0.1,0.2,1\n");
    let mut config = logistic_only();
    config.data.path = path;
    let err = ExperimentRunner::new(config).unwrap().run().await.unwrap_err();
    assert!(matches!(err, MlError::Load { .. }));
    assert!(err.to_string().contains("label"));
}

#[test]
fn report_artifacts_and_console() {
    let dir = tempfile::tempdir().unwrap();
    let table = common::pca_table(20, 40, 4, 5);
    let mut config = logistic_only();
    config.report.heatmap_path = dir.path().join("cm.svg");
    config.report.summary_path = Some(dir.path().join("run.json"));

    let runner = ExperimentRunner::new(config.clone()).unwrap();
    let outcome = runner.execute(table).unwrap();
    let written = write_artifacts(&config.report, &outcome).unwrap();
    assert_eq!(written.len(), 2);

    let svg = std::fs::read_to_string(dir.path().join("cm.svg")).unwrap();
    assert!(svg.contains("Non-Arnie"));
    assert!(svg.contains("True Label"));

    let text = render_console(&outcome);
    assert!(text.starts_with("Model: Logistic Regression\n"));
    assert!(text.contains(&"-".repeat(50)));
    assert!(text.lines().any(|l| l.starts_with("F1 Score: ")));
}
