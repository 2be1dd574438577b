//! Holdout evaluation of the selected configuration.

use crate::data::SampleTable;
use crate::error::MlError;
use crate::training::metrics::ClassificationMetrics;
use crate::training::pipeline::Pipeline;
use crate::training::sweep::Params;
use crate::zoo::ModelEntry;
use serde::{Deserialize, Serialize};

/// Metrics for one fitted configuration against the holdout rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub model_id: String,
    pub display_name: String,
    pub params: Params,
    pub train_rows: usize,
    pub test_rows: usize,
    pub metrics: ClassificationMetrics,
}

/// Fit a fresh pipeline (new scaler, new estimator) on all of `train` and score
/// it on `test`.
pub fn evaluate(
    entry: &ModelEntry,
    params: &Params,
    seed: u64,
    train: &SampleTable,
    test: &SampleTable,
) -> Result<EvaluationReport, MlError> {
    let mut pipeline = Pipeline::new(entry.build(params, seed)?);
    pipeline
        .fit(train.features(), train.labels())
        .map_err(|e| e.with_model(&entry.id))?;
    let predicted = pipeline
        .predict(test.features())
        .map_err(|e| e.with_model(&entry.id))?;
    let metrics = ClassificationMetrics::compute(test.labels(), &predicted);

    tracing::info!(
        model = %entry.id,
        params = %params,
        accuracy = metrics.accuracy,
        precision = metrics.precision,
        recall = metrics.recall,
        f1 = metrics.f1_score,
        "Evaluated on holdout"
    );

    Ok(EvaluationReport {
        model_id: entry.id.clone(),
        display_name: entry.display_name.clone(),
        params: params.clone(),
        train_rows: train.len(),
        test_rows: test.len(),
        metrics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::test_data::blobs;
    use crate::zoo::ModelRegistry;

    #[test]
    fn test_evaluate_counts_every_holdout_row() {
        let (x, y) = blobs(30, 2, 21);
        let names = vec!["pc1".into(), "pc2".into()];
        let table = SampleTable::new(names, x, y).unwrap();
        let train_idx: Vec<usize> = (0..45).collect();
        let test_idx: Vec<usize> = (45..60).collect();
        let (train, test) = (table.select(&train_idx), table.select(&test_idx));

        let registry = ModelRegistry::standard();
        let entry = registry.get("logistic_regression").unwrap();
        let mut params = Params::default();
        params.insert("C", 1.0);

        let report = evaluate(entry, &params, 42, &train, &test).unwrap();
        assert_eq!(report.metrics.confusion_matrix.total(), 15);
        assert_eq!(report.test_rows, 15);
        assert!(report.metrics.accuracy > 0.9);
    }
}
