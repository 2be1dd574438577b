//! Machine-readable JSON summary of a finished run.

use crate::error::MlError;
use crate::training::evaluator::EvaluationReport;
use crate::training::reproducibility::RunManifest;
use crate::training::tuner::CandidateResult;
use crate::training::RunOutcome;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct RunSummary<'a> {
    pub generated_at: DateTime<Utc>,
    pub manifest: &'a RunManifest,
    pub train_rows: usize,
    pub test_rows: usize,
    pub candidates: &'a [CandidateResult],
    pub selected_model: &'a str,
    pub evaluation: &'a EvaluationReport,
}

impl<'a> RunSummary<'a> {
    pub fn from_outcome(outcome: &'a RunOutcome) -> Self {
        Self {
            generated_at: Utc::now(),
            manifest: &outcome.manifest,
            train_rows: outcome.train_rows,
            test_rows: outcome.test_rows,
            candidates: &outcome.candidates,
            selected_model: &outcome.selected_candidate().model_id,
            evaluation: &outcome.evaluation,
        }
    }
}

/// Write the summary as pretty JSON through a temporary file and rename.
pub fn write_summary(path: &Path, outcome: &RunOutcome) -> Result<(), MlError> {
    let content = serde_json::to_string_pretty(&RunSummary::from_outcome(outcome))?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, &content)?;
    std::fs::rename(&tmp, path)?;
    tracing::info!(path = %path.display(), "Wrote run summary");
    Ok(())
}
