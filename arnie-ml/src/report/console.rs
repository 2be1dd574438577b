//! Plain-text run report for stdout.

use crate::training::RunOutcome;
use std::fmt::Write;

pub const SEPARATOR_WIDTH: usize = 50;

/// Per-model tuning blocks followed by the holdout metrics of the selected model.
pub fn render_console(outcome: &RunOutcome) -> String {
    let mut out = String::new();
    let separator = "-".repeat(SEPARATOR_WIDTH);

    for candidate in &outcome.candidates {
        // Writing to a String cannot fail.
        let _ = writeln!(out, "Model: {}", candidate.display_name);
        let _ = writeln!(out, "Best Parameters: {}", candidate.best_params);
        let _ = writeln!(out, "Cross-Validated Accuracy: {:.4}", candidate.cv_score);
        let _ = writeln!(out, "{separator}");
    }

    let evaluation = &outcome.evaluation;
    let metrics = &evaluation.metrics;
    let _ = writeln!(out, "Selected Model: {}", evaluation.display_name);
    let _ = writeln!(out, "Accuracy: {:.4}", metrics.accuracy);
    let _ = writeln!(out, "Precision: {:.4}", metrics.precision);
    let _ = writeln!(out, "Recall: {:.4}", metrics.recall);
    let _ = writeln!(out, "F1 Score: {:.4}", metrics.f1_score);
    out
}
