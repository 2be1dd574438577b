//! Picking the model that goes on to holdout evaluation.

use crate::config::SelectionPolicy;
use crate::error::MlError;
use crate::training::tuner::CandidateResult;

/// Index of the candidate to evaluate.
///
/// `BestScore` takes the highest mean CV accuracy, the earlier registry entry
/// winning ties. `FirstEntry` always takes index 0 and logs a warning when a
/// later model actually scored higher.
pub fn select_best(
    candidates: &[CandidateResult],
    policy: SelectionPolicy,
) -> Result<usize, MlError> {
    if candidates.is_empty() {
        return Err(MlError::config("models.enabled", "no tuned candidates to select from"));
    }

    let mut top = 0;
    for (i, candidate) in candidates.iter().enumerate().skip(1) {
        if candidate.cv_score > candidates[top].cv_score {
            top = i;
        }
    }

    let chosen = match policy {
        SelectionPolicy::BestScore => top,
        SelectionPolicy::FirstEntry => {
            if top != 0 {
                tracing::warn!(
                    chosen = %candidates[0].model_id,
                    chosen_score = candidates[0].cv_score,
                    top = %candidates[top].model_id,
                    top_score = candidates[top].cv_score,
                    "first_entry selection ignores a higher-scoring model"
                );
            }
            0
        }
    };

    tracing::info!(
        model = %candidates[chosen].model_id,
        score = candidates[chosen].cv_score,
        ?policy,
        "Selected model"
    );
    Ok(chosen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::cross_validation::CrossValidationResult;
    use crate::training::sweep::Params;

    fn candidate(id: &str, score: f64) -> CandidateResult {
        CandidateResult {
            model_id: id.to_string(),
            display_name: id.to_string(),
            best_params: Params::default(),
            cv_score: score,
            cv: CrossValidationResult::from_scores(vec![score], "accuracy"),
            grid: Vec::new(),
        }
    }

    #[test]
    fn test_best_score_wins() {
        let candidates = [candidate("a", 0.7), candidate("b", 0.9), candidate("c", 0.8)];
        assert_eq!(select_best(&candidates, SelectionPolicy::BestScore).unwrap(), 1);
    }

    #[test]
    fn test_ties_go_to_registry_order() {
        let candidates = [candidate("a", 0.8), candidate("b", 0.9), candidate("c", 0.9)];
        assert_eq!(select_best(&candidates, SelectionPolicy::BestScore).unwrap(), 1);
    }

    #[test]
    fn test_first_entry_policy() {
        let candidates = [candidate("a", 0.7), candidate("b", 0.9)];
        assert_eq!(select_best(&candidates, SelectionPolicy::FirstEntry).unwrap(), 0);
    }

    #[test]
    fn test_empty_is_error() {
        assert!(select_best(&[], SelectionPolicy::BestScore).is_err());
    }
}
