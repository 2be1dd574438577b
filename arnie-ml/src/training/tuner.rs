//! Cross-validated grid search over every registry entry.

use crate::config::TuningConfig;
use crate::data::SampleTable;
use crate::error::MlError;
use crate::training::cross_validation::{CrossValidationResult, CrossValidator, CvSplit};
use crate::training::pipeline::Pipeline;
use crate::training::sweep::Params;
use crate::zoo::{ModelEntry, ModelRegistry};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Mean fold accuracy for one grid point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridPoint {
    pub params: Params,
    pub cv: CrossValidationResult,
}

/// Best configuration found for one model. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateResult {
    pub model_id: String,
    pub display_name: String,
    pub best_params: Params,
    /// Mean cross-validated accuracy of `best_params`.
    pub cv_score: f64,
    pub cv: CrossValidationResult,
    /// Every evaluated grid point, in grid order.
    pub grid: Vec<GridPoint>,
}

/// Grid-search driver. Folds are computed once per [`TuningEngine::tune`] call and
/// shared by every entry, so candidate scores are comparable.
#[derive(Debug, Clone)]
pub struct TuningEngine {
    validator: CrossValidator,
    seed: u64,
    parallel: bool,
}

impl TuningEngine {
    pub fn new(validator: CrossValidator, seed: u64, parallel: bool) -> Self {
        Self {
            validator,
            seed,
            parallel,
        }
    }

    pub fn from_config(config: &TuningConfig) -> Self {
        Self::new(CrossValidator::from_config(config), config.seed, config.parallel)
    }

    /// Tune every entry in registry order. The first failure aborts the run.
    pub fn tune(
        &self,
        registry: &ModelRegistry,
        train: &SampleTable,
    ) -> Result<Vec<CandidateResult>, MlError> {
        let folds = self.validator.split(train.labels())?;
        tracing::info!(
            models = registry.len(),
            folds = folds.len(),
            rows = train.len(),
            parallel = self.parallel,
            "Tuning models"
        );
        registry
            .entries()
            .iter()
            .map(|entry| self.tune_entry(entry, train, &folds))
            .collect()
    }

    /// Exhaustive search over one entry's grid on precomputed folds.
    pub fn tune_entry(
        &self,
        entry: &ModelEntry,
        train: &SampleTable,
        folds: &[CvSplit],
    ) -> Result<CandidateResult, MlError> {
        let span = tracing::info_span!("tune", model = %entry.id);
        let _guard = span.enter();

        let grid = entry.search_space.grid();
        let fold_data: Vec<(SampleTable, SampleTable)> = folds
            .iter()
            .map(|f| (train.select(&f.train_indices), train.select(&f.test_indices)))
            .collect();
        let k = fold_data.len();
        let jobs: Vec<(usize, usize)> = (0..grid.len())
            .flat_map(|g| (0..k).map(move |f| (g, f)))
            .collect();

        let evaluate = |&(g, f): &(usize, usize)| -> Result<f64, MlError> {
            let (fit_rows, val_rows) = &fold_data[f];
            let mut pipeline = Pipeline::new(entry.build(&grid[g], self.seed)?);
            pipeline
                .fit(fit_rows.features(), fit_rows.labels())
                .and_then(|_| pipeline.score(val_rows.features(), val_rows.labels()))
                .map_err(|e| match e {
                    MlError::Fit { reason, .. } => MlError::fit(
                        &entry.id,
                        format!("fold {f} with {}: {reason}", grid[g]),
                    ),
                    other => other,
                })
        };

        // Collected in job order either way, so parallelism cannot change results.
        let outcomes: Vec<Result<f64, MlError>> = if self.parallel {
            jobs.par_iter().map(&evaluate).collect()
        } else {
            jobs.iter().map(&evaluate).collect()
        };
        let scores = outcomes.into_iter().collect::<Result<Vec<f64>, MlError>>()?;

        let points: Vec<GridPoint> = grid
            .into_iter()
            .zip(scores.chunks(k))
            .map(|(params, fold_scores)| GridPoint {
                params,
                cv: CrossValidationResult::from_scores(fold_scores.to_vec(), "accuracy"),
            })
            .collect();

        let mut best = 0;
        for (i, point) in points.iter().enumerate() {
            tracing::debug!(params = %point.params, score = point.cv.mean_score, "Grid point");
            if point.cv.mean_score > points[best].cv.mean_score {
                best = i;
            }
        }
        let winner = points
            .get(best)
            .cloned()
            .ok_or_else(|| MlError::config(format!("models.search_spaces.{}", entry.id), "empty grid"))?;

        tracing::info!(
            params = %winner.params,
            score = winner.cv.mean_score,
            grid_points = points.len(),
            "Best configuration"
        );

        Ok(CandidateResult {
            model_id: entry.id.clone(),
            display_name: entry.display_name.clone(),
            best_params: winner.params,
            cv_score: winner.cv.mean_score,
            cv: winner.cv,
            grid: points,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::test_data::blobs;
    use crate::config::ModelsConfig;
    use crate::training::cross_validation::CvStrategy;
    use crate::training::sweep::SearchSpace;
    use std::collections::BTreeMap;

    fn table(n_per_class: usize, seed: u64) -> SampleTable {
        let (x, y) = blobs(n_per_class, 3, seed);
        let names = vec!["pc1".into(), "pc2".into(), "pc3".into()];
        SampleTable::new(names, x, y).unwrap()
    }

    fn logistic_only() -> ModelRegistry {
        let config = ModelsConfig {
            enabled: Some(vec!["logistic_regression".into()]),
            search_spaces: BTreeMap::new(),
        };
        ModelRegistry::standard().with_config(&config).unwrap()
    }

    fn engine(parallel: bool) -> TuningEngine {
        let cv = CrossValidator::new(CvStrategy::KFold { n_splits: 5, shuffle: true }, 42);
        TuningEngine::new(cv, 42, parallel)
    }

    #[test]
    fn test_selects_one_config_per_model() {
        let train = table(30, 1);
        let results = engine(true).tune(&logistic_only(), &train).unwrap();
        assert_eq!(results.len(), 1);
        let result = &results[0];
        assert_eq!(result.grid.len(), 4);
        assert!(result.best_params.get("C").is_some());
        assert!((0.0..=1.0).contains(&result.cv_score));
        assert_eq!(result.cv.fold_scores.len(), 5);
        let max = result
            .grid
            .iter()
            .map(|p| p.cv.mean_score)
            .fold(f64::MIN, f64::max);
        assert_eq!(result.cv_score, max);
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let train = table(25, 2);
        let registry = ModelRegistry::standard();
        let a = engine(true).tune(&registry, &train).unwrap();
        let b = engine(false).tune(&registry, &train).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_ties_go_to_first_grid_point() {
        // Perfectly separable data: every C scores 1.0.
        let train = table(20, 3);
        let mut spaces = BTreeMap::new();
        spaces.insert(
            "logistic_regression".to_string(),
            SearchSpace::new().with("C", vec![1.0.into(), 10.0.into()]),
        );
        let config = ModelsConfig {
            enabled: Some(vec!["logistic_regression".into()]),
            search_spaces: spaces,
        };
        let registry = ModelRegistry::standard().with_config(&config).unwrap();
        let result = &engine(false).tune(&registry, &train).unwrap()[0];
        if result.grid[0].cv.mean_score == result.grid[1].cv.mean_score {
            assert_eq!(result.best_params, result.grid[0].params);
        }
    }

    #[test]
    fn test_single_class_fold_is_fit_error() {
        // Unshuffled folds over sorted labels: the first fold trains on positives only.
        let mut y = vec![0u8; 4];
        y.extend(vec![1u8; 16]);
        let x = ndarray::Array2::from_shape_fn((20, 1), |(i, _)| i as f64);
        let train = SampleTable::new(vec!["pc1".into()], x, y).unwrap();
        let cv = CrossValidator::new(CvStrategy::KFold { n_splits: 5, shuffle: false }, 0);
        let err = TuningEngine::new(cv, 0, false)
            .tune(&logistic_only(), &train)
            .unwrap_err();
        match err {
            MlError::Fit { model, reason } => {
                assert_eq!(model, "logistic_regression");
                assert!(reason.contains("fold 0"));
                assert!(reason.contains("single class"));
            }
            other => panic!("expected fit error, got {other}"),
        }
    }
}
