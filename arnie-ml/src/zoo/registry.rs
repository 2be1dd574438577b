//! Model registry: the enumerable set of estimators tuned on every run.

use crate::algorithms::{
    Classifier, LogisticRegression, RandomForest, SvmClassifier, SvmKernel, forest, logistic, svm,
};
use crate::config::ModelsConfig;
use crate::error::MlError;
use crate::training::sweep::{ParamValue, Params, SearchSpace};

/// Builds an unfitted estimator from one grid point and the run seed.
pub type ModelFactory = fn(&Params, u64) -> Result<Box<dyn Classifier>, MlError>;

/// One registry entry: an estimator capability bound to its search space.
#[derive(Debug, Clone)]
pub struct ModelEntry {
    pub id: String,
    pub display_name: String,
    /// Hyperparameter names the factory understands.
    pub hyperparameters: &'static [&'static str],
    pub search_space: SearchSpace,
    factory: ModelFactory,
}

impl ModelEntry {
    pub fn new(
        id: &str,
        display_name: &str,
        hyperparameters: &'static [&'static str],
        search_space: SearchSpace,
        factory: ModelFactory,
    ) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            hyperparameters,
            search_space,
            factory,
        }
    }

    /// Fresh, unfitted estimator for `params`.
    pub fn build(&self, params: &Params, seed: u64) -> Result<Box<dyn Classifier>, MlError> {
        (self.factory)(params, seed).map_err(|e| e.with_model(&self.id))
    }
}

/// Ordered collection of model entries. Order is significant: it drives tuning
/// order and breaks ties in model selection.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    entries: Vec<ModelEntry>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logistic regression, SVM and random forest with the reference search spaces.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(ModelEntry::new(
            logistic::ID,
            "Logistic Regression",
            &["C"],
            SearchSpace::new().with("C", floats(&[0.01, 0.1, 1.0, 10.0])),
            build_logistic,
        ));
        registry.register(ModelEntry::new(
            svm::ID,
            "SVM",
            &["C", "kernel"],
            SearchSpace::new()
                .with("C", floats(&[0.1, 1.0, 10.0]))
                .with("kernel", vec!["linear".into(), "rbf".into()]),
            build_svm,
        ));
        registry.register(ModelEntry::new(
            forest::ID,
            "Random Forest",
            &["n_estimators", "max_depth"],
            SearchSpace::new()
                .with("n_estimators", vec![50i64.into(), 100i64.into(), 200i64.into()])
                .with("max_depth", vec![ParamValue::Null, 10i64.into(), 20i64.into()]),
            build_forest,
        ));
        registry
    }

    /// Append an entry; a later entry with the same id replaces the earlier one in place.
    pub fn register(&mut self, entry: ModelEntry) {
        match self.entries.iter_mut().find(|e| e.id == entry.id) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn get(&self, id: &str) -> Option<&ModelEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn entries(&self) -> &[ModelEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply search-space overrides, then restrict and reorder to `enabled`.
    pub fn with_config(mut self, config: &ModelsConfig) -> Result<Self, MlError> {
        for (id, space) in &config.search_spaces {
            let entry = self
                .entries
                .iter_mut()
                .find(|e| &e.id == id)
                .ok_or_else(|| {
                    MlError::config(format!("models.search_spaces.{id}"), "unknown model id")
                })?;
            space.validate(id, entry.hyperparameters)?;
            entry.search_space = space.clone();
        }

        if let Some(enabled) = &config.enabled {
            let mut selected = Vec::with_capacity(enabled.len());
            for id in enabled {
                if selected.iter().any(|e: &ModelEntry| &e.id == id) {
                    return Err(MlError::config(
                        "models.enabled",
                        format!("model '{id}' listed twice"),
                    ));
                }
                let entry = self.get(id).cloned().ok_or_else(|| {
                    MlError::config("models.enabled", format!("unknown model id '{id}'"))
                })?;
                selected.push(entry);
            }
            self.entries = selected;
        }

        if self.entries.is_empty() {
            return Err(MlError::config("models.enabled", "no models to tune"));
        }
        Ok(self)
    }
}

fn floats(values: &[f64]) -> Vec<ParamValue> {
    values.iter().copied().map(ParamValue::Float).collect()
}

fn positive_float(params: &Params, name: &str, default: f64) -> Result<f64, MlError> {
    match params.get(name) {
        None => Ok(default),
        Some(value) => value
            .as_f64()
            .ok_or_else(|| MlError::fit("", format!("{name} must be numeric, got {value}"))),
    }
}

fn build_logistic(params: &Params, _seed: u64) -> Result<Box<dyn Classifier>, MlError> {
    let c = positive_float(params, "C", 1.0)?;
    Ok(Box::new(LogisticRegression::new(c)?))
}

fn build_svm(params: &Params, seed: u64) -> Result<Box<dyn Classifier>, MlError> {
    let c = positive_float(params, "C", 1.0)?;
    let kernel = match params.get("kernel") {
        None => SvmKernel::Rbf,
        Some(value) => value.as_str().and_then(SvmKernel::parse).ok_or_else(|| {
            MlError::fit("", format!("kernel must be 'linear' or 'rbf', got {value}"))
        })?,
    };
    Ok(Box::new(SvmClassifier::new(c, kernel, seed)?))
}

fn build_forest(params: &Params, seed: u64) -> Result<Box<dyn Classifier>, MlError> {
    let n_estimators = match params.get("n_estimators") {
        None => 100,
        Some(value) => value.as_usize().ok_or_else(|| {
            MlError::fit("", format!("n_estimators must be a positive integer, got {value}"))
        })?,
    };
    let max_depth = match params.get("max_depth") {
        None => None,
        Some(value) if value.is_none() => None,
        Some(value) => Some(value.as_usize().ok_or_else(|| {
            MlError::fit("", format!("max_depth must be a positive integer or none, got {value}"))
        })?),
    };
    Ok(Box::new(RandomForest::new(n_estimators, max_depth, seed)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_standard_registry_order() {
        let registry = ModelRegistry::standard();
        let ids: Vec<&str> = registry.entries().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["logistic_regression", "svm", "random_forest"]);
        assert_eq!(registry.get("svm").unwrap().search_space.size(), 6);
        assert_eq!(registry.get("random_forest").unwrap().search_space.size(), 9);
    }

    #[test]
    fn test_every_standard_grid_point_builds() {
        for entry in ModelRegistry::standard().entries() {
            for params in entry.search_space.grid() {
                let model = entry.build(&params, 42).unwrap();
                assert_eq!(model.id(), entry.id);
            }
        }
    }

    #[test]
    fn test_invalid_params_are_fit_errors_with_model_id() {
        let registry = ModelRegistry::standard();
        let mut params = Params::default();
        params.insert("kernel", "poly");
        let err = registry.get("svm").unwrap().build(&params, 0).unwrap_err();
        assert!(matches!(err, MlError::Fit { ref model, .. } if model == "svm"));

        let mut params = Params::default();
        params.insert("C", -1.0);
        assert!(registry.get("logistic_regression").unwrap().build(&params, 0).is_err());

        let mut params = Params::default();
        params.insert("max_depth", "none");
        assert!(registry.get("random_forest").unwrap().build(&params, 0).is_ok());
    }

    #[test]
    fn test_enabled_restricts_and_reorders() {
        let config = ModelsConfig {
            enabled: Some(vec!["random_forest".into(), "logistic_regression".into()]),
            search_spaces: BTreeMap::new(),
        };
        let registry = ModelRegistry::standard().with_config(&config).unwrap();
        let ids: Vec<&str> = registry.entries().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["random_forest", "logistic_regression"]);
    }

    #[test]
    fn test_unknown_and_duplicate_ids_rejected() {
        let config = ModelsConfig {
            enabled: Some(vec!["knn".into()]),
            search_spaces: BTreeMap::new(),
        };
        assert!(ModelRegistry::standard().with_config(&config).is_err());

        let config = ModelsConfig {
            enabled: Some(vec!["svm".into(), "svm".into()]),
            search_spaces: BTreeMap::new(),
        };
        assert!(ModelRegistry::standard().with_config(&config).is_err());
    }

    #[test]
    fn test_search_space_override() {
        let mut spaces = BTreeMap::new();
        spaces.insert(
            "logistic_regression".to_string(),
            SearchSpace::new().with("C", vec![0.5.into()]),
        );
        let config = ModelsConfig {
            enabled: None,
            search_spaces: spaces,
        };
        let registry = ModelRegistry::standard().with_config(&config).unwrap();
        assert_eq!(registry.get("logistic_regression").unwrap().search_space.size(), 1);

        let mut spaces = BTreeMap::new();
        spaces.insert(
            "svm".to_string(),
            SearchSpace::new().with("degree", vec![3i64.into()]),
        );
        let config = ModelsConfig {
            enabled: None,
            search_spaces: spaces,
        };
        let err = ModelRegistry::standard().with_config(&config).unwrap_err();
        assert!(matches!(err, MlError::Config { .. }));
    }
}
