//! End-to-end orchestration: load, split, tune, select, evaluate.

use crate::config::RunConfig;
use crate::data::{CsvSource, DataSource, LoadedDataset, SampleTable, train_test_split};
use crate::error::MlError;
use crate::training::evaluator::{EvaluationReport, evaluate};
use crate::training::reproducibility::{RunManifest, table_fingerprint};
use crate::training::selection::select_best;
use crate::training::tuner::{CandidateResult, TuningEngine};
use crate::zoo::ModelRegistry;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Workflow stages, strictly in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStage {
    Load,
    Split,
    Tune,
    Select,
    Evaluate,
    Report,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Load => "load",
            Self::Split => "split",
            Self::Tune => "tune",
            Self::Select => "select",
            Self::Evaluate => "evaluate",
            Self::Report => "report",
        };
        f.write_str(name)
    }
}

/// Everything a finished run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
    pub manifest: RunManifest,
    pub train_rows: usize,
    pub test_rows: usize,
    /// One entry per registry model, in registry order.
    pub candidates: Vec<CandidateResult>,
    /// Index into `candidates` of the evaluated model.
    pub selected: usize,
    pub evaluation: EvaluationReport,
}

impl RunOutcome {
    pub fn selected_candidate(&self) -> &CandidateResult {
        &self.candidates[self.selected]
    }
}

/// Drives one run of the workflow against a fixed configuration and registry.
#[derive(Debug, Clone)]
pub struct ExperimentRunner {
    config: RunConfig,
    registry: ModelRegistry,
}

impl ExperimentRunner {
    /// Validate `config` and build the standard registry with its overrides applied.
    pub fn new(config: RunConfig) -> Result<Self, MlError> {
        config.validate()?;
        let registry = ModelRegistry::standard().with_config(&config.models)?;
        Ok(Self { config, registry })
    }

    pub fn with_registry(config: RunConfig, registry: ModelRegistry) -> Result<Self, MlError> {
        config.validate()?;
        if registry.is_empty() {
            return Err(MlError::config("models.enabled", "registry is empty"));
        }
        Ok(Self { config, registry })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Load the configured CSV and run the remaining stages on a blocking worker.
    pub async fn run(&self) -> Result<RunOutcome, MlError> {
        tracing::info!(
            stage = %RunStage::Load,
            path = %self.config.data.path.display(),
            "Stage started"
        );
        let source = CsvSource::new(&self.config.data.path, &self.config.data.label_column)
            .with_delimiter(self.config.data.delimiter);
        let loaded = source.load().await?;

        let runner = self.clone();
        tokio::task::spawn_blocking(move || runner.execute_loaded(loaded))
            .await
            .map_err(|e| MlError::Runtime(format!("workflow task failed: {e}")))?
    }

    /// Run every stage after loading on an already-parsed dataset.
    pub fn execute_loaded(&self, loaded: LoadedDataset) -> Result<RunOutcome, MlError> {
        self.execute_with_fingerprint(loaded.table, loaded.info.sha256)
    }

    /// Synchronous core for in-memory tables.
    pub fn execute(&self, table: SampleTable) -> Result<RunOutcome, MlError> {
        let fingerprint = table_fingerprint(&table);
        self.execute_with_fingerprint(table, fingerprint)
    }

    fn execute_with_fingerprint(
        &self,
        table: SampleTable,
        dataset_sha256: String,
    ) -> Result<RunOutcome, MlError> {
        let manifest = RunManifest::capture(&self.config, &table, dataset_sha256);
        let span = tracing::info_span!("run", run_id = %manifest.run_id);
        let _guard = span.enter();

        tracing::info!(stage = %RunStage::Split, rows = table.len(), "Stage started");
        let split = train_test_split(&table, &self.config.split)?;

        tracing::info!(stage = %RunStage::Tune, models = self.registry.len(), "Stage started");
        let engine = TuningEngine::from_config(&self.config.tuning);
        let candidates = engine.tune(&self.registry, &split.train)?;

        tracing::info!(stage = %RunStage::Select, "Stage started");
        let selected = select_best(&candidates, self.config.tuning.selection)?;
        let chosen = &candidates[selected];
        let entry = self.registry.get(&chosen.model_id).ok_or_else(|| {
            MlError::Runtime(format!("selected model '{}' is not registered", chosen.model_id))
        })?;

        tracing::info!(stage = %RunStage::Evaluate, model = %entry.id, "Stage started");
        let evaluation = evaluate(
            entry,
            &chosen.best_params,
            self.config.tuning.seed,
            &split.train,
            &split.test,
        )?;

        Ok(RunOutcome {
            manifest,
            train_rows: split.train.len(),
            test_rows: split.test.len(),
            candidates,
            selected,
            evaluation,
        })
    }
}
