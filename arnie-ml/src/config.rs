//! Configuration for a model-selection run.
//!
//! Uses `figment` for layered configuration: defaults -> user config -> workspace
//! config -> explicit file -> environment. Every field has a default, so a run with
//! no configuration at all reproduces the reference notebook settings.

use crate::error::MlError;
use crate::training::sweep::SearchSpace;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Top-level configuration for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunConfig {
    /// Input dataset settings.
    #[serde(default)]
    pub data: DataConfig,
    /// Train/holdout split settings.
    #[serde(default)]
    pub split: SplitConfig,
    /// Cross-validated grid search settings.
    #[serde(default)]
    pub tuning: TuningConfig,
    /// Registry restrictions and search-space overrides.
    #[serde(default)]
    pub models: ModelsConfig,
    /// Output settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// Input dataset configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Path to the delimited feature table.
    #[serde(default = "default_data_path")]
    pub path: PathBuf,
    /// Name of the binary label column.
    #[serde(default = "default_label_column")]
    pub label_column: String,
    /// Field delimiter.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: default_data_path(),
            label_column: default_label_column(),
            delimiter: default_delimiter(),
        }
    }
}

fn default_data_path() -> PathBuf {
    PathBuf::from("arnie_pca.csv")
}

fn default_label_column() -> String {
    "label".to_string()
}

fn default_delimiter() -> char {
    ','
}

/// Train/holdout split configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Fraction of rows held out for the final evaluation, in (0, 1).
    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64,
    /// Seed for the split permutation.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Preserve label proportions in both partitions.
    #[serde(default = "default_true")]
    pub stratify: bool,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_fraction: default_test_fraction(),
            seed: default_seed(),
            stratify: true,
        }
    }
}

fn default_test_fraction() -> f64 {
    0.2
}

/// How the model evaluated on the holdout set is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Highest mean cross-validated accuracy; ties go to the earlier registry entry.
    #[default]
    BestScore,
    /// Always the first registry entry, whatever it scored.
    FirstEntry,
}

/// Cross-validated grid search configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TuningConfig {
    /// Number of cross-validation folds.
    #[serde(default = "default_folds")]
    pub n_folds: usize,
    /// Shuffle rows before assigning folds.
    #[serde(default = "default_true")]
    pub shuffle: bool,
    /// Preserve label proportions in each fold.
    #[serde(default)]
    pub stratified: bool,
    /// Seed for fold assignment and estimator randomness.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Evaluate grid points on the rayon thread pool.
    #[serde(default = "default_true")]
    pub parallel: bool,
    /// Model selection policy.
    #[serde(default)]
    pub selection: SelectionPolicy,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            n_folds: default_folds(),
            shuffle: true,
            stratified: false,
            seed: default_seed(),
            parallel: true,
            selection: SelectionPolicy::BestScore,
        }
    }
}

fn default_folds() -> usize {
    5
}

fn default_seed() -> u64 {
    42
}

/// Registry restrictions and overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Model ids to run, in order. `None` runs the whole registry.
    #[serde(default)]
    pub enabled: Option<Vec<String>>,
    /// Replacement search spaces keyed by model id.
    #[serde(default)]
    pub search_spaces: BTreeMap<String, SearchSpace>,
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Tick labels for class 0 and class 1.
    #[serde(default = "default_class_names")]
    pub class_names: [String; 2],
    /// Where the confusion-matrix heatmap is written.
    #[serde(default = "default_heatmap_path")]
    pub heatmap_path: PathBuf,
    /// Optional JSON run summary.
    #[serde(default)]
    pub summary_path: Option<PathBuf>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            class_names: default_class_names(),
            heatmap_path: default_heatmap_path(),
            summary_path: None,
        }
    }
}

fn default_class_names() -> [String; 2] {
    ["Non-Arnie".to_string(), "Arnie".to_string()]
}

fn default_heatmap_path() -> PathBuf {
    PathBuf::from("confusion_matrix.svg")
}

fn default_true() -> bool {
    true
}

impl RunConfig {
    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), MlError> {
        let fraction = self.split.test_fraction;
        if !(fraction > 0.0 && fraction < 1.0) {
            return Err(MlError::config(
                "split.test_fraction",
                format!("must be in (0, 1), got {fraction}"),
            ));
        }
        if self.tuning.n_folds < 2 {
            return Err(MlError::config(
                "tuning.n_folds",
                format!("must be at least 2, got {}", self.tuning.n_folds),
            ));
        }
        if self.data.label_column.trim().is_empty() {
            return Err(MlError::config("data.label_column", "must not be empty"));
        }
        if !self.data.delimiter.is_ascii() {
            return Err(MlError::config(
                "data.delimiter",
                format!("must be a single ASCII character, got '{}'", self.data.delimiter),
            ));
        }
        if let Some(enabled) = &self.models.enabled {
            if enabled.is_empty() {
                return Err(MlError::config("models.enabled", "must name at least one model"));
            }
        }
        Ok(())
    }
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Environment variables (prefixed with `ARNIE_`, `__` separates sections)
/// 2. Explicit config file
/// 3. Workspace-local config (`.arnie/config.toml`)
/// 4. User config (`~/.config/arnie/config.toml`)
/// 5. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    explicit: Option<&Path>,
) -> Result<RunConfig, Box<figment::Error>> {
    let mut figment = Figment::from(Serialized::defaults(RunConfig::default()));

    if let Some(config_dir) = directories::ProjectDirs::from("dev", "arnie", "arnie") {
        let user_config = config_dir.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(ws) = workspace {
        let ws_config = ws.join(".arnie").join("config.toml");
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    if let Some(path) = explicit {
        // Toml::file silently skips missing files; an explicit path must exist.
        figment = figment.merge(Toml::file_exact(path));
    }

    // ARNIE_SPLIT__SEED, ARNIE_TUNING__N_FOLDS, etc.
    figment = figment.merge(Env::prefixed("ARNIE_").split("__"));

    figment.extract().map_err(Box::new)
}
