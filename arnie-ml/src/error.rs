//! Error types for the arnie-ml crate.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Top-level error type for the model-selection workflow.
///
/// Every variant is fatal to a run; nothing is retried.
#[derive(Debug, Error)]
pub enum MlError {
    #[error("Failed to load dataset {}: {reason}", path.display())]
    Load { path: PathBuf, reason: String },

    #[error("Invalid configuration for '{param}': {reason}")]
    Config { param: String, reason: String },

    #[error("Model '{model}' failed to fit: {reason}")]
    Fit { model: String, reason: String },

    #[error("Report error: {0}")]
    Report(String),

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Template error: {0}")]
    Template(#[from] handlebars::RenderError),
}

impl MlError {
    pub fn load(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        Self::Load {
            path: path.as_ref().to_path_buf(),
            reason: reason.into(),
        }
    }

    pub fn config(param: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Config {
            param: param.into(),
            reason: reason.into(),
        }
    }

    pub fn fit(model: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Fit {
            model: model.into(),
            reason: reason.into(),
        }
    }

    pub fn report(msg: impl Into<String>) -> Self {
        Self::Report(msg.into())
    }

    /// Re-attribute a fit failure to a model id, keeping other kinds untouched.
    pub fn with_model(self, model: &str) -> Self {
        match self {
            Self::Fit { reason, .. } => Self::Fit {
                model: model.to_string(),
                reason,
            },
            other => other,
        }
    }
}
