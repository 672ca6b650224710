//! Machine Learning Module
//!
//! Scoring of pre-trained regression models. Models are loaded once from a
//! file and are read-only afterwards; there is no training here.
//!
//! # Architecture
//! - [`Regressor`]: the scoring seam used by the forecast engine
//! - [`TreeEnsemble`]: gradient-boosted trees in the LightGBM text format

use serde::Serialize;
use thiserror::Error;

pub mod gbdt;
pub mod models;

pub use gbdt::TreeEnsemble;
pub use models::Regressor;

/// Errors raised while loading a model artifact
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read model artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed model artifact at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("unsupported model: {0}")]
    Unsupported(String),

    #[error("feature schema mismatch: expected {expected:?}, artifact has {found:?}")]
    FeatureMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
}

impl ModelError {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}

/// Model facts worth logging at start-up
#[derive(Debug, Clone, Serialize)]
pub struct ModelSummary {
    pub num_trees: usize,
    pub num_features: usize,
    pub objective: String,
    pub feature_names: Vec<String>,
}
