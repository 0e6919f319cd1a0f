//! Error types

use std::path::PathBuf;

/// Failure to load the classifier artifact
#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    #[error("failed to read model artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse model artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid model artifact: {0}")]
    Invalid(String),
}

/// Failure on the predict path
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PredictError {
    /// The artifact failed to load at startup
    #[error("Model not loaded.")]
    ModelUnavailable,

    /// The classifier produced an index with no label
    #[error("classifier returned invalid class index {0}")]
    InvalidClassifierOutput(usize),
}
