//! Classifier seam and model handle
//!
//! The trained model is opaque to the rest of the crate: it takes one
//! [`FeatureVector`] and returns one class index. [`ModelHandle`] records
//! the outcome of the one-time startup load so an unavailable model is an
//! explicit state rather than a missing global.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

use super::forest::RandomForest;
use crate::error::PredictError;
use crate::features::FeatureVector;

/// Trained strength classifier.
///
/// Implementations must be read-only after construction; `predict` is called
/// concurrently from every request handler.
pub trait Classifier: Send + Sync {
    /// Predict a class index for one vector
    fn predict(&self, vector: &FeatureVector) -> usize;

    /// Short description for logs
    fn describe(&self) -> String {
        "classifier".to_string()
    }
}

/// Result of loading the classifier at startup
#[derive(Clone)]
pub enum ModelHandle {
    /// Loaded and ready for inference
    Ready(Arc<dyn Classifier>),
    /// Load failed; stays unavailable until restart
    Unavailable { reason: String },
}

impl ModelHandle {
    /// Wrap a loaded classifier
    pub fn ready(classifier: impl Classifier + 'static) -> Self {
        ModelHandle::Ready(Arc::new(classifier))
    }

    /// Record a failed load
    pub fn unavailable(reason: impl Into<String>) -> Self {
        ModelHandle::Unavailable {
            reason: reason.into(),
        }
    }

    /// Load a forest artifact from disk.
    ///
    /// Load failures are logged and yield [`ModelHandle::Unavailable`]; the
    /// service keeps running and refuses predictions.
    pub fn load(path: &Path) -> Self {
        match RandomForest::load(path) {
            Ok(forest) => {
                info!(
                    model = ?path,
                    trees = forest.tree_count(),
                    classes = forest.classes().len(),
                    "Model loaded"
                );
                Self::ready(forest)
            }
            Err(e) => {
                error!(model = ?path, error = %e, "Failed to load model, predictions disabled");
                Self::unavailable(e.to_string())
            }
        }
    }

    /// Whether predictions can be served
    pub fn is_ready(&self) -> bool {
        matches!(self, ModelHandle::Ready(_))
    }

    /// Classifier, or [`PredictError::ModelUnavailable`]
    pub fn classifier(&self) -> Result<&dyn Classifier, PredictError> {
        match self {
            ModelHandle::Ready(classifier) => Ok(classifier.as_ref()),
            ModelHandle::Unavailable { .. } => Err(PredictError::ModelUnavailable),
        }
    }

    /// Load failure reason, if any
    pub fn unavailable_reason(&self) -> Option<&str> {
        match self {
            ModelHandle::Ready(_) => None,
            ModelHandle::Unavailable { reason } => Some(reason),
        }
    }
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelHandle::Ready(classifier) => {
                f.debug_tuple("Ready").field(&classifier.describe()).finish()
            }
            ModelHandle::Unavailable { reason } => f
                .debug_struct("Unavailable")
                .field("reason", reason)
                .finish(),
        }
    }
}
