//! Zentinel Password Strength Library
//!
//! Classifies passwords as Weak, Medium or Strong by extracting a fixed set
//! of numeric features and feeding them to a pre-trained random forest.
//!
//! # Pipeline
//!
//! 1. [`FeatureExtractor`] turns the raw password into a [`FeatureVector`]
//!    (character class counts, alphabet-size entropy, weak pattern flag)
//! 2. A [`Classifier`] predicts a class index from the vector
//! 3. [`label::to_result`] maps the index to a [`StrengthLabel`]
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use zentinel_password_strength::{FeatureExtractor, ModelHandle, StrengthEngine};
//!
//! let model = ModelHandle::load(Path::new("model/model.json"));
//! let engine = StrengthEngine::new(FeatureExtractor::new(), model);
//! let evaluation = engine.evaluate("correct horse battery staple")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod features;
pub mod label;
pub mod metrics;
pub mod ml;
pub mod patterns;
pub mod server;

// Re-exports for convenience
pub use config::{ServiceConfig, ServiceConfigJson};
pub use engine::{Evaluation, StrengthEngine};
pub use error::{ModelLoadError, PredictError};
pub use features::{FeatureExtractor, FeatureVector, FEATURE_NAMES};
pub use label::{StrengthLabel, StrengthResult};
pub use metrics::{MetricsConfig, StrengthMetrics};
pub use ml::{Classifier, ModelHandle, RandomForest};
pub use patterns::PatternDictionary;
pub use server::AppState;
