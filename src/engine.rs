//! Strength Engine
//!
//! Runs the per-request pipeline: extract features, predict a class, map it
//! to a label. The engine is immutable and shared across handlers.

use tracing::{debug, error};

use crate::error::PredictError;
use crate::features::{FeatureExtractor, FeatureVector};
use crate::label::{self, StrengthResult};
use crate::ml::ModelHandle;

/// Outcome of evaluating one password
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    /// Empty input; nothing was computed
    EmptyInput,
    /// Classified password
    Classified {
        result: StrengthResult,
        features: FeatureVector,
    },
}

/// Password strength engine
#[derive(Debug, Clone)]
pub struct StrengthEngine {
    extractor: FeatureExtractor,
    model: ModelHandle,
}

impl StrengthEngine {
    /// Create an engine from an extractor and the startup model handle
    pub fn new(extractor: FeatureExtractor, model: ModelHandle) -> Self {
        Self { extractor, model }
    }

    /// Model handle
    pub fn model(&self) -> &ModelHandle {
        &self.model
    }

    /// Feature extractor
    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    /// Evaluate a password.
    ///
    /// An unavailable model is reported before the input is looked at.
    pub fn evaluate(&self, password: &str) -> Result<Evaluation, PredictError> {
        let classifier = self.model.classifier()?;

        if password.is_empty() {
            return Ok(Evaluation::EmptyInput);
        }

        let features = self.extractor.extract(password);
        let index = classifier.predict(&features);

        let result = label::to_result(index, &features).map_err(|e| {
            error!(index, classifier = %classifier.describe(), "Classifier returned an unknown class");
            e
        })?;

        debug!(
            length = features.length,
            char_classes = features.char_classes,
            entropy = features.shannon_entropy,
            common_pattern = features.is_common_pattern,
            label = result.label.as_str(),
            "Password classified"
        );

        Ok(Evaluation::Classified { result, features })
    }
}
