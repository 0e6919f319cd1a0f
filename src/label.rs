//! Strength labels and result mapping

use crate::error::PredictError;
use crate::features::FeatureVector;

/// Predicted strength category, ordered by class index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StrengthLabel {
    Weak,
    Medium,
    Strong,
}

impl StrengthLabel {
    /// All labels in class-index order
    pub const ALL: [StrengthLabel; 3] = [
        StrengthLabel::Weak,
        StrengthLabel::Medium,
        StrengthLabel::Strong,
    ];

    /// Class index used by the classifier
    pub fn index(&self) -> usize {
        match self {
            StrengthLabel::Weak => 0,
            StrengthLabel::Medium => 1,
            StrengthLabel::Strong => 2,
        }
    }

    /// Label for a class index, if one exists
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Display string returned to clients
    pub fn display(&self) -> &'static str {
        match self {
            StrengthLabel::Weak => "Weak (Faible) 🔴",
            StrengthLabel::Medium => "Medium (Moyen) 🟡",
            StrengthLabel::Strong => "Strong (Fort) 🟢",
        }
    }

    /// Short lowercase name for logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            StrengthLabel::Weak => "weak",
            StrengthLabel::Medium => "medium",
            StrengthLabel::Strong => "strong",
        }
    }
}

impl TryFrom<usize> for StrengthLabel {
    type Error = PredictError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        Self::from_index(index).ok_or(PredictError::InvalidClassifierOutput(index))
    }
}

impl std::fmt::Display for StrengthLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// Classification result echoed to the client
#[derive(Debug, Clone, PartialEq)]
pub struct StrengthResult {
    pub label: StrengthLabel,
    /// Entropy estimate formatted to two decimals
    pub entropy: String,
    /// Number of character classes present
    pub classes: usize,
}

/// Map a class index and its input vector to a result
pub fn to_result(index: usize, vector: &FeatureVector) -> Result<StrengthResult, PredictError> {
    let label = StrengthLabel::try_from(index)?;
    Ok(StrengthResult {
        label,
        entropy: vector.entropy_display(),
        classes: vector.char_classes,
    })
}
