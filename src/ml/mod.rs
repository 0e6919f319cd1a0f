//! Strength Classifier
//!
//! The pre-trained model that maps a feature vector to a strength class.
//!
//! # Modules
//!
//! - `classifier`: the `Classifier` trait and the startup `ModelHandle`
//! - `forest`: random forest inference over an exported JSON artifact

pub mod classifier;
pub mod forest;

pub use classifier::{Classifier, ModelHandle};
pub use forest::{ForestArtifact, Node, RandomForest, TreeArtifact};
