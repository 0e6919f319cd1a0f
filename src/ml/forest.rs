//! Random Forest Classifier
//!
//! Inference over a decision-tree ensemble exported from the training
//! pipeline as JSON. The forest is immutable once loaded and holds no
//! per-inference state, so one instance is shared across all request
//! handlers without locking.
//!
//! # Artifact Format
//!
//! ```json
//! {
//!   "feature_names": ["length", "count_lower", "...", "is_common_pattern"],
//!   "classes": [0, 1, 2],
//!   "trees": [
//!     { "nodes": [
//!         { "feature": 6, "threshold": 40.5, "left": 1, "right": 2 },
//!         { "value": [12.0, 3.0, 0.0] },
//!         { "value": [0.0, 4.0, 20.0] }
//!     ] }
//!   ]
//! }
//! ```
//!
//! A sample goes to `left` when `x[feature] <= threshold`. Leaf `value`s are
//! per-class weights (sample counts or probabilities); each leaf is
//! normalized, distributions are averaged across trees and the class with
//! the highest mean probability wins. Ties go to the lowest position in
//! `classes`.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::classifier::Classifier;
use crate::error::ModelLoadError;
use crate::features::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};

/// One node of an exported decision tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: Vec<f64>,
    },
}

/// Exported decision tree; node 0 is the root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeArtifact {
    pub nodes: Vec<Node>,
}

/// Serialized forest as produced by the exporter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestArtifact {
    /// Feature order the forest was trained on
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
    /// Class index for each leaf weight position
    pub classes: Vec<usize>,
    pub trees: Vec<TreeArtifact>,
}

#[derive(Debug, Clone)]
enum CompiledNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Normalized class distribution
    Leaf(Box<[f64]>),
}

#[derive(Debug, Clone)]
struct CompiledTree {
    nodes: Vec<CompiledNode>,
}

impl CompiledTree {
    fn leaf_for(&self, input: &[f64; FEATURE_COUNT]) -> &[f64] {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                CompiledNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    // Trees are fit on single-precision inputs
                    let value = f64::from(input[*feature] as f32);
                    index = if value <= *threshold { *left } else { *right };
                }
                CompiledNode::Leaf(distribution) => return distribution,
            }
        }
    }
}

/// Random forest classifier
#[derive(Debug, Clone)]
pub struct RandomForest {
    classes: Vec<usize>,
    trees: Vec<CompiledTree>,
}

impl RandomForest {
    /// Load and validate an artifact from disk
    pub fn load(path: &Path) -> Result<Self, ModelLoadError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ModelLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    /// Parse and validate an artifact from JSON text
    pub fn from_json(raw: &str) -> Result<Self, ModelLoadError> {
        let artifact: ForestArtifact = serde_json::from_str(raw)?;
        Self::from_artifact(artifact)
    }

    /// Validate an artifact and compile it for inference
    pub fn from_artifact(artifact: ForestArtifact) -> Result<Self, ModelLoadError> {
        if let Some(names) = &artifact.feature_names {
            if names.iter().map(String::as_str).ne(FEATURE_NAMES.iter().copied()) {
                return Err(ModelLoadError::Invalid(format!(
                    "feature order {:?} does not match expected {:?}",
                    names, FEATURE_NAMES
                )));
            }
        }

        if artifact.classes.is_empty() {
            return Err(ModelLoadError::Invalid("no classes declared".to_string()));
        }
        if artifact.trees.is_empty() {
            return Err(ModelLoadError::Invalid("forest has no trees".to_string()));
        }

        let n_classes = artifact.classes.len();
        let trees = artifact
            .trees
            .into_iter()
            .enumerate()
            .map(|(tree_index, tree)| compile_tree(tree_index, tree, n_classes))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            classes: artifact.classes,
            trees,
        })
    }

    /// Number of trees in the ensemble
    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    /// Class indices the forest can emit
    pub fn classes(&self) -> &[usize] {
        &self.classes
    }

    /// Mean class distribution across trees, in `classes` order
    pub fn predict_proba(&self, vector: &FeatureVector) -> Vec<f64> {
        let input = vector.to_array();
        let mut mean = vec![0.0; self.classes.len()];

        for tree in &self.trees {
            for (acc, p) in mean.iter_mut().zip(tree.leaf_for(&input)) {
                *acc += p;
            }
        }

        let n_trees = self.trees.len() as f64;
        for p in &mut mean {
            *p /= n_trees;
        }
        mean
    }
}

impl Classifier for RandomForest {
    fn predict(&self, vector: &FeatureVector) -> usize {
        let proba = self.predict_proba(vector);
        let mut best = 0;
        for (i, p) in proba.iter().enumerate().skip(1) {
            if *p > proba[best] {
                best = i;
            }
        }
        self.classes[best]
    }

    fn describe(&self) -> String {
        format!(
            "random-forest(trees={}, classes={})",
            self.trees.len(),
            self.classes.len()
        )
    }
}

fn compile_tree(
    tree_index: usize,
    tree: TreeArtifact,
    n_classes: usize,
) -> Result<CompiledTree, ModelLoadError> {
    let invalid = |node: usize, reason: String| {
        ModelLoadError::Invalid(format!("tree {} node {}: {}", tree_index, node, reason))
    };

    if tree.nodes.is_empty() {
        return Err(ModelLoadError::Invalid(format!(
            "tree {} has no nodes",
            tree_index
        )));
    }

    let n_nodes = tree.nodes.len();
    let mut nodes = Vec::with_capacity(n_nodes);

    for (index, node) in tree.nodes.into_iter().enumerate() {
        let compiled = match node {
            Node::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if feature >= FEATURE_COUNT {
                    return Err(invalid(index, format!("feature index {} out of range", feature)));
                }
                if !threshold.is_finite() {
                    return Err(invalid(index, "threshold is not finite".to_string()));
                }
                // Children must point forward so every walk terminates
                for child in [left, right] {
                    if child <= index || child >= n_nodes {
                        return Err(invalid(index, format!("child index {} is invalid", child)));
                    }
                }
                CompiledNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }
            }
            Node::Leaf { value } => {
                if value.len() != n_classes {
                    return Err(invalid(
                        index,
                        format!("leaf has {} weights, expected {}", value.len(), n_classes),
                    ));
                }
                if value.iter().any(|w| !w.is_finite() || *w < 0.0) {
                    return Err(invalid(index, "leaf weights must be finite and non-negative".to_string()));
                }
                let total: f64 = value.iter().sum();
                if total <= 0.0 {
                    return Err(invalid(index, "leaf weights sum to zero".to_string()));
                }
                CompiledNode::Leaf(value.iter().map(|w| w / total).collect())
            }
        };
        nodes.push(compiled);
    }

    Ok(CompiledTree { nodes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureExtractor;
    use std::io::Write;

    /// Three stumps on entropy (feature 6) and one on the pattern flag
    fn sample_json() -> String {
        serde_json::json!({
            "feature_names": FEATURE_NAMES,
            "classes": [0, 1, 2],
            "trees": [
                { "nodes": [
                    { "feature": 6, "threshold": 40.0, "left": 1, "right": 2 },
                    { "value": [10.0, 0.0, 0.0] },
                    { "feature": 6, "threshold": 70.0, "left": 3, "right": 4 },
                    { "value": [0.0, 8.0, 2.0] },
                    { "value": [0.0, 1.0, 9.0] }
                ] },
                { "nodes": [
                    { "feature": 7, "threshold": 0.5, "left": 1, "right": 2 },
                    { "value": [0.2, 0.4, 0.4] },
                    { "value": [1.0, 0.0, 0.0] }
                ] }
            ]
        })
        .to_string()
    }

    fn extract(password: &str) -> FeatureVector {
        FeatureExtractor::new().extract(password)
    }

    #[test]
    fn test_predict_by_entropy() {
        let forest = RandomForest::from_json(&sample_json()).unwrap();
        assert_eq!(forest.tree_count(), 2);

        // 'password': 8 * log2(26) ~ 37.6, common pattern
        assert_eq!(forest.predict(&extract("password")), 0);
        // 12 chars, 4 classes: ~78.7 bits, no pattern
        assert_eq!(forest.predict(&extract("Zebra!Lamp9x")), 2);
        // 10 chars two classes: 10 * log2(52) ~ 57.0 bits
        assert_eq!(forest.predict(&extract("ZebraLampx")), 1);
    }

    #[test]
    fn test_predict_proba_is_mean_of_normalized_leaves() {
        let forest = RandomForest::from_json(&sample_json()).unwrap();
        let proba = forest.predict_proba(&extract("ZebraLampx"));
        let expected = [(0.0 + 0.2) / 2.0, (0.8 + 0.4) / 2.0, (0.2 + 0.4) / 2.0];
        for (p, e) in proba.iter().zip(expected) {
            assert!((p - e).abs() < 1e-12);
        }
        assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let json = serde_json::json!({
            "classes": [0, 1],
            "trees": [{ "nodes": [
                { "feature": 0, "threshold": 4.0, "left": 1, "right": 2 },
                { "value": [1.0, 0.0] },
                { "value": [0.0, 1.0] }
            ] }]
        });
        let forest = RandomForest::from_json(&json.to_string()).unwrap();
        assert_eq!(forest.predict(&extract("abcd")), 0);
        assert_eq!(forest.predict(&extract("abcde")), 1);
    }

    #[test]
    fn test_ties_go_to_first_class() {
        let json = serde_json::json!({
            "classes": [0, 1, 2],
            "trees": [{ "nodes": [{ "value": [0.0, 5.0, 5.0] }] }]
        });
        let forest = RandomForest::from_json(&json.to_string()).unwrap();
        assert_eq!(forest.predict(&extract("x")), 1);
    }

    #[test]
    fn test_class_mapping() {
        let json = serde_json::json!({
            "classes": [2, 0],
            "trees": [{ "nodes": [{ "value": [3.0, 1.0] }] }]
        });
        let forest = RandomForest::from_json(&json.to_string()).unwrap();
        assert_eq!(forest.predict(&extract("x")), 2);
    }

    #[test]
    fn test_rejects_reordered_features() {
        let mut names: Vec<&str> = FEATURE_NAMES.to_vec();
        names.swap(0, 6);
        let json = serde_json::json!({
            "feature_names": names,
            "classes": [0],
            "trees": [{ "nodes": [{ "value": [1.0] }] }]
        });
        let err = RandomForest::from_json(&json.to_string()).unwrap_err();
        assert!(matches!(err, ModelLoadError::Invalid(_)));
    }

    #[test]
    fn test_rejects_bad_structure() {
        let cases = [
            // no trees
            serde_json::json!({ "classes": [0], "trees": [] }),
            // no classes
            serde_json::json!({ "classes": [], "trees": [{ "nodes": [{ "value": [] }] }] }),
            // feature out of range
            serde_json::json!({ "classes": [0], "trees": [{ "nodes": [
                { "feature": 8, "threshold": 1.0, "left": 1, "right": 2 },
                { "value": [1.0] }, { "value": [1.0] }
            ] }] }),
            // leaf arity
            serde_json::json!({ "classes": [0, 1], "trees": [{ "nodes": [{ "value": [1.0] }] }] }),
            // cycle back to root
            serde_json::json!({ "classes": [0], "trees": [{ "nodes": [
                { "feature": 0, "threshold": 1.0, "left": 0, "right": 1 },
                { "value": [1.0] }
            ] }] }),
            // child past the end
            serde_json::json!({ "classes": [0], "trees": [{ "nodes": [
                { "feature": 0, "threshold": 1.0, "left": 1, "right": 5 },
                { "value": [1.0] }
            ] }] }),
            // zero-weight leaf
            serde_json::json!({ "classes": [0, 1], "trees": [{ "nodes": [{ "value": [0.0, 0.0] }] }] }),
        ];

        for case in cases {
            let result = RandomForest::from_json(&case.to_string());
            assert!(
                matches!(result, Err(ModelLoadError::Invalid(_))),
                "should reject {}",
                case
            );
        }
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = RandomForest::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ModelLoadError::Parse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(sample_json().as_bytes()).unwrap();

        let forest = RandomForest::load(file.path()).unwrap();
        assert_eq!(forest.classes(), &[0, 1, 2]);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = RandomForest::load(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, ModelLoadError::Io { .. }));
    }
}
