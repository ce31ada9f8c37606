//! Decision-forest classifier artifact.
//!
//! The classifier is stored as explicit tree structures rather than an
//! opaque model blob, so loading can verify version and shape before any
//! prediction runs.

use crate::error::PredictionError;
use serde::{Deserialize, Serialize};

/// Supported `classifier.json` format revision.
pub const CLASSIFIER_FORMAT_VERSION: u32 = 1;

/// One node of a fitted decision tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    /// Branch on `feature <= threshold`: true goes left, false goes right.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Terminal class weights, aligned with the classifier's `classes`.
    /// Weights may be fractions or raw per-class sample counts.
    Leaf { distribution: Vec<f64> },
}

/// A single fitted tree. Nodes live in a flat arena indexed by position,
/// with node 0 as the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Walk the tree for one feature vector and return the leaf weights.
    fn leaf_distribution(&self, features: &[f64]) -> Result<&[f64], PredictionError> {
        let mut index = 0;
        // A valid tree reaches a leaf within nodes.len() hops; anything
        // longer is a cycle.
        for _ in 0..=self.nodes.len() {
            match self.nodes.get(index) {
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = features.get(*feature).copied().ok_or_else(|| {
                        PredictionError::Classifier(format!(
                            "split references feature {} outside the input vector",
                            feature
                        ))
                    })?;
                    index = if value <= *threshold { *left } else { *right };
                }
                Some(TreeNode::Leaf { distribution }) => return Ok(distribution),
                None => {
                    return Err(PredictionError::Classifier(format!(
                        "tree walk reached missing node {}",
                        index
                    )))
                }
            }
        }

        Err(PredictionError::Classifier(
            "tree walk did not terminate".to_string(),
        ))
    }
}

/// Trained decision-forest classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classifier {
    pub format_version: u32,
    /// Class labels in training order: `[0, 1]` for the binary forest,
    /// `[-1, 1]` for the one-class variant.
    pub classes: Vec<i64>,
    /// Width of the feature vectors the forest was fitted on.
    pub n_features: usize,
    pub trees: Vec<DecisionTree>,
    /// Train-time global importances, one weight per feature.
    #[serde(default)]
    pub feature_importances: Option<Vec<f64>>,
}

impl Classifier {
    /// Whether class scores can be read as probabilities. Only the binary
    /// layout `[0, 1]` qualifies; one-class forests vote labels only.
    pub fn is_probabilistic(&self) -> bool {
        self.classes == [0, 1]
    }

    /// One-class convention: labels are -1 (anomaly) and +1 (normal).
    pub fn is_one_class(&self) -> bool {
        self.classes == [-1, 1]
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    /// Mean leaf distribution across all trees, one score per class.
    ///
    /// Each leaf is normalized by its total weight before averaging, so
    /// forests whose leaves carry raw sample counts score the same as
    /// forests exported with fractions, and the result always sums to one.
    pub fn class_scores(&self, features: &[f64]) -> Result<Vec<f64>, PredictionError> {
        if features.len() != self.n_features {
            return Err(PredictionError::Classifier(format!(
                "expected {} features, got {}",
                self.n_features,
                features.len()
            )));
        }
        if self.trees.is_empty() {
            return Err(PredictionError::Classifier(
                "classifier has no trees".to_string(),
            ));
        }

        let mut scores = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            let distribution = tree.leaf_distribution(features)?;
            let total: f64 = distribution.iter().sum();
            if total <= 0.0 {
                return Err(PredictionError::Classifier(
                    "tree walk reached a leaf with zero total weight".to_string(),
                ));
            }
            for (score, weight) in scores.iter_mut().zip(distribution) {
                *score += weight / total;
            }
        }

        let tree_count = self.trees.len() as f64;
        for score in &mut scores {
            *score /= tree_count;
        }
        Ok(scores)
    }

    /// Class label at the highest score; the earliest class wins ties.
    ///
    /// `scores` must come from [`Classifier::class_scores`], which keeps it
    /// aligned with `classes`.
    pub fn class_for_scores(&self, scores: &[f64]) -> i64 {
        let mut best = 0;
        for (index, score) in scores.iter().enumerate().skip(1) {
            if *score > scores[best] {
                best = index;
            }
        }
        self.classes[best]
    }

    /// Whether a raw class label means anomaly under either convention.
    pub fn is_anomaly(&self, raw_class: i64) -> bool {
        if self.is_one_class() {
            raw_class == -1
        } else {
            raw_class == 1
        }
    }

    pub fn global_feature_importance(&self) -> Option<&[f64]> {
        self.feature_importances.as_deref()
    }

    /// Structural soundness check, run once at load time.
    pub(crate) fn validate(&self, expected_features: usize) -> Result<(), String> {
        if self.format_version != CLASSIFIER_FORMAT_VERSION {
            return Err(format!(
                "unsupported format_version {} (expected {})",
                self.format_version, CLASSIFIER_FORMAT_VERSION
            ));
        }
        if self.n_features != expected_features {
            return Err(format!(
                "classifier fitted on {} features, schema has {}",
                self.n_features, expected_features
            ));
        }
        if self.classes.len() < 2 {
            return Err("classifier must carry at least two classes".to_string());
        }
        if self.trees.is_empty() {
            return Err("classifier has no trees".to_string());
        }

        for (tree_index, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(format!("tree {} has no nodes", tree_index));
            }
            for (node_index, node) in tree.nodes.iter().enumerate() {
                match node {
                    TreeNode::Split {
                        feature,
                        threshold,
                        left,
                        right,
                    } => {
                        if *feature >= self.n_features {
                            return Err(format!(
                                "tree {} node {} splits on feature {} out of range",
                                tree_index, node_index, feature
                            ));
                        }
                        if !threshold.is_finite() {
                            return Err(format!(
                                "tree {} node {} has a non-finite threshold",
                                tree_index, node_index
                            ));
                        }
                        if *left >= tree.nodes.len() || *right >= tree.nodes.len() {
                            return Err(format!(
                                "tree {} node {} references a missing child",
                                tree_index, node_index
                            ));
                        }
                    }
                    TreeNode::Leaf { distribution } => {
                        if distribution.len() != self.classes.len() {
                            return Err(format!(
                                "tree {} node {} leaf has {} weights for {} classes",
                                tree_index,
                                node_index,
                                distribution.len(),
                                self.classes.len()
                            ));
                        }
                        if distribution.iter().any(|w| !w.is_finite() || *w < 0.0) {
                            return Err(format!(
                                "tree {} node {} leaf has invalid weights",
                                tree_index, node_index
                            ));
                        }
                        if distribution.iter().sum::<f64>() <= 0.0 {
                            return Err(format!(
                                "tree {} node {} leaf has zero total weight",
                                tree_index, node_index
                            ));
                        }
                    }
                }
            }
        }

        if let Some(importances) = &self.feature_importances {
            if importances.len() != self.n_features {
                return Err(format!(
                    "feature_importances has {} entries for {} features",
                    importances.len(),
                    self.n_features
                ));
            }
            if importances.iter().any(|w| !w.is_finite()) {
                return Err("feature_importances contains non-finite weights".to_string());
            }
        }

        Ok(())
    }
}
