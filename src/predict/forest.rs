//! Random-forest classifier loaded from a JSON export.
//!
//! Artifact layout:
//!
//! ```json
//! {
//!   "encoder": { "categorical": [...], "numeric": ["percentile", "rank"],
//!                "handle_unknown": "ignore" },
//!   "classes": ["College A", "College B"],
//!   "trees": [ { "nodes": [
//!       { "feature": 0, "threshold": 0.5, "left": 1, "right": 2 },
//!       { "value": [3.0, 1.0] },
//!       { "value": [0.0, 5.0] } ] } ]
//! }
//! ```
//!
//! Each tree starts at node 0 and goes left when `x[feature] <= threshold`.
//! Leaf values are class weights; the forest averages the normalised leaf
//! distributions and returns the most probable class.

use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use super::encoder::ColumnEncoder;
use super::{FeatureRow, ModelError, Predictor};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
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

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    fn validate(&self, width: usize, n_classes: usize) -> Result<(), ModelError> {
        if self.nodes.is_empty() {
            return Err(ModelError::Malformed("tree has no nodes".into()));
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    left,
                    right,
                    ..
                } => {
                    if *feature >= width {
                        return Err(ModelError::Malformed(format!(
                            "node {i}: feature {feature} out of range (width {width})"
                        )));
                    }
                    // Children must point forward so evaluation always terminates.
                    for child in [left, right] {
                        if *child <= i || *child >= self.nodes.len() {
                            return Err(ModelError::Malformed(format!(
                                "node {i}: child {child} out of range"
                            )));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    if value.len() != n_classes {
                        return Err(ModelError::Malformed(format!(
                            "node {i}: leaf has {} values, expected {n_classes}",
                            value.len()
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Class distribution of the leaf `x` lands in, normalised to sum to 1.
    fn leaf_distribution(&self, x: &[f64]) -> Vec<f64> {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if x[*feature] <= *threshold { *left } else { *right };
                }
                TreeNode::Leaf { value } => {
                    let total: f64 = value.iter().sum();
                    return if total > 0.0 {
                        value.iter().map(|v| v / total).collect()
                    } else {
                        value.clone()
                    };
                }
            }
        }
    }
}

/// Encoder plus tree ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestPredictor {
    pub encoder: ColumnEncoder,
    pub classes: Vec<String>,
    pub trees: Vec<DecisionTree>,
}

impl ForestPredictor {
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let model: ForestPredictor = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }

    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let text = std::fs::read_to_string(path)?;
        let model = Self::from_json(&text)?;
        info!(
            "loaded model {}: {} classes, {} trees, {} input columns",
            path.display(),
            model.classes.len(),
            model.trees.len(),
            model.encoder.width()
        );
        Ok(model)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        self.encoder.validate()?;
        if self.classes.is_empty() {
            return Err(ModelError::Malformed("no classes".into()));
        }
        if self.trees.is_empty() {
            return Err(ModelError::Malformed("no trees".into()));
        }
        let width = self.encoder.width();
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(width, self.classes.len())
                .map_err(|e| ModelError::Malformed(format!("tree {i}: {e}")))?;
        }
        Ok(())
    }

    /// Mean class probabilities over all trees.
    pub fn predict_proba(&self, row: &FeatureRow) -> Result<Vec<f64>, ModelError> {
        let x = self.encoder.encode(row)?;
        let mut proba = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            for (acc, p) in proba.iter_mut().zip(tree.leaf_distribution(&x)) {
                *acc += p;
            }
        }
        let n = self.trees.len() as f64;
        proba.iter_mut().for_each(|p| *p /= n);
        Ok(proba)
    }
}

impl Predictor for ForestPredictor {
    fn predict(&self, rows: &[FeatureRow]) -> Result<Vec<String>, ModelError> {
        rows.iter()
            .map(|row| {
                let proba = self.predict_proba(row)?;
                // First class wins ties.
                let best = proba
                    .iter()
                    .enumerate()
                    .fold(None::<(usize, f64)>, |best, (i, &p)| match best {
                        Some((_, bp)) if bp >= p => best,
                        _ => Some((i, p)),
                    })
                    .map(|(i, _)| i)
                    .ok_or(ModelError::EmptyOutput)?;
                Ok(self.classes[best].clone())
            })
            .collect()
    }
}
