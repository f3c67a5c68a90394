use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::domain::detection::NumericMatrix;
use crate::domain::error::{AppError, Result};
use crate::domain::model::Classifier;

/// Child index marking a leaf node
pub const TREE_LEAF: i64 = -1;

/// One exported decision tree as parallel node arrays.
///
/// Node 0 is the root. For an internal node `i`, samples with
/// `x[feature[i]] <= threshold[i]` continue at `children_left[i]`, all others
/// at `children_right[i]`. Leaves have both children set to [`TREE_LEAF`] and
/// predict `class[i]`. Children always sit after their parent, so a walk
/// from the root terminates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub class: Vec<usize>,
}

impl DecisionTree {
    pub fn node_count(&self) -> usize {
        self.children_left.len()
    }

    fn predict_one(&self, row: &[f32]) -> usize {
        let mut node = 0;
        loop {
            let left = self.children_left[node];
            if left == TREE_LEAF {
                return self.class[node];
            }
            let value = row[self.feature[node] as usize] as f64;
            node = if value <= self.threshold[node] {
                left as usize
            } else {
                self.children_right[node] as usize
            };
        }
    }

    fn check(&self, n_features: usize, n_classes: usize) -> Result<()> {
        let n_nodes = self.node_count();
        if n_nodes == 0 {
            return Err(AppError::ModelError("Tree has no nodes".to_string()));
        }
        if self.children_right.len() != n_nodes
            || self.feature.len() != n_nodes
            || self.threshold.len() != n_nodes
            || self.class.len() != n_nodes
        {
            return Err(AppError::ModelError(format!(
                "Tree arrays disagree on node count (expected {})",
                n_nodes
            )));
        }

        for node in 0..n_nodes {
            let (left, right) = (self.children_left[node], self.children_right[node]);

            if left == TREE_LEAF || right == TREE_LEAF {
                if left != right {
                    return Err(AppError::ModelError(format!(
                        "Node {} has only one child",
                        node
                    )));
                }
                if self.class[node] >= n_classes {
                    return Err(AppError::ModelError(format!(
                        "Leaf {} predicts class {} but the model declares {} classes",
                        node, self.class[node], n_classes
                    )));
                }
                continue;
            }

            for child in [left, right] {
                if child <= node as i64 || child >= n_nodes as i64 {
                    return Err(AppError::ModelError(format!(
                        "Node {} points to invalid child {}",
                        node, child
                    )));
                }
            }

            let feature = self.feature[node];
            if feature < 0 || feature >= n_features as i64 {
                return Err(AppError::ModelError(format!(
                    "Node {} splits on feature {} but the model declares {} features",
                    node, feature, n_features
                )));
            }
        }
        Ok(())
    }

    /// Root split with two leaves
    #[cfg(test)]
    pub(crate) fn stump(feature: usize, threshold: f64, left: usize, right: usize) -> Self {
        Self {
            children_left: vec![1, TREE_LEAF, TREE_LEAF],
            children_right: vec![2, TREE_LEAF, TREE_LEAF],
            feature: vec![feature as i64, -2, -2],
            threshold: vec![threshold, -2.0, -2.0],
            class: vec![0, left, right],
        }
    }
}

/// Decision-forest classifier exported to JSON.
///
/// Each tree votes for one class; the class with the most votes wins and
/// ties go to the lowest class id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestClassifier {
    pub n_features: usize,
    pub n_classes: usize,
    pub trees: Vec<DecisionTree>,
}

impl ForestClassifier {
    pub fn new(n_features: usize, n_classes: usize, trees: Vec<DecisionTree>) -> Result<Self> {
        let forest = Self {
            n_features,
            n_classes,
            trees,
        };
        forest.validate()?;
        Ok(forest)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::IoError(format!("Failed to read model {}: {}", path.display(), e))
        })?;
        let forest: Self = serde_json::from_str(&content).map_err(|e| {
            AppError::ModelError(format!("Failed to parse model {}: {}", path.display(), e))
        })?;
        forest.validate()?;
        Ok(forest)
    }

    fn validate(&self) -> Result<()> {
        if self.trees.is_empty() {
            return Err(AppError::ModelError("Model contains no trees".to_string()));
        }
        if self.n_classes == 0 {
            return Err(AppError::ModelError(
                "Model declares zero classes".to_string(),
            ));
        }
        for (idx, tree) in self.trees.iter().enumerate() {
            tree.check(self.n_features, self.n_classes).map_err(|e| {
                AppError::ModelError(format!("Tree {}: {}", idx, e))
            })?;
        }
        Ok(())
    }

    fn predict_row(&self, row: &[f32], votes: &mut [u32]) -> usize {
        votes.iter_mut().for_each(|v| *v = 0);
        for tree in &self.trees {
            votes[tree.predict_one(row)] += 1;
        }

        let mut best = 0;
        for (class, &count) in votes.iter().enumerate().skip(1) {
            if count > votes[best] {
                best = class;
            }
        }
        best
    }
}

impl Classifier for ForestClassifier {
    fn predict(&self, features: &NumericMatrix) -> Result<Vec<usize>> {
        if features.n_cols() != self.n_features {
            return Err(AppError::ModelError(format!(
                "Model expects {} features, got {}",
                self.n_features,
                features.n_cols()
            )));
        }

        let mut votes = vec![0u32; self.n_classes];
        Ok(features
            .rows()
            .map(|row| self.predict_row(row, &mut votes))
            .collect())
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.n_features)
    }
}
