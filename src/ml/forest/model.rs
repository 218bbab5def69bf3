use serde::{Deserialize, Serialize};

/// Current serialized model format.
pub const FOREST_MODEL_VERSION: i64 = 1;

/// Node of a fitted decision tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    /// Internal node: rows with `feature <= threshold` go left.
    Split {
        feature: u16,
        threshold: f64,
        left: u32,
        right: u32,
    },
    /// Terminal node holding class frequencies of its training rows.
    Leaf { proba: Vec<f64> },
}

/// Binary decision tree stored as a flat node arena rooted at index 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<Node>,
}

impl DecisionTree {
    /// Class frequencies of the leaf reached by `features`.
    pub fn predict_proba(&self, features: &[f64]) -> &[f64] {
        let mut idx = 0usize;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { proba } => return proba,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = features[*feature as usize];
                    idx = if value <= *threshold {
                        *left as usize
                    } else {
                        *right as usize
                    };
                }
            }
        }
    }

    /// Number of edges on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        let mut max_depth = 0usize;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((idx, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            if let Some(Node::Split { left, right, .. }) = self.nodes.get(idx) {
                stack.push((*left as usize, depth + 1));
                stack.push((*right as usize, depth + 1));
            }
        }
        max_depth
    }

    fn validate(&self, n_features: usize, n_classes: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("Tree has no nodes".to_string());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Leaf { proba } => {
                    if proba.len() != n_classes {
                        return Err(format!(
                            "Leaf {idx} has {} probabilities but expected {n_classes}",
                            proba.len()
                        ));
                    }
                    if proba.iter().any(|p| !p.is_finite() || *p < 0.0 || *p > 1.0) {
                        return Err(format!("Leaf {idx} has probabilities outside [0, 1]"));
                    }
                }
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature as usize >= n_features {
                        return Err(format!(
                            "Node {idx} splits on feature {feature} but the model has {n_features}"
                        ));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("Node {idx} has a non-finite threshold"));
                    }
                    // Children always come after their parent, which rules out cycles.
                    for child in [*left as usize, *right as usize] {
                        if child <= idx || child >= self.nodes.len() {
                            return Err(format!("Node {idx} has invalid child {child}"));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// Fitted random-forest classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestModel {
    /// Model format version.
    pub model_version: i64,
    /// Width of the feature vectors the forest was fit on.
    pub n_features: usize,
    /// Number of classes; class `i` is label `i`.
    pub n_classes: usize,
    pub trees: Vec<DecisionTree>,
    /// Mean decrease in impurity per feature, summing to 1 (all zeros when no tree split).
    pub feature_importances: Vec<f64>,
}

impl RandomForestModel {
    /// Validate structural invariants of the model.
    pub fn validate(&self) -> Result<(), String> {
        if self.model_version != FOREST_MODEL_VERSION {
            return Err(format!(
                "Unsupported model_version {} (expected {FOREST_MODEL_VERSION})",
                self.model_version
            ));
        }
        if self.n_classes < 2 {
            return Err("Model must contain at least 2 classes".to_string());
        }
        if self.n_features == 0 {
            return Err("Model must use at least one feature".to_string());
        }
        if self.trees.is_empty() {
            return Err("Model has no trees".to_string());
        }
        if self.feature_importances.len() != self.n_features {
            return Err("feature_importances length must match n_features".to_string());
        }
        for (tree_idx, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features, self.n_classes)
                .map_err(|err| format!("Tree {tree_idx}: {err}"))?;
        }
        Ok(())
    }

    /// Mean class probabilities over all trees.
    ///
    /// `features` must hold `n_features` values in the order the forest was fit on.
    pub fn predict_proba(&self, features: &[f64]) -> Vec<f64> {
        let mut sum = vec![0.0f64; self.n_classes];
        for tree in &self.trees {
            for (acc, p) in sum.iter_mut().zip(tree.predict_proba(features)) {
                *acc += p;
            }
        }
        let n_trees = self.trees.len() as f64;
        for value in &mut sum {
            *value /= n_trees;
        }
        sum
    }

    /// Predict the most probable class index.
    pub fn predict_class_index(&self, features: &[f64]) -> usize {
        argmax(&self.predict_proba(features))
    }
}

/// Index of the largest value; ties resolve to the lowest index.
pub fn argmax(values: &[f64]) -> usize {
    let mut best_idx = 0usize;
    let mut best_val = f64::NEG_INFINITY;
    for (idx, &v) in values.iter().enumerate() {
        if v > best_val {
            best_val = v;
            best_idx = idx;
        }
    }
    best_idx
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump(threshold: f64) -> DecisionTree {
        DecisionTree {
            nodes: vec![
                Node::Split {
                    feature: 0,
                    threshold,
                    left: 1,
                    right: 2,
                },
                Node::Leaf {
                    proba: vec![1.0, 0.0],
                },
                Node::Leaf {
                    proba: vec![0.25, 0.75],
                },
            ],
        }
    }

    fn forest() -> RandomForestModel {
        RandomForestModel {
            model_version: FOREST_MODEL_VERSION,
            n_features: 1,
            n_classes: 2,
            trees: vec![stump(0.5), stump(1.5)],
            feature_importances: vec![1.0],
        }
    }

    #[test]
    fn tree_routes_on_threshold() {
        let tree = stump(0.5);
        assert_eq!(tree.predict_proba(&[0.5]), &[1.0, 0.0]);
        assert_eq!(tree.predict_proba(&[0.6]), &[0.25, 0.75]);
        assert_eq!(tree.depth(), 1);
    }

    #[test]
    fn forest_averages_trees() {
        let model = forest();
        assert_eq!(model.predict_proba(&[1.0]), vec![0.625, 0.375]);
        assert_eq!(model.predict_class_index(&[1.0]), 0);
        assert_eq!(model.predict_proba(&[2.0]), vec![0.25, 0.75]);
        assert_eq!(model.predict_class_index(&[2.0]), 1);
    }

    #[test]
    fn argmax_prefers_lower_index_on_ties() {
        assert_eq!(argmax(&[0.5, 0.5]), 0);
        assert_eq!(argmax(&[0.1, 0.7, 0.2]), 1);
    }

    #[test]
    fn validate_rejects_backward_children() {
        let mut model = forest();
        model.validate().unwrap();
        model.trees[0].nodes[0] = Node::Split {
            feature: 0,
            threshold: 0.0,
            left: 0,
            right: 2,
        };
        assert!(model.validate().is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_feature() {
        let mut model = forest();
        model.trees[1].nodes[0] = Node::Split {
            feature: 3,
            threshold: 0.0,
            left: 1,
            right: 2,
        };
        let err = model.validate().unwrap_err();
        assert!(err.contains("Tree 1"), "{err}");
    }
}
