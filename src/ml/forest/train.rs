use ndarray::ArrayView2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use super::model::{DecisionTree, FOREST_MODEL_VERSION, Node, RandomForestModel};

/// Training hyperparameters for the forest.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainOptions {
    /// Number of trees in the ensemble.
    pub n_trees: usize,
    /// Maximum tree depth (`None` grows until leaves are pure).
    pub max_depth: Option<usize>,
    /// Minimum rows a node needs before it may split.
    pub min_samples_split: usize,
    /// Minimum rows on each side of a split.
    pub min_samples_leaf: usize,
    /// Candidate features per node (`None` = rounded square root of the width).
    pub max_features: Option<usize>,
    /// Fit each tree on a bootstrap resample instead of the full set.
    pub bootstrap: bool,
    /// Seed for every random choice made while training.
    pub seed: u64,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            bootstrap: true,
            seed: 42,
        }
    }
}

/// Errors for malformed training input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrainError {
    #[error("Empty training set")]
    Empty,
    #[error("Mismatched training inputs/labels: {rows} rows but {labels} labels")]
    Mismatch { rows: usize, labels: usize },
    #[error("Training matrix has no feature columns")]
    NoFeatures,
    #[error("Label {label} at row {row} is outside 0..{n_classes}")]
    LabelOutOfRange {
        row: usize,
        label: usize,
        n_classes: usize,
    },
    #[error("Non-finite value at row {row}, column {column}")]
    NonFinite { row: usize, column: usize },
    #[error("Need at least 2 classes")]
    TooFewClasses,
    #[error("Forest needs at least one tree")]
    NoTrees,
}

/// Fit a random forest on `x` (rows are samples) with class labels `y`.
pub fn train_random_forest<'a>(
    x: ArrayView2<'a, f64>,
    y: &'a [usize],
    n_classes: usize,
    options: &TrainOptions,
) -> Result<RandomForestModel, TrainError> {
    let (n, d) = x.dim();
    if n == 0 {
        return Err(TrainError::Empty);
    }
    if n != y.len() {
        return Err(TrainError::Mismatch {
            rows: n,
            labels: y.len(),
        });
    }
    if d == 0 {
        return Err(TrainError::NoFeatures);
    }
    if n_classes < 2 {
        return Err(TrainError::TooFewClasses);
    }
    if options.n_trees == 0 {
        return Err(TrainError::NoTrees);
    }
    if let Some((row, &label)) = y.iter().enumerate().find(|(_, label)| **label >= n_classes) {
        return Err(TrainError::LabelOutOfRange {
            row,
            label,
            n_classes,
        });
    }
    if let Some(((row, column), _)) = x.indexed_iter().find(|(_, v)| !v.is_finite()) {
        return Err(TrainError::NonFinite { row, column });
    }

    let max_features = options
        .max_features
        .unwrap_or_else(|| ((d as f64).sqrt().round() as usize).max(1))
        .clamp(1, d);
    let builder = TreeBuilder {
        x,
        y,
        n_classes,
        max_features,
        max_depth: options.max_depth,
        min_samples_split: options.min_samples_split.max(2),
        min_samples_leaf: options.min_samples_leaf.max(1),
    };

    let mut rng = StdRng::seed_from_u64(options.seed);
    let mut trees = Vec::with_capacity(options.n_trees);
    let mut importances = vec![0.0f64; d];
    for _ in 0..options.n_trees {
        let mut tree_rng = StdRng::seed_from_u64(rng.random::<u64>());
        let samples: Vec<usize> = if options.bootstrap {
            (0..n).map(|_| tree_rng.random_range(0..n)).collect()
        } else {
            (0..n).collect()
        };
        let (tree, tree_importance) = builder.build(samples, &mut tree_rng);
        for (acc, value) in importances.iter_mut().zip(normalized(tree_importance)) {
            *acc += value;
        }
        trees.push(tree);
    }

    let model = RandomForestModel {
        model_version: FOREST_MODEL_VERSION,
        n_features: d,
        n_classes,
        trees,
        feature_importances: normalized(importances),
    };
    tracing::debug!(
        "Trained {} trees (max depth {}) on {n} rows x {d} features",
        model.trees.len(),
        model.trees.iter().map(DecisionTree::depth).max().unwrap_or(0)
    );
    Ok(model)
}

fn normalized(mut values: Vec<f64>) -> Vec<f64> {
    let total: f64 = values.iter().sum();
    if total > 0.0 {
        for value in &mut values {
            *value /= total;
        }
    }
    values
}

struct TreeBuilder<'a> {
    x: ArrayView2<'a, f64>,
    y: &'a [usize],
    n_classes: usize,
    max_features: usize,
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
}

struct PendingNode {
    node: usize,
    samples: Vec<usize>,
    depth: usize,
}

#[derive(Debug, Clone)]
struct BestSplit {
    feature: usize,
    threshold: f64,
    weighted_impurity: f64,
}

impl TreeBuilder<'_> {
    /// Grow one tree; returns it with its unnormalized impurity decrease per feature.
    fn build(&self, samples: Vec<usize>, rng: &mut StdRng) -> (DecisionTree, Vec<f64>) {
        let d = self.x.ncols();
        let total = samples.len() as f64;
        let mut importances = vec![0.0f64; d];
        let mut nodes = vec![Node::Leaf { proba: Vec::new() }];
        let mut stack = vec![PendingNode {
            node: 0,
            samples,
            depth: 0,
        }];

        while let Some(pending) = stack.pop() {
            let counts = self.class_counts(&pending.samples);
            let n_node = pending.samples.len();
            let impurity = gini(&counts, n_node);
            let depth_ok = self.max_depth.is_none_or(|max| pending.depth < max);
            let splittable = impurity > 0.0
                && depth_ok
                && n_node >= self.min_samples_split
                && n_node >= 2 * self.min_samples_leaf;
            let split = if splittable {
                self.best_split(&pending.samples, rng)
            } else {
                None
            };
            let Some(split) = split else {
                nodes[pending.node] = leaf(&counts, n_node);
                continue;
            };

            let (left, right): (Vec<usize>, Vec<usize>) = pending
                .samples
                .into_iter()
                .partition(|&i| self.x[[i, split.feature]] <= split.threshold);
            importances[split.feature] +=
                (n_node as f64 / total) * (impurity - split.weighted_impurity);

            let left_idx = nodes.len();
            let right_idx = left_idx + 1;
            nodes.push(Node::Leaf { proba: Vec::new() });
            nodes.push(Node::Leaf { proba: Vec::new() });
            nodes[pending.node] = Node::Split {
                feature: split.feature as u16,
                threshold: split.threshold,
                left: left_idx as u32,
                right: right_idx as u32,
            };
            stack.push(PendingNode {
                node: right_idx,
                samples: right,
                depth: pending.depth + 1,
            });
            stack.push(PendingNode {
                node: left_idx,
                samples: left,
                depth: pending.depth + 1,
            });
        }
        (DecisionTree { nodes }, importances)
    }

    fn class_counts(&self, samples: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_classes];
        for &i in samples {
            counts[self.y[i]] += 1;
        }
        counts
    }

    fn best_split(&self, samples: &[usize], rng: &mut StdRng) -> Option<BestSplit> {
        let d = self.x.ncols();
        let candidates = rand::seq::index::sample(rng, d, self.max_features);
        let mut best: Option<BestSplit> = None;
        for feature in candidates.iter() {
            if let Some(split) = self.best_split_for_feature(samples, feature) {
                let better = best
                    .as_ref()
                    .is_none_or(|current| split.weighted_impurity < current.weighted_impurity);
                if better {
                    best = Some(split);
                }
            }
        }
        best
    }

    fn best_split_for_feature(&self, samples: &[usize], feature: usize) -> Option<BestSplit> {
        let mut column: Vec<(f64, usize)> = samples
            .iter()
            .map(|&i| (self.x[[i, feature]], self.y[i]))
            .collect();
        column.sort_by(|a, b| a.0.total_cmp(&b.0));

        let n = column.len();
        let mut right_counts = vec![0usize; self.n_classes];
        for &(_, label) in &column {
            right_counts[label] += 1;
        }
        let mut left_counts = vec![0usize; self.n_classes];

        let mut best: Option<(f64, usize)> = None;
        for split_at in 1..n {
            let label = column[split_at - 1].1;
            left_counts[label] += 1;
            right_counts[label] -= 1;
            if column[split_at - 1].0 == column[split_at].0 {
                continue;
            }
            let n_left = split_at;
            let n_right = n - split_at;
            if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                continue;
            }
            let weighted = (n_left as f64 * gini(&left_counts, n_left)
                + n_right as f64 * gini(&right_counts, n_right))
                / n as f64;
            if best.is_none_or(|(score, _)| weighted < score) {
                best = Some((weighted, split_at));
            }
        }

        best.map(|(weighted_impurity, split_at)| {
            let lower = column[split_at - 1].0;
            let upper = column[split_at].0;
            let mut threshold = lower + (upper - lower) / 2.0;
            if threshold >= upper {
                threshold = lower;
            }
            BestSplit {
                feature,
                threshold,
                weighted_impurity,
            }
        })
    }
}

fn gini(counts: &[usize], n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum::<f64>()
}

fn leaf(counts: &[usize], n: usize) -> Node {
    let n = n.max(1) as f64;
    Node::Leaf {
        proba: counts.iter().map(|&c| c as f64 / n).collect(),
    }
}
