//! Deterministic random-forest classifier.
//!
//! An ensemble of CART trees fit on bootstrap resamples with per-node feature
//! subsampling. Properties relied on elsewhere in the crate:
//! - A single seed fixes every random choice, so identical inputs and options
//!   produce identical forests.
//! - Probabilities are averaged leaf class frequencies, so they always lie in `[0, 1]`.
//! - The model is plain data and round-trips through JSON without loss.

mod model;
mod train;

pub use model::{DecisionTree, FOREST_MODEL_VERSION, Node, RandomForestModel, argmax};
pub use train::{TrainError, TrainOptions, train_random_forest};
