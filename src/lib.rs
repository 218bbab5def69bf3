//! Library exports for the raincast binaries, benchmarks and tests.
/// Application directory resolution.
pub mod app_dirs;
/// `raincast.toml` settings.
pub mod config;
/// In-memory tables and CSV IO.
pub mod dataset;
/// Atomic file writes.
pub mod fs_ops;
/// Tracing setup.
pub mod logging;
/// Forest, scaler, split and metrics.
pub mod ml;
/// Session wrapper around training and prediction.
pub mod pipeline;
/// Bundle persistence, prediction and forecasting.
pub mod predictor;
/// Dataset preparation for training.
pub mod prep;
/// Feature schema, records and synthetic data.
pub mod weather;
