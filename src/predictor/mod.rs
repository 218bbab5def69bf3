//! Prediction on top of a persisted [`PredictorBundle`].
//!
//! All entry points are free functions over an immutable bundle; nothing here keeps
//! state between calls.

pub mod batch;
pub mod bundle;
pub mod forecast;
pub mod predict;

pub use batch::{BatchError, PREDICTED_COLUMN, PROBABILITY_COLUMN, predict_batch};
pub use bundle::{BUNDLE_FORMAT_VERSION, BundleError, PersistenceError, PredictorBundle, load, save};
pub use forecast::{
    ForecastDay, ForecastError, ForecastRequest, ForecastSeries, climate_normals, forecast,
    forecast_table,
};
pub use predict::{PredictionResult, RAIN_CLASS, predict};
