use serde::{Deserialize, Serialize};

use super::bundle::PredictorBundle;
use crate::ml::forest::argmax;
use crate::weather::{RecordError, WeatherRecord};

/// Class index of "rain" in the model output.
pub const RAIN_CLASS: usize = 1;

/// Outcome of predicting one record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub rainfall_predicted: bool,
    /// Probability of rain, whatever the predicted class.
    pub probability: f64,
    /// Probability of the predicted class.
    pub confidence: f64,
}

impl PredictionResult {
    /// Interpret class probabilities; ties resolve to "no rain".
    pub fn from_proba(proba: &[f64]) -> Self {
        let label = argmax(proba);
        Self {
            rainfall_predicted: label == RAIN_CLASS,
            probability: proba.get(RAIN_CLASS).copied().unwrap_or(0.0),
            confidence: proba.get(label).copied().unwrap_or(0.0),
        }
    }
}

/// Predict rain for one observation.
///
/// Keys outside the bundle's schema are ignored. Missing or non-finite feature
/// values are errors.
pub fn predict(
    bundle: &PredictorBundle,
    record: &WeatherRecord,
) -> Result<PredictionResult, RecordError> {
    let values = bundle.schema().extract(record)?;
    Ok(predict_values(bundle, values))
}

/// Predict from raw values already in schema order.
pub(crate) fn predict_values(bundle: &PredictorBundle, mut values: Vec<f64>) -> PredictionResult {
    bundle.scaler().transform_row(&mut values);
    PredictionResult::from_proba(&bundle.model().predict_proba(&values))
}
