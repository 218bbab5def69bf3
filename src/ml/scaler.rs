//! Per-feature standardization.

use ndarray::{Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Per-feature `(mean, std)` fit on a training matrix.
///
/// Features with zero variance get a scale of `1.0`, so they are only centered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Fit on `x` (rows are samples) using the population standard deviation.
    ///
    /// Returns `None` when `x` has no rows.
    pub fn fit(x: ArrayView2<'_, f64>) -> Option<Self> {
        let mean = x.mean_axis(Axis(0))?;
        let std = x.std_axis(Axis(0), 0.0);
        let scale = std
            .iter()
            .enumerate()
            .map(|(idx, &s)| {
                if s == 0.0 || !s.is_finite() {
                    tracing::warn!("Feature column {idx} has zero variance; leaving it unscaled");
                    1.0
                } else {
                    s
                }
            })
            .collect();
        Some(Self {
            mean: mean.to_vec(),
            scale,
        })
    }

    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    /// Standardize one row in place: `(x - mean) / std`.
    pub fn transform_row(&self, row: &mut [f64]) {
        for ((value, mean), scale) in row.iter_mut().zip(&self.mean).zip(&self.scale) {
            *value = (*value - mean) / scale;
        }
    }

    /// Standardize every row of `x` into a new matrix.
    pub fn transform(&self, x: ArrayView2<'_, f64>) -> Array2<f64> {
        let mut out = x.to_owned();
        for mut row in out.rows_mut() {
            for ((value, mean), scale) in row.iter_mut().zip(&self.mean).zip(&self.scale) {
                *value = (*value - mean) / scale;
            }
        }
        out
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.mean.len() != self.scale.len() {
            return Err("Scaler mean and scale lengths differ".to_string());
        }
        if self.mean.iter().any(|m| !m.is_finite()) {
            return Err("Scaler mean contains non-finite values".to_string());
        }
        if self.scale.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err("Scaler scale must be finite and positive".to_string());
        }
        Ok(())
    }
}
