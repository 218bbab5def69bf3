use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fs_ops::atomic_write;
use crate::ml::forest::RandomForestModel;
use crate::ml::scaler::StandardScaler;
use crate::weather::FeatureSchema;

/// Current on-disk bundle format.
pub const BUNDLE_FORMAT_VERSION: i64 = 1;

/// Inconsistent parts handed to [`PredictorBundle::new`].
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Invalid predictor bundle: {0}")]
pub struct BundleError(pub String);

/// Errors that may occur while saving or loading a bundle file.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Failed to read the bundle file.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to write the bundle file.
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The file is not a bundle document.
    #[error("Invalid bundle at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Failed to serialize bundle for {path}: {source}")]
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },
    /// The document parsed but its parts disagree.
    #[error("Invalid bundle at {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },
}

/// Everything needed to predict: feature order, standardization and the fitted forest.
///
/// Immutable once built; prediction functions borrow it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictorBundle {
    format_version: i64,
    features: FeatureSchema,
    scaler: StandardScaler,
    model: RandomForestModel,
}

impl PredictorBundle {
    pub fn new(
        features: FeatureSchema,
        scaler: StandardScaler,
        model: RandomForestModel,
    ) -> Result<Self, BundleError> {
        let bundle = Self {
            format_version: BUNDLE_FORMAT_VERSION,
            features,
            scaler,
            model,
        };
        bundle.validate().map_err(BundleError)?;
        Ok(bundle)
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.features
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn model(&self) -> &RandomForestModel {
        &self.model
    }

    /// Check the version and that schema, scaler and model agree on width.
    pub fn validate(&self) -> Result<(), String> {
        if self.format_version != BUNDLE_FORMAT_VERSION {
            return Err(format!(
                "Unsupported format_version {} (expected {BUNDLE_FORMAT_VERSION})",
                self.format_version
            ));
        }
        self.scaler.validate()?;
        self.model.validate()?;
        let width = self.features.len();
        if self.scaler.len() != width {
            return Err(format!(
                "Scaler covers {} features but the schema lists {width}",
                self.scaler.len()
            ));
        }
        if self.model.n_features != width {
            return Err(format!(
                "Model expects {} features but the schema lists {width}",
                self.model.n_features
            ));
        }
        Ok(())
    }

    /// Write the bundle as pretty JSON, atomically replacing `path`.
    pub fn save(&self, path: &Path) -> Result<(), PersistenceError> {
        let json =
            serde_json::to_vec_pretty(self).map_err(|source| PersistenceError::Serialize {
                path: path.to_path_buf(),
                source,
            })?;
        atomic_write(path, &json).map_err(|source| PersistenceError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(
            "Saved predictor bundle ({} trees) to {}",
            self.model.trees.len(),
            path.display()
        );
        Ok(())
    }

    /// Read and validate a bundle written by [`PredictorBundle::save`].
    pub fn load(path: &Path) -> Result<Self, PersistenceError> {
        let bytes = std::fs::read(path).map_err(|source| PersistenceError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let bundle: Self =
            serde_json::from_slice(&bytes).map_err(|source| PersistenceError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        bundle
            .validate()
            .map_err(|reason| PersistenceError::Invalid {
                path: path.to_path_buf(),
                reason,
            })?;
        tracing::info!(
            "Loaded predictor bundle for {:?} from {}",
            bundle.features.names(),
            path.display()
        );
        Ok(bundle)
    }
}

pub fn save(bundle: &PredictorBundle, path: &Path) -> Result<(), PersistenceError> {
    bundle.save(path)
}

pub fn load(path: &Path) -> Result<PredictorBundle, PersistenceError> {
    PredictorBundle::load(path)
}
