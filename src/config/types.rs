use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::Date;

use super::defaults::{
    MAX_FORECAST_DAYS, MAX_SAMPLES, MAX_TREES, clamp_test_fraction, default_forecast_days,
    default_forecast_location, default_location_list, default_min_samples_leaf,
    default_min_samples_split, default_samples, default_seed, default_start_date,
    default_start_date_value, default_test_fraction, default_trees,
};
use crate::ml::forest::TrainOptions;
use crate::prep::PrepareOptions;
use crate::weather::synth::SynthOptions;
use crate::weather::{WeatherRecord, parse_date};

/// Errors that may occur while loading or saving `raincast.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unable to create config directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize config to TOML at {path}: {source}")]
    SerializeToml {
        path: PathBuf,
        source: toml::ser::Error,
    },
    #[error("No suitable config directory found")]
    NoConfigDir,
}

/// Contents of `raincast.toml`.
///
/// Config keys (TOML): `[data]`, `[training]`, `[forecast]`, `[output]`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RaincastConfig {
    #[serde(default)]
    pub data: DataSettings,
    #[serde(default)]
    pub training: TrainingSettings,
    #[serde(default)]
    pub forecast: ForecastSettings,
    #[serde(default)]
    pub output: OutputSettings,
}

impl RaincastConfig {
    /// Clamp every section into its supported range.
    pub fn normalized(self) -> Self {
        Self {
            data: self.data.normalized(),
            training: self.training.normalized(),
            forecast: self.forecast.normalized(),
            output: self.output,
        }
    }
}

/// Where the labeled dataset comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSettings {
    /// CSV to train on; synthesized data is used when unset.
    #[serde(default)]
    pub input: Option<PathBuf>,
    #[serde(default = "default_samples")]
    pub samples: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_location_list")]
    pub locations: Vec<String>,
    /// First synthesized date, `YYYY-MM-DD`.
    #[serde(default = "default_start_date")]
    pub start_date: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            input: None,
            samples: default_samples(),
            seed: default_seed(),
            locations: default_location_list(),
            start_date: default_start_date(),
        }
    }
}

impl DataSettings {
    fn normalized(mut self) -> Self {
        self.samples = self.samples.clamp(1, MAX_SAMPLES);
        self.locations.retain(|location| !location.trim().is_empty());
        if self.locations.is_empty() {
            self.locations = default_location_list();
        }
        if parse_date(&self.start_date).is_err() {
            tracing::warn!(
                "Ignoring invalid data.start_date {:?}; using {}",
                self.start_date,
                default_start_date()
            );
            self.start_date = default_start_date();
        }
        self
    }

    pub fn start_date(&self) -> Date {
        parse_date(&self.start_date).unwrap_or_else(|_| default_start_date_value())
    }

    pub fn synth_options(&self) -> SynthOptions {
        SynthOptions {
            samples: self.samples,
            start_date: self.start_date(),
            locations: self.locations.clone(),
        }
    }
}

/// Split and forest hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSettings {
    #[serde(default = "default_trees")]
    pub trees: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64,
    #[serde(default)]
    pub max_depth: Option<usize>,
    #[serde(default = "default_min_samples_split")]
    pub min_samples_split: usize,
    #[serde(default = "default_min_samples_leaf")]
    pub min_samples_leaf: usize,
}

impl Default for TrainingSettings {
    fn default() -> Self {
        Self {
            trees: default_trees(),
            seed: default_seed(),
            test_fraction: default_test_fraction(),
            max_depth: None,
            min_samples_split: default_min_samples_split(),
            min_samples_leaf: default_min_samples_leaf(),
        }
    }
}

impl TrainingSettings {
    fn normalized(mut self) -> Self {
        self.trees = self.trees.clamp(1, MAX_TREES);
        self.test_fraction = clamp_test_fraction(self.test_fraction);
        self.max_depth = self.max_depth.filter(|depth| *depth > 0);
        self.min_samples_split = self.min_samples_split.max(2);
        self.min_samples_leaf = self.min_samples_leaf.max(1);
        self
    }

    pub fn prepare_options(&self) -> PrepareOptions {
        PrepareOptions {
            test_fraction: self.test_fraction,
            seed: self.seed,
        }
    }

    pub fn train_options(&self) -> TrainOptions {
        TrainOptions {
            n_trees: self.trees,
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
            seed: self.seed,
            ..TrainOptions::default()
        }
    }
}

/// Forecast defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSettings {
    #[serde(default = "default_forecast_days")]
    pub days: usize,
    #[serde(default = "default_forecast_location")]
    pub location: String,
    /// Seed for the day-to-day noise; fresh entropy when unset.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Starting observation; climate normals when unset.
    #[serde(default)]
    pub base: Option<WeatherRecord>,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            days: default_forecast_days(),
            location: default_forecast_location(),
            seed: None,
            base: None,
        }
    }
}

impl ForecastSettings {
    fn normalized(mut self) -> Self {
        self.days = self.days.clamp(1, MAX_FORECAST_DAYS);
        if self.location.trim().is_empty() {
            self.location = default_forecast_location();
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Directory for run outputs; `<app root>/output` when unset.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}
