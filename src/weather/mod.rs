//! Weather feature schema and single-observation records.
//!
//! The model only ever sees the six features defined by [`Feature`]. Column and key
//! names match the CSV headers used by the dataset files.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Date, format_description::FormatItem, macros::format_description};

pub mod synth;

/// Column holding the binary rainfall label.
pub const LABEL_COLUMN: &str = "Rainfall";
/// Column holding the observation date.
pub const DATE_COLUMN: &str = "Date";
/// Column holding the observation location.
pub const LOCATION_COLUMN: &str = "Location";

const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Render a date as `YYYY-MM-DD`.
pub fn format_date(date: Date) -> Result<String, time::error::Format> {
    date.format(DATE_FORMAT)
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(value: &str) -> Result<Date, time::error::Parse> {
    Date::parse(value.trim(), DATE_FORMAT)
}

/// A required feature column or record key was absent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Missing required feature: {feature}")]
pub struct MissingFeatureError {
    /// Name of the first missing feature.
    pub feature: String,
}

impl MissingFeatureError {
    pub fn new(feature: impl Into<String>) -> Self {
        Self {
            feature: feature.into(),
        }
    }
}

/// A record that cannot be fed to the model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error(transparent)]
    Missing(#[from] MissingFeatureError),
    #[error("Feature {feature} must be a finite number, got {value}")]
    NonFinite { feature: Feature, value: f64 },
}

/// One of the numeric weather measurements used as model input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Feature {
    /// Relative humidity in percent.
    Humidity,
    /// Air temperature in degrees Celsius.
    Temperature,
    /// Sea-level pressure in hPa.
    Pressure,
    /// Wind speed in km/h.
    WindSpeed,
    /// Wind direction in degrees.
    WindDirection,
    /// Cloud cover in percent.
    CloudCover,
}

impl Feature {
    /// Every feature, in canonical column order.
    pub const ALL: [Feature; 6] = [
        Feature::Humidity,
        Feature::Temperature,
        Feature::Pressure,
        Feature::WindSpeed,
        Feature::WindDirection,
        Feature::CloudCover,
    ];

    /// Column / key name used in tables and records.
    pub fn name(self) -> &'static str {
        match self {
            Feature::Humidity => "Humidity",
            Feature::Temperature => "Temperature",
            Feature::Pressure => "Pressure",
            Feature::WindSpeed => "WindSpeed",
            Feature::WindDirection => "WindDirection",
            Feature::CloudCover => "CloudCover",
        }
    }

    /// Parse a canonical column name.
    pub fn from_name(name: &str) -> Option<Self> {
        Feature::ALL.into_iter().find(|feature| feature.name() == name)
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors raised when constructing a [`FeatureSchema`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("Feature schema must contain at least one feature")]
    Empty,
    #[error("Feature {0} appears more than once in the schema")]
    Duplicate(Feature),
}

/// Ordered, duplicate-free list of features a model was fit on.
///
/// The order is the column order of every feature matrix built for the model, so
/// it travels with the fitted scaler and forest inside the bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FeatureSchema(Vec<Feature>);

impl FeatureSchema {
    pub fn new(features: Vec<Feature>) -> Result<Self, SchemaError> {
        if features.is_empty() {
            return Err(SchemaError::Empty);
        }
        for (idx, feature) in features.iter().enumerate() {
            if features[..idx].contains(feature) {
                return Err(SchemaError::Duplicate(*feature));
            }
        }
        Ok(Self(features))
    }

    /// Schema covering all six features in canonical order.
    pub fn standard() -> Self {
        Self(Feature::ALL.to_vec())
    }

    pub fn features(&self) -> &[Feature] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.0.iter().map(|feature| feature.name()).collect()
    }

    /// Pull values out of a record in schema order.
    ///
    /// NaN and infinite values are rejected rather than routed through the trees.
    pub fn extract(&self, record: &WeatherRecord) -> Result<Vec<f64>, RecordError> {
        self.0
            .iter()
            .map(|&feature| {
                let value = record
                    .get(feature.name())
                    .ok_or_else(|| MissingFeatureError::new(feature.name()))?;
                if value.is_finite() {
                    Ok(value)
                } else {
                    Err(RecordError::NonFinite { feature, value })
                }
            })
            .collect()
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::standard()
    }
}

impl<'de> Deserialize<'de> for FeatureSchema {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let features = Vec::<Feature>::deserialize(deserializer)?;
        FeatureSchema::new(features).map_err(serde::de::Error::custom)
    }
}

/// Mapping from feature name to value for a single observation.
///
/// Keys outside the feature set are allowed and ignored by prediction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeatherRecord(BTreeMap<String, f64>);

impl WeatherRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from `(feature, value)` pairs.
    pub fn from_features<I>(values: I) -> Self
    where
        I: IntoIterator<Item = (Feature, f64)>,
    {
        Self(
            values
                .into_iter()
                .map(|(feature, value)| (feature.name().to_string(), value))
                .collect(),
        )
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn feature(&self, feature: Feature) -> Option<f64> {
        self.get(feature.name())
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) -> Option<f64> {
        self.0.insert(name.into(), value)
    }

    pub fn set(&mut self, feature: Feature, value: f64) {
        self.0.insert(feature.name().to_string(), value);
    }

    pub fn remove(&mut self, name: &str) -> Option<f64> {
        self.0.remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(key, value)| (key.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A `name=value` list that could not be read as a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordParseError {
    #[error("Expected name=value but found {0:?}")]
    MissingSeparator(String),
    #[error("Invalid number {value:?} for {name}")]
    InvalidNumber { name: String, value: String },
}

impl std::str::FromStr for WeatherRecord {
    type Err = RecordParseError;

    /// Parse comma-separated `name=value` pairs, e.g. `Humidity=85,Pressure=1005`.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut record = WeatherRecord::new();
        for pair in text.split(',').map(str::trim).filter(|pair| !pair.is_empty()) {
            let (name, value) = pair
                .split_once('=')
                .ok_or_else(|| RecordParseError::MissingSeparator(pair.to_string()))?;
            let (name, value) = (name.trim(), value.trim());
            let number = value
                .parse::<f64>()
                .ok()
                .filter(|number| number.is_finite())
                .ok_or_else(|| RecordParseError::InvalidNumber {
                    name: name.to_string(),
                    value: value.to_string(),
                })?;
            record.insert(name, number);
        }
        Ok(record)
    }
}

impl FromIterator<(Feature, f64)> for WeatherRecord {
    fn from_iter<I: IntoIterator<Item = (Feature, f64)>>(iter: I) -> Self {
        Self::from_features(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> WeatherRecord {
        WeatherRecord::from_features([
            (Feature::Humidity, 85.0),
            (Feature::Temperature, 22.0),
            (Feature::Pressure, 1005.0),
            (Feature::WindSpeed, 25.0),
            (Feature::WindDirection, 220.0),
            (Feature::CloudCover, 70.0),
        ])
    }

    #[test]
    fn feature_names_round_trip() {
        for feature in Feature::ALL {
            assert_eq!(Feature::from_name(feature.name()), Some(feature));
        }
        assert_eq!(Feature::from_name("humidity"), None);
    }

    #[test]
    fn dates_format_and_parse() {
        let date = parse_date("2024-02-29").unwrap();
        assert_eq!(format_date(date).unwrap(), "2024-02-29");
        let early = Date::from_calendar_date(987, time::Month::March, 5).unwrap();
        assert_eq!(format_date(early).unwrap(), "0987-03-05");
        assert!(parse_date("2023-02-29").is_err());
    }

    #[test]
    fn schema_rejects_duplicates_and_empty() {
        assert_eq!(FeatureSchema::new(Vec::new()), Err(SchemaError::Empty));
        assert_eq!(
            FeatureSchema::new(vec![Feature::Pressure, Feature::Humidity, Feature::Pressure]),
            Err(SchemaError::Duplicate(Feature::Pressure))
        );
    }

    #[test]
    fn extract_follows_schema_order_and_ignores_extras() {
        let schema = FeatureSchema::new(vec![Feature::Pressure, Feature::Humidity]).unwrap();
        let mut record = sample_record();
        record.insert("Visibility", 10.0);
        assert_eq!(schema.extract(&record).unwrap(), vec![1005.0, 85.0]);
    }

    #[test]
    fn extract_reports_first_missing_feature() {
        let mut record = sample_record();
        record.remove("WindSpeed");
        let err = FeatureSchema::standard().extract(&record).unwrap_err();
        assert_eq!(err, RecordError::Missing(MissingFeatureError::new("WindSpeed")));
    }

    #[test]
    fn extract_rejects_non_finite_values() {
        let schema = FeatureSchema::new(vec![Feature::Humidity, Feature::Pressure]).unwrap();
        let mut record = sample_record();
        record.insert("Pressure", f64::INFINITY);
        assert_eq!(
            schema.extract(&record),
            Err(RecordError::NonFinite {
                feature: Feature::Pressure,
                value: f64::INFINITY,
            })
        );
        record.insert("Pressure", 1005.0);
        record.insert("Humidity", f64::NAN);
        assert!(matches!(
            schema.extract(&record),
            Err(RecordError::NonFinite {
                feature: Feature::Humidity,
                ..
            })
        ));
    }

    #[test]
    fn record_parses_from_pairs() {
        let record: WeatherRecord = "Humidity=85, Pressure = 1005,".parse().unwrap();
        assert_eq!(record.feature(Feature::Humidity), Some(85.0));
        assert_eq!(record.feature(Feature::Pressure), Some(1005.0));
        assert_eq!(record.len(), 2);
        assert_eq!(
            "Humidity".parse::<WeatherRecord>(),
            Err(RecordParseError::MissingSeparator("Humidity".to_string()))
        );
        assert!(matches!(
            "Humidity=wet".parse::<WeatherRecord>(),
            Err(RecordParseError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn schema_deserialization_validates() {
        let schema: FeatureSchema = serde_json::from_str(r#"["CloudCover","Humidity"]"#).unwrap();
        assert_eq!(schema.features(), &[Feature::CloudCover, Feature::Humidity]);
        assert!(serde_json::from_str::<FeatureSchema>(r#"["Humidity","Humidity"]"#).is_err());
        assert!(serde_json::from_str::<FeatureSchema>(r#"["Dewpoint"]"#).is_err());
    }
}
