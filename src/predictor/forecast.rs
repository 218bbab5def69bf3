//! Multi-day rainfall forecasts from a random walk over weather features.
//!
//! Each day perturbs the previous day's values with bounded uniform noise, clamps
//! them to physical limits and predicts rain for the result. The clamped values
//! seed the next day.

use std::collections::BTreeMap;

use rand::Rng;
use serde::Serialize;
use thiserror::Error;
use time::{Date, Duration, OffsetDateTime};

use super::bundle::PredictorBundle;
use super::predict::{PredictionResult, predict};
use crate::dataset::{Cell, WeatherTable};
use crate::weather::{
    DATE_COLUMN, Feature, LOCATION_COLUMN, RecordError, WeatherRecord, format_date,
};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ForecastError {
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error("Forecast day {day} falls outside the supported date range")]
    DateOutOfRange { day: usize },
}

/// Parameters for [`forecast`].
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRequest {
    pub location: String,
    /// Number of days to produce.
    pub days: usize,
    /// Starting observation; climate normals when absent.
    pub base: Option<WeatherRecord>,
    /// Date of the first forecast day.
    pub start_date: Date,
}

impl ForecastRequest {
    pub fn new(location: impl Into<String>, days: usize, start_date: Date) -> Self {
        Self {
            location: location.into(),
            days,
            base: None,
            start_date,
        }
    }

    /// Request starting today in local time, or UTC when the offset is unknown.
    pub fn starting_today(location: impl Into<String>, days: usize) -> Self {
        Self::new(location, days, today())
    }

    pub fn with_base(mut self, base: WeatherRecord) -> Self {
        self.base = Some(base);
        self
    }
}

pub fn today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

/// Typical values used when a forecast has no observed starting point.
pub fn climate_normals() -> WeatherRecord {
    Feature::ALL
        .into_iter()
        .map(|feature| (feature, climate_normal(feature)))
        .collect()
}

fn climate_normal(feature: Feature) -> f64 {
    match feature {
        Feature::Humidity => 65.0,
        Feature::Temperature => 15.0,
        Feature::Pressure => 1013.0,
        Feature::WindSpeed => 15.0,
        Feature::WindDirection => 180.0,
        Feature::CloudCover => 50.0,
    }
}

/// Half-width of the uniform day-to-day noise.
fn daily_noise(feature: Feature) -> f64 {
    match feature {
        Feature::Humidity => 10.0,
        Feature::Temperature => 3.0,
        Feature::Pressure => 5.0,
        Feature::WindSpeed => 5.0,
        Feature::WindDirection => 30.0,
        Feature::CloudCover => 20.0,
    }
}

/// Force a perturbed value back into its physical range.
fn constrain(feature: Feature, value: f64) -> f64 {
    match feature {
        Feature::Humidity => value.clamp(30.0, 100.0),
        Feature::Temperature => value.clamp(-20.0, 45.0),
        Feature::Pressure => value.clamp(950.0, 1050.0),
        Feature::WindSpeed => value.clamp(0.0, 100.0),
        Feature::WindDirection => value.rem_euclid(360.0),
        Feature::CloudCover => value.clamp(0.0, 100.0),
    }
}

/// One predicted day.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastDay {
    pub date: Date,
    pub location: String,
    /// Simulated feature values for the day.
    pub record: WeatherRecord,
    pub prediction: PredictionResult,
}

/// Produce `request.days` consecutive daily predictions.
///
/// Only features present in the base record are simulated; other keys are
/// dropped. Fails before producing anything if the base lacks a schema feature.
pub fn forecast<R: Rng + ?Sized>(
    bundle: &PredictorBundle,
    request: &ForecastRequest,
    rng: &mut R,
) -> Result<Vec<ForecastDay>, ForecastError> {
    let mut current: Vec<(Feature, f64)> = match &request.base {
        Some(base) => Feature::ALL
            .into_iter()
            .filter_map(|feature| base.feature(feature).map(|value| (feature, value)))
            .collect(),
        None => Feature::ALL
            .into_iter()
            .map(|feature| (feature, climate_normal(feature)))
            .collect(),
    };

    let mut days = Vec::with_capacity(request.days);
    for day in 0..request.days {
        let date = request
            .start_date
            .checked_add(Duration::days(day as i64))
            .ok_or(ForecastError::DateOutOfRange { day })?;
        for (feature, value) in current.iter_mut() {
            let half = daily_noise(*feature);
            *value = constrain(*feature, *value + rng.random_range(-half..=half));
        }
        let record: WeatherRecord = current.iter().copied().collect();
        let prediction = predict(bundle, &record)?;
        tracing::debug!(
            "Forecast {} for {}: p(rain)={:.3}",
            date,
            request.location,
            prediction.probability
        );
        days.push(ForecastDay {
            date,
            location: request.location.clone(),
            record,
            prediction,
        });
    }
    tracing::info!(
        "Generated {}-day forecast for {}",
        days.len(),
        request.location
    );
    Ok(days)
}

/// Column-oriented view of a forecast for plotting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastSeries {
    pub location: String,
    pub dates: Vec<String>,
    /// Feature name to one value per day.
    pub features: BTreeMap<String, Vec<f64>>,
    pub probability: Vec<f64>,
    pub confidence: Vec<f64>,
    pub rainfall_predicted: Vec<bool>,
}

impl ForecastSeries {
    pub fn from_days(days: &[ForecastDay]) -> Result<Self, time::error::Format> {
        let mut features: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for day in days {
            for (name, value) in day.record.iter() {
                features.entry(name.to_string()).or_default().push(value);
            }
        }
        Ok(Self {
            location: days
                .first()
                .map(|day| day.location.clone())
                .unwrap_or_default(),
            dates: days
                .iter()
                .map(|day| format_date(day.date))
                .collect::<Result<_, _>>()?,
            features,
            probability: days.iter().map(|day| day.prediction.probability).collect(),
            confidence: days.iter().map(|day| day.prediction.confidence).collect(),
            rainfall_predicted: days
                .iter()
                .map(|day| day.prediction.rainfall_predicted)
                .collect(),
        })
    }
}

/// Tabulate forecast days for CSV output.
pub fn forecast_table(days: &[ForecastDay]) -> Result<WeatherTable, time::error::Format> {
    let features: Vec<Feature> = Feature::ALL
        .into_iter()
        .filter(|&feature| days.iter().all(|day| day.record.feature(feature).is_some()))
        .collect();
    let mut headers = vec![DATE_COLUMN.to_string(), LOCATION_COLUMN.to_string()];
    headers.extend(features.iter().map(|feature| feature.name().to_string()));
    headers.extend(
        [
            super::batch::PREDICTED_COLUMN,
            super::batch::PROBABILITY_COLUMN,
            "Confidence",
        ]
        .map(String::from),
    );
    let rows = days
        .iter()
        .map(|day| {
            let mut row = vec![
                Cell::Text(format_date(day.date)?),
                Cell::Text(day.location.clone()),
            ];
            row.extend(
                features
                    .iter()
                    .map(|&feature| day.record.feature(feature).map_or(Cell::Missing, Cell::Number)),
            );
            row.push(Cell::Number(if day.prediction.rainfall_predicted {
                1.0
            } else {
                0.0
            }));
            row.push(Cell::Number(day.prediction.probability));
            row.push(Cell::Number(day.prediction.confidence));
            Ok(row)
        })
        .collect::<Result<_, time::error::Format>>()?;
    Ok(WeatherTable::from_trusted_parts(headers, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::bundle::tests::humidity_bundle;
    use crate::weather::MissingFeatureError;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use time::macros::date;

    fn request(days: usize) -> ForecastRequest {
        ForecastRequest::new("Lakeside", days, date!(2024 - 03 - 01))
    }

    #[test]
    fn consecutive_dates_from_start() {
        let mut rng = StdRng::seed_from_u64(1);
        let days = forecast(&humidity_bundle(), &request(7), &mut rng).unwrap();
        assert_eq!(days.len(), 7);
        assert_eq!(days[0].date, date!(2024 - 03 - 01));
        assert_eq!(days[6].date, date!(2024 - 03 - 07));
        assert!(days.windows(2).all(|pair| pair[0].date < pair[1].date));
        assert!(days.iter().all(|day| day.location == "Lakeside"));
    }

    #[test]
    fn values_stay_within_physical_limits() {
        let mut rng = StdRng::seed_from_u64(3);
        let base = WeatherRecord::from_features([
            (Feature::Humidity, 99.0),
            (Feature::Temperature, 44.0),
            (Feature::Pressure, 951.0),
            (Feature::WindSpeed, 1.0),
            (Feature::WindDirection, 355.0),
            (Feature::CloudCover, 99.0),
        ]);
        let req = request(60).with_base(base);
        let days = forecast(&humidity_bundle(), &req, &mut rng).unwrap();
        for day in &days {
            let get = |feature| day.record.feature(feature).unwrap();
            assert!((30.0..=100.0).contains(&get(Feature::Humidity)));
            assert!((-20.0..=45.0).contains(&get(Feature::Temperature)));
            assert!((950.0..=1050.0).contains(&get(Feature::Pressure)));
            assert!((0.0..=100.0).contains(&get(Feature::WindSpeed)));
            assert!((0.0..360.0).contains(&get(Feature::WindDirection)));
            assert!((0.0..=100.0).contains(&get(Feature::CloudCover)));
            assert!((0.0..=1.0).contains(&day.prediction.probability));
        }
    }

    #[test]
    fn each_day_perturbs_the_previous_clamped_day() {
        let base = WeatherRecord::from_features([
            (Feature::Humidity, 97.0),
            (Feature::Temperature, 12.0),
            (Feature::Pressure, 1002.0),
            (Feature::WindSpeed, 2.0),
            (Feature::WindDirection, 350.0),
            (Feature::CloudCover, 90.0),
        ]);
        let rng = StdRng::seed_from_u64(21);
        let mut replay = rng.clone();
        let days = forecast(
            &humidity_bundle(),
            &request(30).with_base(base.clone()),
            &mut rng.clone(),
        )
        .unwrap();

        let mut previous = base;
        for day in &days {
            for feature in Feature::ALL {
                let half = daily_noise(feature);
                let expected = constrain(
                    feature,
                    previous.feature(feature).unwrap() + replay.random_range(-half..=half),
                );
                assert_eq!(day.record.feature(feature), Some(expected), "{feature:?} on {}", day.date);
            }
            previous = day.record.clone();
        }
        assert!(
            days.windows(2).any(|pair| pair[0].record != pair[1].record),
            "the walk should move between days"
        );
    }

    #[test]
    fn same_seed_same_forecast() {
        let bundle = humidity_bundle();
        let a = forecast(&bundle, &request(5), &mut StdRng::seed_from_u64(9)).unwrap();
        let b = forecast(&bundle, &request(5), &mut StdRng::seed_from_u64(9)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn base_missing_schema_feature_fails() {
        let base = WeatherRecord::from_features([(Feature::Humidity, 70.0)]);
        let err = forecast(
            &humidity_bundle(),
            &request(3).with_base(base),
            &mut StdRng::seed_from_u64(0),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ForecastError::Record(RecordError::Missing(MissingFeatureError::new("Pressure")))
        );
    }

    #[test]
    fn zero_days_is_empty() {
        let days = forecast(&humidity_bundle(), &request(0), &mut StdRng::seed_from_u64(0)).unwrap();
        assert!(days.is_empty());
    }

    #[test]
    fn wind_direction_wraps() {
        assert_eq!(constrain(Feature::WindDirection, 370.0), 10.0);
        assert_eq!(constrain(Feature::WindDirection, -20.0), 340.0);
        assert_eq!(constrain(Feature::Humidity, 10.0), 30.0);
    }

    #[test]
    fn series_and_table_line_up_with_days() {
        let days = forecast(&humidity_bundle(), &request(4), &mut StdRng::seed_from_u64(5)).unwrap();
        let series = ForecastSeries::from_days(&days).unwrap();
        assert_eq!(series.dates.len(), 4);
        assert_eq!(series.dates[0], "2024-03-01");
        assert_eq!(series.features["Humidity"].len(), 4);
        assert_eq!(series.features.len(), 6);

        let table = forecast_table(&days).unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(table.headers().len(), 2 + 6 + 3);
        assert_eq!(table.rows()[3][0], Cell::Text("2024-03-04".to_string()));
    }
}
