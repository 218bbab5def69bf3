//! Synthetic labeled weather data for demos and tests.
//!
//! Features are drawn uniformly from plausible ranges and the rainfall label is a
//! Bernoulli draw whose probability rises with humidity and falls with pressure:
//! `p = 0.3 + 0.5 * (humidity / 100) - 0.3 * ((pressure - 980) / 60)`, clipped to `[0, 1]`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use time::{Date, Duration, macros::date};

use super::{DATE_COLUMN, Feature, LABEL_COLUMN, LOCATION_COLUMN, format_date};
use crate::dataset::{Cell, WeatherTable};

/// Default first observation date.
pub const DEFAULT_START_DATE: Date = date!(2023 - 01 - 01);

/// Uniform sampling range for each synthesized feature.
pub fn feature_range(feature: Feature) -> (f64, f64) {
    match feature {
        Feature::Humidity => (30.0, 100.0),
        Feature::Temperature => (0.0, 35.0),
        Feature::Pressure => (980.0, 1040.0),
        Feature::WindSpeed => (0.0, 50.0),
        Feature::WindDirection => (0.0, 360.0),
        Feature::CloudCover => (0.0, 100.0),
    }
}

/// Probability of rain used to label a synthesized observation.
pub fn rainfall_probability(humidity: f64, pressure: f64) -> f64 {
    (0.3 + 0.5 * (humidity / 100.0) - 0.3 * ((pressure - 980.0) / 60.0)).clamp(0.0, 1.0)
}

/// Parameters for [`synthesize`].
#[derive(Debug, Clone, PartialEq)]
pub struct SynthOptions {
    /// Number of daily observations.
    pub samples: usize,
    /// Date of the first observation; later rows advance one day each.
    pub start_date: Date,
    /// Locations assigned uniformly at random to rows.
    pub locations: Vec<String>,
}

impl Default for SynthOptions {
    fn default() -> Self {
        Self {
            samples: 1000,
            start_date: DEFAULT_START_DATE,
            locations: default_locations(),
        }
    }
}

pub fn default_locations() -> Vec<String> {
    ["Harbor City", "Ridgeview", "Lakeside", "Pine Valley", "Westport"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Column order of synthesized tables.
pub fn synth_headers() -> Vec<&'static str> {
    let mut headers = vec![DATE_COLUMN, LOCATION_COLUMN];
    headers.extend(Feature::ALL.iter().map(|feature| feature.name()));
    headers.push(LABEL_COLUMN);
    headers
}

/// Generate a labeled table from an explicit randomness source.
pub fn synthesize<R: Rng + ?Sized>(options: &SynthOptions, rng: &mut R) -> WeatherTable {
    let mut rows = Vec::with_capacity(options.samples);
    for idx in 0..options.samples {
        let date = options
            .start_date
            .checked_add(Duration::days(idx as i64))
            .and_then(|date| format_date(date).ok())
            .map(Cell::Text)
            .unwrap_or(Cell::Missing);
        let location = if options.locations.is_empty() {
            Cell::Missing
        } else {
            Cell::Text(options.locations[rng.random_range(0..options.locations.len())].clone())
        };
        let mut row = vec![date, location];
        let mut humidity = 0.0;
        let mut pressure = 0.0;
        for feature in Feature::ALL {
            let (low, high) = feature_range(feature);
            let value = rng.random_range(low..high);
            match feature {
                Feature::Humidity => humidity = value,
                Feature::Pressure => pressure = value,
                _ => {}
            }
            row.push(Cell::Number(value));
        }
        let rained = rng.random::<f64>() < rainfall_probability(humidity, pressure);
        row.push(Cell::Number(if rained { 1.0 } else { 0.0 }));
        rows.push(row);
    }

    let table = WeatherTable::from_trusted_parts(
        synth_headers().into_iter().map(String::from).collect(),
        rows,
    );
    tracing::info!(
        "Synthesized {} weather observations across {} locations",
        table.len(),
        options.locations.len()
    );
    table
}

/// Generate the reproducible demo dataset for `seed`.
pub fn synthesize_seeded(options: &SynthOptions, seed: u64) -> WeatherTable {
    let mut rng = StdRng::seed_from_u64(seed);
    synthesize(options, &mut rng)
}
