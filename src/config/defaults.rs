use time::Date;

use crate::weather::format_date;
use crate::weather::synth::{DEFAULT_START_DATE, default_locations};

pub(super) const MAX_SAMPLES: usize = 1_000_000;
pub(super) const MAX_TREES: usize = 1_000;
pub(super) const MAX_FORECAST_DAYS: usize = 365;

pub(super) fn default_samples() -> usize {
    1_000
}

pub(super) fn default_seed() -> u64 {
    42
}

pub(super) fn default_location_list() -> Vec<String> {
    default_locations()
}

pub(super) fn default_start_date() -> String {
    format_date(DEFAULT_START_DATE).unwrap_or_default()
}

pub(super) fn default_start_date_value() -> Date {
    DEFAULT_START_DATE
}

pub(super) fn default_trees() -> usize {
    100
}

pub(super) fn default_test_fraction() -> f64 {
    0.2
}

pub(super) fn default_min_samples_split() -> usize {
    2
}

pub(super) fn default_min_samples_leaf() -> usize {
    1
}

pub(super) fn default_forecast_days() -> usize {
    7
}

pub(super) fn default_forecast_location() -> String {
    "Harbor City".to_string()
}

pub(super) fn clamp_test_fraction(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.05, 0.5)
    } else {
        default_test_fraction()
    }
}
