use std::path::PathBuf;

use super::*;
use crate::app_dirs::tests::OverrideGuard;
use crate::weather::Feature;
use tempfile::tempdir;

#[test]
fn missing_file_yields_defaults() {
    let dir = tempdir().unwrap();
    let config = load_from(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, RaincastConfig::default());
    assert_eq!(config.training.trees, 100);
    assert_eq!(config.forecast.days, 7);
    assert_eq!(config.data.locations.len(), 5);
}

#[test]
fn partial_file_keeps_defaults_for_other_keys() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(
        &path,
        "[training]\ntrees = 25\n\n[forecast]\nlocation = \"Westport\"\n\n[forecast.base]\nHumidity = 90.0\nPressure = 985.0\n",
    )
    .unwrap();
    let config = load_from(&path).unwrap();
    assert_eq!(config.training.trees, 25);
    assert_eq!(config.training.seed, 42);
    assert_eq!(config.forecast.location, "Westport");
    let base = config.forecast.base.unwrap();
    assert_eq!(base.feature(Feature::Humidity), Some(90.0));
    assert_eq!(config.data.samples, 1000);
}

#[test]
fn out_of_range_values_are_clamped() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(
        &path,
        "[data]\nsamples = 0\nlocations = []\nstart_date = \"soon\"\n\n[training]\ntrees = 0\ntest_fraction = 0.9\nmin_samples_split = 0\n\n[forecast]\ndays = 1000\n",
    )
    .unwrap();
    let config = load_from(&path).unwrap();
    assert_eq!(config.data.samples, 1);
    assert_eq!(config.data.locations.len(), 5);
    assert_eq!(config.data.start_date, "2023-01-01");
    assert_eq!(config.training.trees, 1);
    assert_eq!(config.training.test_fraction, 0.5);
    assert_eq!(config.training.min_samples_split, 2);
    assert_eq!(config.forecast.days, 365);
}

#[test]
fn invalid_toml_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(&path, "[training\ntrees = ").unwrap();
    assert!(matches!(
        load_from(&path),
        Err(ConfigError::ParseToml { .. })
    ));
}

#[test]
fn save_round_trips_through_app_root() {
    let dir = tempdir().unwrap();
    let _guard = OverrideGuard::set(dir.path().to_path_buf());
    let mut config = RaincastConfig::default();
    config.training.max_depth = Some(8);
    config.output.dir = Some(PathBuf::from("runs"));
    save(&config).unwrap();
    let path = config_path().unwrap();
    assert!(path.starts_with(dir.path()));
    assert_eq!(load_or_default().unwrap(), config);
}

#[test]
fn settings_map_to_pipeline_options() {
    let config = RaincastConfig::default();
    let train = config.training.train_options();
    assert_eq!(train.n_trees, 100);
    assert_eq!(train.seed, 42);
    let prep = config.training.prepare_options();
    assert_eq!(prep.test_fraction, 0.2);
    let synth = config.data.synth_options();
    assert_eq!(synth.samples, 1000);
    assert_eq!(synth.start_date, crate::weather::synth::DEFAULT_START_DATE);
}
