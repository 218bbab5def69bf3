//! Full raincast run: data, training, evaluation, persistence, prediction and forecast.

use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand::rngs::StdRng;
use raincast::config::{self, RaincastConfig};
use raincast::dataset::{read_table, write_table};
use raincast::fs_ops::write_json_pretty;
use raincast::logging;
use raincast::pipeline::Pipeline;
use raincast::predictor::{ForecastRequest, ForecastSeries, forecast_table};
use raincast::weather::synth::synthesize_seeded;
use raincast::weather::{Feature, FeatureSchema, WeatherRecord};

const DATASET_FILE: &str = "weather_data.csv";
const BUNDLE_FILE: &str = "rainfall_bundle.json";
const EVALUATION_FILE: &str = "evaluation.json";
const FORECAST_CSV_FILE: &str = "forecast.csv";
const FORECAST_SERIES_FILE: &str = "forecast_series.json";

fn main() {
    logging::init_or_warn(env!("CARGO_BIN_NAME"));
    if let Err(err) = run() {
        tracing::error!("{err}");
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    let config = load_config(options.config.as_deref())?;
    let settings = options.apply(config);
    let out_dir = match &settings.output.dir {
        Some(dir) => dir.clone(),
        None => raincast::app_dirs::default_output_dir()?,
    };
    std::fs::create_dir_all(&out_dir)?;

    let table = match &settings.data.input {
        Some(path) => read_table(path)?,
        None => synthesize_seeded(&settings.data.synth_options(), settings.data.seed),
    };
    write_table(&table, &out_dir.join(DATASET_FILE))?;

    let mut pipeline = Pipeline::new();
    let report = pipeline.train(
        &table,
        &FeatureSchema::standard(),
        &settings.training.prepare_options(),
        &settings.training.train_options(),
    )?;
    println!("{report}");
    write_json_pretty(&out_dir.join(EVALUATION_FILE), report)?;

    let bundle_path = out_dir.join(BUNDLE_FILE);
    pipeline.save(&bundle_path)?;
    let mut session = Pipeline::new();
    session.load(&bundle_path)?;

    let sample = WeatherRecord::from_features([
        (Feature::Humidity, 85.0),
        (Feature::Temperature, 22.0),
        (Feature::Pressure, 1005.0),
        (Feature::WindSpeed, 25.0),
        (Feature::WindDirection, 180.0),
        (Feature::CloudCover, 80.0),
    ]);
    let prediction = session.predict(&sample)?;
    println!(
        "sample prediction: rain={} probability={:.3} confidence={:.3}",
        prediction.rainfall_predicted, prediction.probability, prediction.confidence
    );

    let mut request = ForecastRequest::starting_today(
        settings.forecast.location.clone(),
        settings.forecast.days,
    );
    request.base = settings.forecast.base.clone();
    let mut rng = match settings.forecast.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let days = session.forecast(&request, &mut rng)?;
    println!("{}-day forecast for {}:", days.len(), request.location);
    for day in &days {
        println!(
            "  {}  rain={:<5}  probability={:.3}",
            day.date,
            day.prediction.rainfall_predicted,
            day.prediction.probability
        );
    }
    write_table(&forecast_table(&days)?, &out_dir.join(FORECAST_CSV_FILE))?;
    write_json_pretty(
        &out_dir.join(FORECAST_SERIES_FILE),
        &ForecastSeries::from_days(&days)?,
    )?;

    tracing::info!("Wrote run outputs to {}", out_dir.display());
    println!("outputs written to {}", out_dir.display());
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<RaincastConfig, config::ConfigError> {
    match path {
        Some(path) => config::load_from(path),
        None => config::load_or_default(),
    }
}

#[derive(Debug, Clone, Default)]
struct CliOptions {
    config: Option<PathBuf>,
    data: Option<PathBuf>,
    out: Option<PathBuf>,
    samples: Option<usize>,
    seed: Option<u64>,
    days: Option<usize>,
    location: Option<String>,
    forecast_seed: Option<u64>,
}

impl CliOptions {
    /// Flags win over config values.
    fn apply(&self, mut config: RaincastConfig) -> RaincastConfig {
        if let Some(data) = &self.data {
            config.data.input = Some(data.clone());
        }
        if let Some(out) = &self.out {
            config.output.dir = Some(out.clone());
        }
        if let Some(samples) = self.samples {
            config.data.samples = samples;
        }
        if let Some(seed) = self.seed {
            config.data.seed = seed;
            config.training.seed = seed;
        }
        if let Some(days) = self.days {
            config.forecast.days = days;
        }
        if let Some(location) = &self.location {
            config.forecast.location = location.clone();
        }
        if self.forecast_seed.is_some() {
            config.forecast.seed = self.forecast_seed;
        }
        config.normalized()
    }
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut options = CliOptions::default();
    let mut idx = 0usize;
    while idx < args.len() {
        let flag = args[idx].as_str();
        if matches!(flag, "-h" | "--help") {
            return Err(help_text());
        }
        idx += 1;
        let value = args
            .get(idx)
            .ok_or_else(|| format!("{flag} requires a value"))?;
        match flag {
            "--config" => options.config = Some(PathBuf::from(value)),
            "--data" => options.data = Some(PathBuf::from(value)),
            "--out" => options.out = Some(PathBuf::from(value)),
            "--samples" => options.samples = Some(parse_number(flag, value)?),
            "--seed" => options.seed = Some(parse_number(flag, value)?),
            "--days" => options.days = Some(parse_number(flag, value)?),
            "--location" => options.location = Some(value.clone()),
            "--forecast-seed" => options.forecast_seed = Some(parse_number(flag, value)?),
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }
    Ok(options)
}

fn parse_number<T: std::str::FromStr>(flag: &str, value: &str) -> Result<T, String> {
    value
        .parse::<T>()
        .map_err(|_| format!("Invalid {flag} value: {value}"))
}

fn help_text() -> String {
    [
        "raincast",
        "",
        "Trains a rainfall classifier, evaluates it, saves the bundle and writes a forecast.",
        "",
        "Usage:",
        "  raincast [options]",
        "",
        "Options:",
        "  --config <file>         Config file (default: <app root>/raincast.toml).",
        "  --data <csv>            Labeled dataset; synthesized when omitted.",
        "  --out <dir>             Output directory (default: <app root>/output).",
        "  --samples <n>           Rows to synthesize (default: 1000).",
        "  --seed <u64>            Seed for synthesis, split and training (default: 42).",
        "  --days <n>              Forecast length in days (default: 7).",
        "  --location <name>       Forecast location (default: Harbor City).",
        "  --forecast-seed <u64>   Seed for forecast noise (default: random).",
    ]
    .join("\n")
}
