//! Generates a multi-day rainfall forecast from a saved bundle.

use std::path::PathBuf;

use rand::SeedableRng;
use rand::rngs::StdRng;
use raincast::dataset::write_table;
use raincast::fs_ops::write_json_pretty;
use raincast::pipeline::Pipeline;
use raincast::predictor::{ForecastRequest, ForecastSeries, forecast_table};
use raincast::weather::{WeatherRecord, parse_date};

fn main() {
    raincast::logging::init_or_warn(env!("CARGO_BIN_NAME"));
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    let settings = raincast::config::load_or_default()
        .map_err(|err| err.to_string())?
        .forecast;
    let location = options.location.unwrap_or(settings.location);
    let days = options.days.unwrap_or(settings.days);
    let mut request = match options.start_date {
        Some(date) => ForecastRequest::new(location, days, date),
        None => ForecastRequest::starting_today(location, days),
    };
    request.base = options.base.or(settings.base);
    let mut rng = match options.seed.or(settings.seed) {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let mut pipeline = Pipeline::new();
    pipeline
        .load(&options.bundle)
        .map_err(|err| err.to_string())?;
    let days = pipeline
        .forecast(&request, &mut rng)
        .map_err(|err| err.to_string())?;

    for day in &days {
        println!(
            "{}  {:<12}  rain={:<5}  probability={:.3}  confidence={:.3}",
            day.date,
            day.location,
            day.prediction.rainfall_predicted,
            day.prediction.probability,
            day.prediction.confidence
        );
    }
    if let Some(path) = &options.out {
        let table = forecast_table(&days).map_err(|err| err.to_string())?;
        write_table(&table, path).map_err(|err| err.to_string())?;
    }
    if let Some(path) = &options.series {
        let series = ForecastSeries::from_days(&days).map_err(|err| err.to_string())?;
        write_json_pretty(path, &series)
            .map_err(|err| format!("Failed to write {}: {err}", path.display()))?;
    }
    Ok(())
}

#[derive(Debug, Clone)]
struct CliOptions {
    bundle: PathBuf,
    days: Option<usize>,
    location: Option<String>,
    start_date: Option<time::Date>,
    base: Option<WeatherRecord>,
    seed: Option<u64>,
    out: Option<PathBuf>,
    series: Option<PathBuf>,
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut options = CliOptions {
        bundle: PathBuf::from("rainfall_bundle.json"),
        days: None,
        location: None,
        start_date: None,
        base: None,
        seed: None,
        out: None,
        series: None,
    };

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
            "--bundle" => options.bundle = PathBuf::from(value),
            "--days" => {
                options.days = Some(
                    value
                        .parse::<usize>()
                        .map_err(|_| format!("Invalid --days value: {value}"))?,
                )
            }
            "--location" => options.location = Some(value.clone()),
            "--start-date" => {
                options.start_date = Some(
                    parse_date(value).map_err(|_| format!("Invalid --start-date value: {value}"))?,
                )
            }
            "--base" => {
                options.base = Some(
                    value
                        .parse::<WeatherRecord>()
                        .map_err(|err| format!("Invalid --base value: {err}"))?,
                )
            }
            "--seed" => {
                options.seed = Some(
                    value
                        .parse::<u64>()
                        .map_err(|_| format!("Invalid --seed value: {value}"))?,
                )
            }
            "--out" => options.out = Some(PathBuf::from(value)),
            "--series" => options.series = Some(PathBuf::from(value)),
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }
    Ok(options)
}

fn help_text() -> String {
    [
        "raincast-forecast",
        "",
        "Simulates daily weather from a starting observation and predicts rain for each day.",
        "",
        "Usage:",
        "  raincast-forecast [--bundle file] [options]",
        "",
        "Options:",
        "  --bundle <file>       Bundle path (default: rainfall_bundle.json).",
        "  --days <n>            Number of days (default: config or 7).",
        "  --location <name>     Location label (default: config or Harbor City).",
        "  --start-date <date>   First day, YYYY-MM-DD (default: today).",
        "  --base <pairs>        Starting observation, e.g. Humidity=80,Pressure=1000,...",
        "  --seed <u64>          Noise seed (default: config or random).",
        "  --out <csv>           Write the forecast table.",
        "  --series <json>       Write the plotting series.",
    ]
    .join("\n")
}
