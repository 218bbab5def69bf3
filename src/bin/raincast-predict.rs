//! Predicts rainfall for one record or every row of a CSV using a saved bundle.

use std::path::PathBuf;

use raincast::dataset::{read_table, write_table};
use raincast::pipeline::Pipeline;
use raincast::weather::WeatherRecord;

fn main() {
    raincast::logging::init_or_warn(env!("CARGO_BIN_NAME"));
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    let mut pipeline = Pipeline::new();
    pipeline
        .load(&options.bundle)
        .map_err(|err| err.to_string())?;

    match options.mode {
        Mode::Record(record) => {
            let result = pipeline.predict(&record).map_err(|err| err.to_string())?;
            println!(
                "{}",
                serde_json::to_string_pretty(&result).map_err(|err| err.to_string())?
            );
        }
        Mode::Batch { input, out } => {
            let table = read_table(&input).map_err(|err| err.to_string())?;
            let predicted = pipeline
                .predict_batch(&table)
                .map_err(|err| err.to_string())?;
            write_table(&predicted, &out).map_err(|err| err.to_string())?;
            println!("wrote {} predictions to {}", predicted.len(), out.display());
        }
    }
    Ok(())
}

#[derive(Debug, Clone)]
enum Mode {
    Record(WeatherRecord),
    Batch { input: PathBuf, out: PathBuf },
}

#[derive(Debug, Clone)]
struct CliOptions {
    bundle: PathBuf,
    mode: Mode,
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut bundle = PathBuf::from("rainfall_bundle.json");
    let mut record: Option<WeatherRecord> = None;
    let mut input: Option<PathBuf> = None;
    let mut out = PathBuf::from("predictions.csv");

    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Err(help_text()),
            "--bundle" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--bundle requires a value".to_string())?;
                bundle = PathBuf::from(value);
            }
            "--record" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--record requires a value".to_string())?;
                record = Some(
                    value
                        .parse::<WeatherRecord>()
                        .map_err(|err| format!("Invalid --record value: {err}"))?,
                );
            }
            "--input" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--input requires a value".to_string())?;
                input = Some(PathBuf::from(value));
            }
            "--out" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--out requires a value".to_string())?;
                out = PathBuf::from(value);
            }
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }

    let mode = match (record, input) {
        (Some(record), None) => Mode::Record(record),
        (None, Some(input)) => Mode::Batch { input, out },
        (Some(_), Some(_)) => return Err("Use either --record or --input, not both".to_string()),
        (None, None) => return Err(help_text()),
    };
    Ok(CliOptions { bundle, mode })
}

fn help_text() -> String {
    [
        "raincast-predict",
        "",
        "Predicts rainfall with a saved bundle.",
        "",
        "Usage:",
        "  raincast-predict --record Humidity=85,Temperature=22,... [--bundle file]",
        "  raincast-predict --input <csv> [--out predictions.csv] [--bundle file]",
        "",
        "Options:",
        "  --bundle <file>   Bundle path (default: rainfall_bundle.json).",
        "  --record <pairs>  Comma-separated name=value pairs for one observation.",
        "  --input <csv>     Table to predict; extra columns are kept.",
        "  --out <csv>       Output for --input (default: predictions.csv).",
    ]
    .join("\n")
}
