//! Writes a synthetic labeled weather dataset to CSV.

use std::path::PathBuf;

use raincast::dataset::write_table;
use raincast::weather::parse_date;
use raincast::weather::synth::{SynthOptions, synthesize_seeded};

fn main() {
    raincast::logging::init_or_warn(env!("CARGO_BIN_NAME"));
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    let table = synthesize_seeded(&options.synth, options.seed);
    write_table(&table, &options.out).map_err(|err| err.to_string())?;
    println!(
        "wrote {} rows to {}",
        table.len(),
        options.out.display()
    );
    Ok(())
}

#[derive(Debug, Clone)]
struct CliOptions {
    out: PathBuf,
    seed: u64,
    synth: SynthOptions,
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut out = PathBuf::from("weather_data.csv");
    let mut seed = 42u64;
    let mut synth = SynthOptions::default();

    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Err(help_text()),
            "--out" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--out requires a value".to_string())?;
                out = PathBuf::from(value);
            }
            "--samples" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--samples requires a value".to_string())?;
                synth.samples = value
                    .parse::<usize>()
                    .map_err(|_| format!("Invalid --samples value: {value}"))?;
            }
            "--seed" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--seed requires a value".to_string())?;
                seed = value
                    .parse::<u64>()
                    .map_err(|_| format!("Invalid --seed value: {value}"))?;
            }
            "--start-date" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--start-date requires a value".to_string())?;
                synth.start_date =
                    parse_date(value).map_err(|_| format!("Invalid --start-date value: {value}"))?;
            }
            "--locations" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--locations requires a value".to_string())?;
                synth.locations = value
                    .split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(String::from)
                    .collect();
            }
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }

    Ok(CliOptions { out, seed, synth })
}

fn help_text() -> String {
    [
        "raincast-synth",
        "",
        "Generates a labeled daily weather dataset from a seeded random source.",
        "",
        "Usage:",
        "  raincast-synth [--out weather_data.csv] [options]",
        "",
        "Options:",
        "  --out <file>          Output CSV path (default: weather_data.csv).",
        "  --samples <n>         Number of daily rows (default: 1000).",
        "  --seed <u64>          Random seed (default: 42).",
        "  --start-date <date>   First date, YYYY-MM-DD (default: 2023-01-01).",
        "  --locations <list>    Comma-separated location names.",
    ]
    .join("\n")
}
