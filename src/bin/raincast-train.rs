//! Trains a rainfall bundle from a labeled CSV and reports held-out metrics.

use std::path::PathBuf;

use raincast::config;
use raincast::dataset::read_table;
use raincast::fs_ops::write_json_pretty;
use raincast::pipeline::Pipeline;
use raincast::weather::FeatureSchema;

fn main() {
    raincast::logging::init_or_warn(env!("CARGO_BIN_NAME"));
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    let mut settings = config::load_or_default()
        .map_err(|err| err.to_string())?
        .training;
    if let Some(trees) = options.trees {
        settings.trees = trees.max(1);
    }
    if let Some(seed) = options.seed {
        settings.seed = seed;
    }
    if let Some(fraction) = options.test_fraction {
        settings.test_fraction = fraction;
    }
    if options.max_depth.is_some() {
        settings.max_depth = options.max_depth;
    }
    if let Some(leaf) = options.min_samples_leaf {
        settings.min_samples_leaf = leaf.max(1);
    }

    let table = read_table(&options.data).map_err(|err| err.to_string())?;
    let mut pipeline = Pipeline::new();
    let report = pipeline
        .train(
            &table,
            &FeatureSchema::standard(),
            &settings.prepare_options(),
            &settings.train_options(),
        )
        .map_err(|err| err.to_string())?;
    println!("{report}");
    if let Some(path) = &options.report {
        write_json_pretty(path, report)
            .map_err(|err| format!("Failed to write {}: {err}", path.display()))?;
    }
    pipeline.save(&options.out).map_err(|err| err.to_string())?;
    println!("bundle saved to {}", options.out.display());
    Ok(())
}

#[derive(Debug, Clone)]
struct CliOptions {
    data: PathBuf,
    out: PathBuf,
    report: Option<PathBuf>,
    trees: Option<usize>,
    seed: Option<u64>,
    test_fraction: Option<f64>,
    max_depth: Option<usize>,
    min_samples_leaf: Option<usize>,
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut data: Option<PathBuf> = None;
    let mut out = PathBuf::from("rainfall_bundle.json");
    let mut report = None;
    let mut trees = None;
    let mut seed = None;
    let mut test_fraction = None;
    let mut max_depth = None;
    let mut min_samples_leaf = None;

    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Err(help_text()),
            "--data" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--data requires a value".to_string())?;
                data = Some(PathBuf::from(value));
            }
            "--out" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--out requires a value".to_string())?;
                out = PathBuf::from(value);
            }
            "--report" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--report requires a value".to_string())?;
                report = Some(PathBuf::from(value));
            }
            "--trees" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--trees requires a value".to_string())?;
                trees = Some(
                    value
                        .parse::<usize>()
                        .map_err(|_| format!("Invalid --trees value: {value}"))?,
                );
            }
            "--seed" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--seed requires a value".to_string())?;
                seed = Some(
                    value
                        .parse::<u64>()
                        .map_err(|_| format!("Invalid --seed value: {value}"))?,
                );
            }
            "--test-fraction" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--test-fraction requires a value".to_string())?;
                test_fraction = Some(
                    value
                        .parse::<f64>()
                        .map_err(|_| format!("Invalid --test-fraction value: {value}"))?,
                );
            }
            "--max-depth" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--max-depth requires a value".to_string())?;
                max_depth = Some(
                    value
                        .parse::<usize>()
                        .map_err(|_| format!("Invalid --max-depth value: {value}"))?,
                );
            }
            "--min-samples-leaf" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--min-samples-leaf requires a value".to_string())?;
                min_samples_leaf = Some(
                    value
                        .parse::<usize>()
                        .map_err(|_| format!("Invalid --min-samples-leaf value: {value}"))?,
                );
            }
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }

    let data = data.ok_or_else(help_text)?;
    Ok(CliOptions {
        data,
        out,
        report,
        trees,
        seed,
        test_fraction,
        max_depth,
        min_samples_leaf,
    })
}

fn help_text() -> String {
    [
        "raincast-train",
        "",
        "Trains a seeded random-forest rainfall classifier and saves it as a bundle.",
        "",
        "Usage:",
        "  raincast-train --data <csv> [--out rainfall_bundle.json] [options]",
        "",
        "Options:",
        "  --data <csv>             Labeled dataset with a Rainfall column (required).",
        "  --out <file>             Output bundle path (default: rainfall_bundle.json).",
        "  --report <file>          Also write the evaluation report as JSON.",
        "  --trees <n>              Number of trees (default: config or 100).",
        "  --seed <u64>             Split and training seed (default: config or 42).",
        "  --test-fraction <f64>    Held-out fraction (default: config or 0.2).",
        "  --max-depth <n>          Maximum tree depth (default: unlimited).",
        "  --min-samples-leaf <n>   Minimum rows per leaf (default: config or 1).",
    ]
    .join("\n")
}
