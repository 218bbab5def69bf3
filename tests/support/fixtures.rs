use raincast::dataset::WeatherTable;
use raincast::ml::forest::TrainOptions;
use raincast::pipeline::Pipeline;
use raincast::prep::PrepareOptions;
use raincast::weather::synth::{SynthOptions, synthesize_seeded};
use raincast::weather::{Feature, FeatureSchema, WeatherRecord};

/// Humid, low-pressure observation that should read as rain.
pub fn humid_low_pressure() -> WeatherRecord {
    WeatherRecord::from_features([
        (Feature::Humidity, 85.0),
        (Feature::Temperature, 22.0),
        (Feature::Pressure, 1005.0),
        (Feature::WindSpeed, 25.0),
        (Feature::WindDirection, 220.0),
        (Feature::CloudCover, 70.0),
    ])
}

pub fn synthetic_table(samples: usize, seed: u64) -> WeatherTable {
    synthesize_seeded(
        &SynthOptions {
            samples,
            ..SynthOptions::default()
        },
        seed,
    )
}

/// Session trained on synthetic data with the given forest options.
pub fn trained_pipeline(samples: usize, options: &TrainOptions) -> Pipeline {
    let table = synthetic_table(samples, 42);
    let mut pipeline = Pipeline::new();
    pipeline
        .train(
            &table,
            &FeatureSchema::standard(),
            &PrepareOptions::default(),
            options,
        )
        .expect("train pipeline");
    pipeline
}

/// Small, quick forest for tests that only need a valid bundle.
pub fn quick_pipeline() -> Pipeline {
    trained_pipeline(
        300,
        &TrainOptions {
            n_trees: 15,
            ..TrainOptions::default()
        },
    )
}
