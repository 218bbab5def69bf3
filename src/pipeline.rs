//! Session state for the command-line tools.
//!
//! The core functions are stateless; [`Pipeline`] only remembers the current bundle
//! so callers get [`PipelineError::UntrainedModel`] instead of a panic when they
//! predict before training or loading.

use std::path::Path;
use std::time::Instant;

use rand::Rng;
use thiserror::Error;

use crate::dataset::{DataLoadError, DataWriteError, WeatherTable};
use crate::ml::evaluate::{EvaluationReport, RAINFALL_CLASSES, evaluate};
use crate::ml::forest::{TrainError, TrainOptions, train_random_forest};
use crate::predictor::{
    BatchError, BundleError, ForecastDay, ForecastError, ForecastRequest, PersistenceError,
    PredictionResult, PredictorBundle, forecast, predict, predict_batch,
};
use crate::prep::{PrepareError, PrepareOptions, PreparedData, prepare};
use crate::weather::{FeatureSchema, RecordError, WeatherRecord};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("No model has been trained or loaded")]
    UntrainedModel,
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error(transparent)]
    Load(#[from] DataLoadError),
    #[error(transparent)]
    Write(#[from] DataWriteError),
    #[error(transparent)]
    Prepare(#[from] PrepareError),
    #[error(transparent)]
    Train(#[from] TrainError),
    #[error(transparent)]
    Bundle(#[from] BundleError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Batch(#[from] BatchError),
    #[error(transparent)]
    Forecast(#[from] ForecastError),
}

/// Fit a forest on prepared data and score it on the held-out rows.
pub fn train_bundle(
    prepared: &PreparedData,
    options: &TrainOptions,
) -> Result<(PredictorBundle, EvaluationReport), PipelineError> {
    let started = Instant::now();
    let model = train_random_forest(
        prepared.train_x.view(),
        &prepared.train_y,
        RAINFALL_CLASSES.len(),
        options,
    )?;
    tracing::info!(
        "Trained {} trees in {:.2?}",
        model.trees.len(),
        started.elapsed()
    );
    let report = evaluate(
        &model,
        prepared.test_x.view(),
        &prepared.test_y,
        &RAINFALL_CLASSES,
        &prepared.schema.names(),
    );
    tracing::info!("Test accuracy: {:.4}", report.accuracy);
    let bundle = PredictorBundle::new(prepared.schema.clone(), prepared.scaler.clone(), model)?;
    Ok((bundle, report))
}

/// Holds the bundle in use, if any.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    bundle: Option<PredictorBundle>,
    report: Option<EvaluationReport>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bundle(bundle: PredictorBundle) -> Self {
        Self {
            bundle: Some(bundle),
            report: None,
        }
    }

    pub fn is_trained(&self) -> bool {
        self.bundle.is_some()
    }

    pub fn bundle(&self) -> Result<&PredictorBundle, PipelineError> {
        self.bundle.as_ref().ok_or(PipelineError::UntrainedModel)
    }

    /// Evaluation of the most recent training run in this session.
    pub fn report(&self) -> Option<&EvaluationReport> {
        self.report.as_ref()
    }

    /// Prepare `table`, train, evaluate and replace the current bundle.
    ///
    /// The previous bundle is kept if any step fails.
    pub fn train(
        &mut self,
        table: &WeatherTable,
        schema: &FeatureSchema,
        prepare_options: &PrepareOptions,
        train_options: &TrainOptions,
    ) -> Result<&EvaluationReport, PipelineError> {
        let prepared = prepare(table, schema, prepare_options)?;
        let (bundle, report) = train_bundle(&prepared, train_options)?;
        self.bundle = Some(bundle);
        Ok(self.report.insert(report))
    }

    pub fn save(&self, path: &Path) -> Result<(), PipelineError> {
        self.bundle()?.save(path)?;
        Ok(())
    }

    /// Replace the current bundle with one read from `path`.
    ///
    /// On failure the session is left exactly as it was.
    pub fn load(&mut self, path: &Path) -> Result<(), PipelineError> {
        let bundle = PredictorBundle::load(path)?;
        self.bundle = Some(bundle);
        self.report = None;
        Ok(())
    }

    pub fn predict(&self, record: &WeatherRecord) -> Result<PredictionResult, PipelineError> {
        Ok(predict(self.bundle()?, record)?)
    }

    pub fn predict_batch(&self, table: &WeatherTable) -> Result<WeatherTable, PipelineError> {
        Ok(predict_batch(self.bundle()?, table)?)
    }

    pub fn forecast<R: Rng + ?Sized>(
        &self,
        request: &ForecastRequest,
        rng: &mut R,
    ) -> Result<Vec<ForecastDay>, PipelineError> {
        Ok(forecast(self.bundle()?, request, rng)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weather::synth::{SynthOptions, synthesize_seeded};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use time::macros::date;

    fn small_options() -> TrainOptions {
        TrainOptions {
            n_trees: 10,
            ..TrainOptions::default()
        }
    }

    fn trained() -> Pipeline {
        let table = synthesize_seeded(
            &SynthOptions {
                samples: 200,
                ..SynthOptions::default()
            },
            42,
        );
        let mut pipeline = Pipeline::new();
        pipeline
            .train(
                &table,
                &FeatureSchema::standard(),
                &PrepareOptions::default(),
                &small_options(),
            )
            .unwrap();
        pipeline
    }

    #[test]
    fn untrained_session_refuses_to_predict() {
        let pipeline = Pipeline::new();
        assert!(!pipeline.is_trained());
        assert!(matches!(
            pipeline.predict(&crate::predictor::climate_normals()),
            Err(PipelineError::UntrainedModel)
        ));
        let request = ForecastRequest::new("Lakeside", 3, date!(2024 - 01 - 01));
        assert!(matches!(
            pipeline.forecast(&request, &mut StdRng::seed_from_u64(0)),
            Err(PipelineError::UntrainedModel)
        ));
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            pipeline.save(&dir.path().join("bundle.json")),
            Err(PipelineError::UntrainedModel)
        ));
    }

    #[test]
    fn training_produces_report_and_bundle() {
        let pipeline = trained();
        let report = pipeline.report().unwrap();
        assert_eq!(report.confusion.total(), 40);
        assert!((0.0..=1.0).contains(&report.accuracy));
        let result = pipeline.predict(&crate::predictor::climate_normals()).unwrap();
        assert!((0.0..=1.0).contains(&result.probability));
    }

    #[test]
    fn failed_load_keeps_current_bundle() {
        let mut pipeline = trained();
        let before = pipeline.bundle().unwrap().clone();
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, b"[]").unwrap();
        assert!(matches!(
            pipeline.load(&bad),
            Err(PipelineError::Persistence(_))
        ));
        assert_eq!(pipeline.bundle().unwrap(), &before);
    }
}
