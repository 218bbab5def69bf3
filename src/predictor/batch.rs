use thiserror::Error;

use super::bundle::PredictorBundle;
use super::predict::{PredictionResult, predict_values};
use crate::dataset::{Cell, TableError, WeatherTable};
use crate::weather::{Feature, MissingFeatureError};

/// Column holding the predicted class (0 or 1).
pub const PREDICTED_COLUMN: &str = "Rainfall_Predicted";
/// Column holding the probability of rain.
pub const PROBABILITY_COLUMN: &str = "Rainfall_Probability";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BatchError {
    #[error(transparent)]
    MissingFeature(#[from] MissingFeatureError),
    #[error("Row {row} has no {feature} value")]
    MissingValue { row: usize, feature: Feature },
    #[error(transparent)]
    Table(#[from] TableError),
}

/// Predict every row of `table`, returning it with prediction columns appended.
///
/// Rows keep their input order. A row with a missing or non-numeric feature
/// fails the whole call.
pub fn predict_batch(
    bundle: &PredictorBundle,
    table: &WeatherTable,
) -> Result<WeatherTable, BatchError> {
    let schema = bundle.schema();
    for feature in schema.features() {
        table.require_column(feature.name())?;
    }
    let columns = schema
        .features()
        .iter()
        .map(|feature| table.numeric_column(feature.name()))
        .collect::<Result<Vec<_>, _>>()?;

    let mut predicted = Vec::with_capacity(table.len());
    let mut probability = Vec::with_capacity(table.len());
    let mut rainy = 0usize;
    for row in 0..table.len() {
        let values = schema
            .features()
            .iter()
            .zip(&columns)
            .map(|(&feature, column)| {
                column[row].ok_or(BatchError::MissingValue { row, feature })
            })
            .collect::<Result<Vec<f64>, _>>()?;
        let PredictionResult {
            rainfall_predicted,
            probability: p,
            ..
        } = predict_values(bundle, values);
        if rainfall_predicted {
            rainy += 1;
        }
        predicted.push(Cell::Number(if rainfall_predicted { 1.0 } else { 0.0 }));
        probability.push(Cell::Number(p));
    }

    let out = table
        .clone()
        .with_column(PREDICTED_COLUMN, predicted)?
        .with_column(PROBABILITY_COLUMN, probability)?;
    tracing::info!("Predicted {} rows; {rainy} with rain", out.len());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::bundle::tests::humidity_bundle;

    fn input_table() -> WeatherTable {
        let mut table = WeatherTable::new(["Location", "Humidity", "Pressure"]).unwrap();
        for (location, humidity) in [("Lakeside", 80.0), ("Westport", 40.0), ("Ridgeview", 75.0)] {
            table
                .push_row(vec![
                    Cell::from(location),
                    Cell::Number(humidity),
                    Cell::Number(1000.0),
                ])
                .unwrap();
        }
        table
    }

    #[test]
    fn appends_prediction_columns_in_row_order() {
        let out = predict_batch(&humidity_bundle(), &input_table()).unwrap();
        assert_eq!(
            out.headers(),
            &[
                "Location",
                "Humidity",
                "Pressure",
                PREDICTED_COLUMN,
                PROBABILITY_COLUMN
            ]
        );
        assert_eq!(out.len(), 3);
        let predicted: Vec<_> = out.rows().iter().map(|row| row[3].clone()).collect();
        assert_eq!(
            predicted,
            vec![Cell::Number(1.0), Cell::Number(0.0), Cell::Number(1.0)]
        );
        assert_eq!(out.rows()[1][0], Cell::from("Westport"));
        assert_eq!(out.rows()[1][4], Cell::Number(0.1));
    }

    #[test]
    fn missing_column_is_reported() {
        let mut table = WeatherTable::new(["Humidity"]).unwrap();
        table.push_row(vec![Cell::Number(70.0)]).unwrap();
        let err = predict_batch(&humidity_bundle(), &table).unwrap_err();
        assert_eq!(
            err,
            BatchError::MissingFeature(MissingFeatureError::new("Pressure"))
        );
    }

    #[test]
    fn missing_cell_names_the_row() {
        let mut table = input_table();
        table
            .push_row(vec![Cell::from("Pine Valley"), Cell::Missing, Cell::Number(990.0)])
            .unwrap();
        let err = predict_batch(&humidity_bundle(), &table).unwrap_err();
        assert_eq!(
            err,
            BatchError::MissingValue {
                row: 3,
                feature: Feature::Humidity
            }
        );
    }

    #[test]
    fn empty_table_gets_empty_columns() {
        let table = WeatherTable::new(["Humidity", "Pressure"]).unwrap();
        let out = predict_batch(&humidity_bundle(), &table).unwrap();
        assert!(out.is_empty());
        assert_eq!(out.headers().len(), 4);
    }
}
