//! Turning a labeled weather table into standardized train/test matrices.
//!
//! Missing feature cells are filled with the column mean of the whole table, test
//! rows included, before the split. The scaler is then fit on the training rows only.

use ndarray::Array2;
use thiserror::Error;

use crate::dataset::{TableError, WeatherTable};
use crate::ml::scaler::StandardScaler;
use crate::ml::split::{SplitError, train_test_split};
use crate::weather::{Feature, FeatureSchema, LABEL_COLUMN, MissingFeatureError};

/// Split parameters for [`prepare`].
#[derive(Debug, Clone, PartialEq)]
pub struct PrepareOptions {
    /// Fraction of rows held out for evaluation.
    pub test_fraction: f64,
    /// Seed for the row shuffle.
    pub seed: u64,
}

impl Default for PrepareOptions {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PrepareError {
    #[error(transparent)]
    MissingFeature(#[from] MissingFeatureError),
    #[error("Dataset has no Rainfall column")]
    MissingLabelColumn,
    #[error("Dataset has no rows")]
    Empty,
    #[error(transparent)]
    Table(#[from] TableError),
    #[error("Row {row} has no Rainfall value")]
    MissingLabel { row: usize },
    #[error("Row {row} has Rainfall value {value}; expected 0 or 1")]
    InvalidLabel { row: usize, value: f64 },
    #[error("Feature {0} has no values to impute from")]
    AllMissing(Feature),
    #[error(transparent)]
    Split(#[from] SplitError),
}

/// Standardized partitions plus the scaler fit on the training rows.
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub train_x: Array2<f64>,
    pub test_x: Array2<f64>,
    pub train_y: Vec<usize>,
    pub test_y: Vec<usize>,
    pub scaler: StandardScaler,
    pub schema: FeatureSchema,
}

/// Validate, impute, split and standardize `table` for `schema`.
pub fn prepare(
    table: &WeatherTable,
    schema: &FeatureSchema,
    options: &PrepareOptions,
) -> Result<PreparedData, PrepareError> {
    for feature in schema.features() {
        table.require_column(feature.name())?;
    }
    if table.column_index(LABEL_COLUMN).is_none() {
        return Err(PrepareError::MissingLabelColumn);
    }
    if table.is_empty() {
        return Err(PrepareError::Empty);
    }

    let x = imputed_feature_matrix(table, schema)?;
    let y = labels(table)?;
    let split = train_test_split(table.len(), options.test_fraction, options.seed)?;

    let train_raw = x.select(ndarray::Axis(0), &split.train);
    let test_raw = x.select(ndarray::Axis(0), &split.test);
    let scaler = StandardScaler::fit(train_raw.view()).ok_or(PrepareError::Empty)?;
    let train_y = split.train.iter().map(|&i| y[i]).collect();
    let test_y = split.test.iter().map(|&i| y[i]).collect();

    tracing::info!(
        "Prepared {} training and {} test rows over {} features",
        split.train.len(),
        split.test.len(),
        schema.len()
    );
    Ok(PreparedData {
        train_x: scaler.transform(train_raw.view()),
        test_x: scaler.transform(test_raw.view()),
        train_y,
        test_y,
        scaler,
        schema: schema.clone(),
    })
}

/// Feature matrix in schema order with missing cells replaced by column means.
fn imputed_feature_matrix(
    table: &WeatherTable,
    schema: &FeatureSchema,
) -> Result<Array2<f64>, PrepareError> {
    let rows = table.len();
    let mut x = Array2::<f64>::zeros((rows, schema.len()));
    for (col, &feature) in schema.features().iter().enumerate() {
        let values = table.numeric_column(feature.name())?;
        let present: Vec<f64> = values.iter().flatten().copied().collect();
        if present.is_empty() {
            return Err(PrepareError::AllMissing(feature));
        }
        let missing = rows - present.len();
        let mean = present.iter().sum::<f64>() / present.len() as f64;
        if missing > 0 {
            tracing::warn!("Imputing {missing} missing {feature} values with mean {mean:.3}");
        }
        for (row, value) in values.into_iter().enumerate() {
            x[[row, col]] = value.unwrap_or(mean);
        }
    }
    Ok(x)
}

fn labels(table: &WeatherTable) -> Result<Vec<usize>, PrepareError> {
    table
        .numeric_column(LABEL_COLUMN)?
        .into_iter()
        .enumerate()
        .map(|(row, value)| match value {
            None => Err(PrepareError::MissingLabel { row }),
            Some(v) if v == 0.0 => Ok(0),
            Some(v) if v == 1.0 => Ok(1),
            Some(value) => Err(PrepareError::InvalidLabel { row, value }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Cell;

    fn table_with(rows: &[[Option<f64>; 3]]) -> WeatherTable {
        let mut table = WeatherTable::new(["Humidity", "Pressure", "Rainfall"]).unwrap();
        for row in rows {
            table
                .push_row(
                    row.iter()
                        .map(|v| v.map(Cell::Number).unwrap_or(Cell::Missing))
                        .collect(),
                )
                .unwrap();
        }
        table
    }

    fn two_feature_schema() -> FeatureSchema {
        FeatureSchema::new(vec![Feature::Humidity, Feature::Pressure]).unwrap()
    }

    fn ten_rows() -> Vec<[Option<f64>; 3]> {
        (0..10)
            .map(|i| {
                [
                    Some(50.0 + i as f64),
                    Some(1000.0 + 2.0 * i as f64),
                    Some((i % 2) as f64),
                ]
            })
            .collect()
    }

    #[test]
    fn missing_feature_column_is_reported() {
        let table = table_with(&ten_rows());
        let err = prepare(&table, &FeatureSchema::standard(), &PrepareOptions::default())
            .unwrap_err();
        assert_eq!(
            err,
            PrepareError::MissingFeature(MissingFeatureError::new("Temperature"))
        );
    }

    #[test]
    fn splits_eighty_twenty_and_standardizes_train() {
        let table = table_with(&ten_rows());
        let prepared = prepare(&table, &two_feature_schema(), &PrepareOptions::default()).unwrap();
        assert_eq!(prepared.train_x.nrows(), 8);
        assert_eq!(prepared.test_x.nrows(), 2);
        assert_eq!(prepared.train_y.len(), 8);
        for column in prepared.train_x.columns() {
            let mean = column.sum() / column.len() as f64;
            assert!(mean.abs() < 1e-9);
        }
    }

    #[test]
    fn imputes_with_whole_table_mean() {
        let mut rows = ten_rows();
        rows[3][0] = None;
        let table = table_with(&rows);
        let x = imputed_feature_matrix(&table, &two_feature_schema()).unwrap();
        let expected = (0..10).filter(|&i| i != 3).map(|i| 50.0 + i as f64).sum::<f64>() / 9.0;
        assert!((x[[3, 0]] - expected).abs() < 1e-12);
    }

    #[test]
    fn rejects_bad_labels() {
        let mut rows = ten_rows();
        rows[4][2] = Some(2.0);
        let err = prepare(&table_with(&rows), &two_feature_schema(), &PrepareOptions::default())
            .unwrap_err();
        assert_eq!(err, PrepareError::InvalidLabel { row: 4, value: 2.0 });

        let mut rows = ten_rows();
        rows[0][2] = None;
        let err = prepare(&table_with(&rows), &two_feature_schema(), &PrepareOptions::default())
            .unwrap_err();
        assert_eq!(err, PrepareError::MissingLabel { row: 0 });
    }

    #[test]
    fn fully_missing_feature_is_an_error() {
        let rows: Vec<_> = ten_rows()
            .into_iter()
            .map(|[_, p, r]| [None, p, r])
            .collect();
        let err = prepare(&table_with(&rows), &two_feature_schema(), &PrepareOptions::default())
            .unwrap_err();
        assert_eq!(err, PrepareError::AllMissing(Feature::Humidity));
    }

    #[test]
    fn label_column_is_required() {
        let mut table = WeatherTable::new(["Humidity", "Pressure"]).unwrap();
        table
            .push_row(vec![Cell::Number(60.0), Cell::Number(1000.0)])
            .unwrap();
        let err = prepare(&table, &two_feature_schema(), &PrepareOptions::default()).unwrap_err();
        assert_eq!(err, PrepareError::MissingLabelColumn);
    }
}
