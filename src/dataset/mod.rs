//! In-memory weather tables.
//!
//! A [`WeatherTable`] keeps every column and row of its source in order so batch
//! prediction can append columns without reshaping the caller's data.

use thiserror::Error;

use crate::weather::MissingFeatureError;

pub mod csv_io;

pub use csv_io::{
    DataLoadError, DataWriteError, read_table, read_table_from_reader, table_to_csv, write_table,
};

/// Errors raised while building or reading table columns.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TableError {
    #[error("Row {row} has {found} cells but the header has {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Column {0} appears more than once")]
    DuplicateColumn(String),
    #[error("Column {column} has {found} values but the table has {expected} rows")]
    ColumnLength {
        column: String,
        expected: usize,
        found: usize,
    },
    #[error("Non-numeric value {value:?} in column {column} at row {row}")]
    NonNumeric {
        column: String,
        row: usize,
        value: String,
    },
    #[error(transparent)]
    MissingColumn(#[from] MissingFeatureError),
}

/// One table cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
    Missing,
}

impl Cell {
    /// Interpret a raw CSV field. Blank fields and `NA`/`NaN` markers are missing.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || is_missing_marker(trimmed) {
            return Cell::Missing;
        }
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => Cell::Number(value),
            _ => Cell::Text(trimmed.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(value) => Some(*value),
            _ => None,
        }
    }

    /// Render the cell as a CSV field.
    pub fn to_field(&self) -> String {
        match self {
            Cell::Number(value) => value.to_string(),
            Cell::Text(text) => text.clone(),
            Cell::Missing => String::new(),
        }
    }
}

fn is_missing_marker(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "na" | "nan" | "null" | "none"
    )
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

/// Ordered header list plus rows of cells.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WeatherTable {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl WeatherTable {
    pub fn new<I, S>(headers: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let headers: Vec<String> = headers.into_iter().map(Into::into).collect();
        for (idx, header) in headers.iter().enumerate() {
            if headers[..idx].contains(header) {
                return Err(TableError::DuplicateColumn(header.clone()));
            }
        }
        Ok(Self {
            headers,
            rows: Vec::new(),
        })
    }

    /// Build a table whose shape is known to be valid by construction.
    pub(crate) fn from_trusted_parts(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        debug_assert!(rows.iter().all(|row| row.len() == headers.len()));
        Self { headers, rows }
    }

    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<(), TableError> {
        if row.len() != self.headers.len() {
            return Err(TableError::RaggedRow {
                row: self.rows.len(),
                expected: self.headers.len(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    /// Index of a column that must be present.
    pub fn require_column(&self, name: &str) -> Result<usize, MissingFeatureError> {
        self.column_index(name)
            .ok_or_else(|| MissingFeatureError::new(name))
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|cells| cells.get(column))
    }

    /// Read a column as numbers, keeping missing cells as `None`.
    ///
    /// Text in the column is an error rather than a missing value.
    pub fn numeric_column(&self, name: &str) -> Result<Vec<Option<f64>>, TableError> {
        let column = self.require_column(name)?;
        self.rows
            .iter()
            .enumerate()
            .map(|(row_idx, row)| match &row[column] {
                Cell::Number(value) => Ok(Some(*value)),
                Cell::Missing => Ok(None),
                Cell::Text(text) => Err(TableError::NonNumeric {
                    column: name.to_string(),
                    row: row_idx,
                    value: text.clone(),
                }),
            })
            .collect()
    }

    /// Append a column, consuming the table.
    pub fn with_column(
        mut self,
        name: impl Into<String>,
        values: Vec<Cell>,
    ) -> Result<Self, TableError> {
        let name = name.into();
        if self.headers.contains(&name) {
            return Err(TableError::DuplicateColumn(name));
        }
        if values.len() != self.rows.len() {
            return Err(TableError::ColumnLength {
                column: name,
                expected: self.rows.len(),
                found: values.len(),
            });
        }
        self.headers.push(name);
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_table() -> WeatherTable {
        let mut table = WeatherTable::new(["Location", "Humidity"]).unwrap();
        table
            .push_row(vec![Cell::from("Harbor"), Cell::Number(70.0)])
            .unwrap();
        table
            .push_row(vec![Cell::from("Ridge"), Cell::Missing])
            .unwrap();
        table
    }

    #[test]
    fn cell_parse_classifies_fields() {
        assert_eq!(Cell::parse(" 12.5 "), Cell::Number(12.5));
        assert_eq!(Cell::parse(""), Cell::Missing);
        assert_eq!(Cell::parse("NaN"), Cell::Missing);
        assert_eq!(Cell::parse("na"), Cell::Missing);
        assert_eq!(Cell::parse("Harbor"), Cell::Text("Harbor".into()));
    }

    #[test]
    fn numeric_column_keeps_missing_and_rejects_text() {
        let table = small_table();
        assert_eq!(table.numeric_column("Humidity").unwrap(), vec![Some(70.0), None]);
        assert!(matches!(
            table.numeric_column("Location"),
            Err(TableError::NonNumeric { row: 0, .. })
        ));
        assert!(matches!(
            table.numeric_column("Pressure"),
            Err(TableError::MissingColumn(_))
        ));
    }

    #[test]
    fn push_row_rejects_ragged_rows() {
        let mut table = small_table();
        let err = table.push_row(vec![Cell::Missing]).unwrap_err();
        assert_eq!(
            err,
            TableError::RaggedRow {
                row: 2,
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn with_column_appends_in_row_order() {
        let table = small_table()
            .with_column("Flag", vec![Cell::Number(1.0), Cell::Number(0.0)])
            .unwrap();
        assert_eq!(table.headers(), &["Location", "Humidity", "Flag"]);
        assert_eq!(table.cell(1, 2), Some(&Cell::Number(0.0)));
        assert!(matches!(
            table.clone().with_column("Flag", vec![Cell::Missing, Cell::Missing]),
            Err(TableError::DuplicateColumn(_))
        ));
        assert!(matches!(
            table.with_column("Short", vec![Cell::Missing]),
            Err(TableError::ColumnLength { .. })
        ));
    }
}
