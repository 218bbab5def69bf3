//! CSV reading and writing for [`WeatherTable`].

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::{Cell, TableError, WeatherTable};
use crate::fs_ops;

/// Failure to read a tabular input file.
#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Malformed CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        source: csv::Error,
    },
    #[error("{path} has no header row")]
    NoHeader { path: PathBuf },
    #[error("Invalid table in {path}: {source}")]
    Table {
        path: PathBuf,
        source: TableError,
    },
}

/// Failure to write a table as CSV.
#[derive(Debug, Error)]
pub enum DataWriteError {
    #[error("Failed to encode CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("Failed to flush CSV buffer: {0}")]
    Flush(String),
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Load a CSV file with a header row.
pub fn read_table(path: &Path) -> Result<WeatherTable, DataLoadError> {
    let file = File::open(path).map_err(|source| DataLoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let table = read_table_from_reader(file, path)?;
    tracing::info!(
        "Loaded {} rows x {} columns from {}",
        table.len(),
        table.headers().len(),
        path.display()
    );
    Ok(table)
}

/// Parse CSV from any reader; `origin` only labels errors.
pub fn read_table_from_reader<R: Read>(
    reader: R,
    origin: &Path,
) -> Result<WeatherTable, DataLoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = reader
        .headers()
        .map_err(|source| DataLoadError::Csv {
            path: origin.to_path_buf(),
            source,
        })?
        .clone();
    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(DataLoadError::NoHeader {
            path: origin.to_path_buf(),
        });
    }
    let table_err = |source| DataLoadError::Table {
        path: origin.to_path_buf(),
        source,
    };
    let mut table = WeatherTable::new(headers.iter()).map_err(table_err)?;
    for record in reader.records() {
        let record = record.map_err(|source| DataLoadError::Csv {
            path: origin.to_path_buf(),
            source,
        })?;
        table
            .push_row(record.iter().map(Cell::parse).collect())
            .map_err(table_err)?;
    }
    Ok(table)
}

/// Encode a table as CSV bytes.
pub fn table_to_csv(table: &WeatherTable) -> Result<Vec<u8>, DataWriteError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(table.headers())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(Cell::to_field))?;
    }
    writer
        .into_inner()
        .map_err(|err| DataWriteError::Flush(err.to_string()))
}

/// Write a table to `path` atomically.
pub fn write_table(table: &WeatherTable, path: &Path) -> Result<(), DataWriteError> {
    let bytes = table_to_csv(table)?;
    fs_ops::atomic_write(path, &bytes).map_err(|source| DataWriteError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!("Wrote {} rows to {}", table.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SAMPLE: &str = "Date,Location,Humidity,Pressure,Rainfall\n\
2024-01-01,Harbor,80.5,1001,1\n\
2024-01-02,Harbor,,1012.25,0\n";

    #[test]
    fn reads_headers_and_cells() {
        let table = read_table_from_reader(SAMPLE.as_bytes(), Path::new("inline.csv")).unwrap();
        assert_eq!(
            table.headers(),
            &["Date", "Location", "Humidity", "Pressure", "Rainfall"]
        );
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(0, 1), Some(&Cell::Text("Harbor".into())));
        assert_eq!(table.cell(1, 2), Some(&Cell::Missing));
        assert_eq!(table.cell(1, 3), Some(&Cell::Number(1012.25)));
    }

    #[test]
    fn ragged_rows_are_load_errors() {
        let text = "A,B\n1,2\n3\n";
        let err = read_table_from_reader(text.as_bytes(), Path::new("bad.csv")).unwrap_err();
        assert!(matches!(err, DataLoadError::Csv { .. }));
    }

    #[test]
    fn missing_file_is_open_error() {
        let dir = tempdir().unwrap();
        let err = read_table(&dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, DataLoadError::Open { .. }));
    }

    #[test]
    fn written_table_reads_back_identically() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("table.csv");
        let table = read_table_from_reader(SAMPLE.as_bytes(), Path::new("inline.csv")).unwrap();
        write_table(&table, &path).unwrap();
        assert_eq!(read_table(&path).unwrap(), table);
    }
}
