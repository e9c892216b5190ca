//! In-memory dataset model and file codecs.
//!
//! A [`Dataset`] is the unit of work for one job: ordered named columns
//! over rows of string cells, owned exclusively by the pipeline for the
//! duration of the job. Codecs translate between on-disk resources and
//! datasets through a deliberately narrow seam so the storage formats
//! stay swappable.

mod archive;
mod csv_codec;
mod shapefile_codec;

pub use archive::{extract_archive, resolve_extracted_root};
pub use csv_codec::{sniff_delimiter, CsvCodec};
pub use shapefile_codec::{ShapefileCodec, GEOMETRY_COLUMN};

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Error type for dataset operations.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Row {row} has {got} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        got: usize,
        expected: usize,
    },

    #[error("Header has {got} names, expected {expected}")]
    HeaderMismatch { got: usize, expected: usize },

    #[error("Failed to read resource: {0}")]
    Read(String),

    #[error("Failed to write resource: {0}")]
    Write(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Columnar dataset with string cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Dataset {
    /// Builds a dataset, rejecting rows whose width differs from the
    /// header.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self, DatasetError> {
        let expected = columns.len();
        for (row, cells) in rows.iter().enumerate() {
            if cells.len() != expected {
                return Err(DatasetError::RaggedRow {
                    row,
                    got: cells.len(),
                    expected,
                });
            }
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Replaces the header row. The new header must have the same width.
    pub fn set_columns(&mut self, columns: Vec<String>) -> Result<(), DatasetError> {
        if columns.len() != self.columns.len() {
            return Err(DatasetError::HeaderMismatch {
                got: columns.len(),
                expected: self.columns.len(),
            });
        }
        self.columns = columns;
        Ok(())
    }

    /// Values of one column, in row order.
    pub fn column_values(&self, name: &str) -> Result<Vec<&str>, DatasetError> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| DatasetError::ColumnNotFound(name.to_string()))?;
        Ok(self.rows.iter().map(|row| row[idx].as_str()).collect())
    }

    /// Rewrites every cell of one column through `f`, preserving row
    /// order.
    pub fn apply_column<F>(&mut self, name: &str, f: F) -> Result<(), DatasetError>
    where
        F: Fn(&str) -> String,
    {
        let idx = self
            .column_index(name)
            .ok_or_else(|| DatasetError::ColumnNotFound(name.to_string()))?;
        for row in &mut self.rows {
            row[idx] = f(&row[idx]);
        }
        Ok(())
    }
}

/// Narrow seam between datasets and on-disk resources.
///
/// `read` loads one uploaded resource; `write` exports the transformed
/// dataset under `dir` using `stem` as the base file name and returns the
/// path of the stored artifact.
pub trait DatasetCodec: Send + Sync {
    fn read(&self, path: &Path) -> Result<Dataset, DatasetError>;
    fn write(&self, dataset: &Dataset, dir: &Path, stem: &str) -> Result<PathBuf, DatasetError>;

    /// File extension of the stored artifact, used for response metadata.
    fn output_extension(&self) -> &'static str;
}
