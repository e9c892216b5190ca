//! CSV codec.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use super::{Dataset, DatasetCodec, DatasetError};

const DELIMITER_CANDIDATES: &[u8] = &[b',', b';', b'\t', b'|'];

/// Reads and writes delimited text files.
pub struct CsvCodec {
    delimiter: Option<u8>,
}

impl CsvCodec {
    /// A codec with an explicit delimiter, or `None` to sniff it from
    /// the first line of the input.
    pub fn new(delimiter: Option<u8>) -> Self {
        Self { delimiter }
    }

    fn effective_delimiter(&self, path: &Path) -> Result<u8, DatasetError> {
        match self.delimiter {
            Some(d) => Ok(d),
            None => sniff_delimiter(path),
        }
    }
}

/// Guesses the delimiter from the first line of a delimited file.
///
/// The candidate (`,`, `;`, tab, `|`) occurring most often wins; a line
/// containing none of them falls back to a comma.
pub fn sniff_delimiter(path: &Path) -> Result<u8, DatasetError> {
    let file = File::open(path)?;
    let mut first_line = String::new();
    BufReader::new(file).read_line(&mut first_line)?;

    let best = DELIMITER_CANDIDATES
        .iter()
        .map(|&d| (d, first_line.bytes().filter(|&b| b == d).count()))
        .max_by_key(|&(_, count)| count);

    match best {
        Some((d, count)) if count > 0 => Ok(d),
        _ => Ok(b','),
    }
}

impl DatasetCodec for CsvCodec {
    fn read(&self, path: &Path) -> Result<Dataset, DatasetError> {
        let delimiter = self.effective_delimiter(path)?;

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .from_path(path)
            .map_err(|e| DatasetError::Read(e.to_string()))?;

        let columns: Vec<String> = reader
            .headers()
            .map_err(|e| DatasetError::Read(e.to_string()))?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| DatasetError::Read(e.to_string()))?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Dataset::new(columns, rows)
    }

    fn write(&self, dataset: &Dataset, dir: &Path, stem: &str) -> Result<PathBuf, DatasetError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("{stem}.csv"));

        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter.unwrap_or(b','))
            .from_path(&path)
            .map_err(|e| DatasetError::Write(e.to_string()))?;

        writer
            .write_record(dataset.columns())
            .map_err(|e| DatasetError::Write(e.to_string()))?;
        for row in dataset.rows() {
            writer
                .write_record(row)
                .map_err(|e| DatasetError::Write(e.to_string()))?;
        }
        writer
            .flush()
            .map_err(|e| DatasetError::Write(e.to_string()))?;

        Ok(path)
    }

    fn output_extension(&self) -> &'static str {
        "csv"
    }
}
