use std::collections::BTreeSet;
use std::io::{Read, Write};
use std::ops::Range;
use std::path::Path;

use thiserror::Error;

/// Errors that can occur while reading or interpreting a pair table
#[derive(Debug, Error)]
pub enum TableError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("missing column '{0}'")]
    MissingColumn(String),

    #[error("invalid label '{value}' in row {row} (expected 0 or 1)")]
    InvalidLabel { row: usize, value: String },
}

/// In-memory table of record pairs loaded from a CSV dataset.
///
/// Columns follow the `left_<field>` / `right_<field>` convention, plus the
/// `id` and `label` columns. The table is treated as immutable once loaded;
/// splits are produced by slicing, never by mutating.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PairTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl PairTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Read a pair table from any CSV source
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, TableError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let headers = csv_reader
            .headers()?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            rows.push(record.iter().map(|v| v.to_string()).collect());
        }

        Ok(Self { headers, rows })
    }

    /// Read a pair table from a CSV file on disk
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, TableError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Write the table as CSV
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), TableError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(&self.headers)?;
        for row in &self.rows {
            csv_writer.write_record(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Write the table as CSV to a file on disk
    pub fn write_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), TableError> {
        let file = std::fs::File::create(path)?;
        self.write_csv(file)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// All values of one column, in row order
    pub fn column(&self, name: &str) -> Result<Vec<&str>, TableError> {
        let index = self
            .column_index(name)
            .ok_or_else(|| TableError::MissingColumn(name.to_string()))?;

        Ok(self
            .rows
            .iter()
            .map(|row| row.get(index).map(String::as_str).unwrap_or(""))
            .collect())
    }

    /// Parse the ground-truth `label` column into match / non-match booleans
    pub fn labels(&self) -> Result<Vec<bool>, TableError> {
        let column = self.column("label")?;

        column
            .iter()
            .enumerate()
            .map(|(row, value)| match value.trim() {
                "0" | "0.0" => Ok(false),
                "1" | "1.0" => Ok(true),
                other => Err(TableError::InvalidLabel {
                    row: row + 1,
                    value: other.to_string(),
                }),
            })
            .collect()
    }

    /// Logical field names with the `left_` / `right_` prefixes stripped.
    ///
    /// The `id` and `label` bookkeeping columns are discarded, matching what
    /// a dataset summary should expose to a caller choosing a sensitive
    /// attribute.
    pub fn fields(&self) -> BTreeSet<String> {
        self.headers
            .iter()
            .filter_map(|header| {
                let name = header
                    .strip_prefix("left_")
                    .or_else(|| header.strip_prefix("right_"))
                    .unwrap_or(header);

                if name.eq_ignore_ascii_case("id") || name.eq_ignore_ascii_case("label") {
                    None
                } else {
                    Some(name.to_string())
                }
            })
            .collect()
    }

    /// Distinct trimmed values of one column, sorted
    pub fn distinct_values(&self, name: &str) -> Result<BTreeSet<String>, TableError> {
        Ok(self
            .column(name)?
            .iter()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect())
    }

    /// Copy a contiguous row range into a new table with the same headers
    pub fn slice(&self, range: Range<usize>) -> Self {
        Self {
            headers: self.headers.clone(),
            rows: self.rows[range].to_vec(),
        }
    }
}
