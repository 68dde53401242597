//! Columnar loading of tabular (CSV) metadata.
//!
//! The first row is the header. For each requested column the reader collects the
//! values of every data row, in row order:
//!
//! ```csv
//! TITLE,AUTHOR,LOCATION,analysis
//! Water Lilies,Claude Monet,Paris,"A pond of lilies ..."
//! ```
//!
//! A row that has no cell for a requested column (a short row, or a column that is
//! missing from the header altogether) contributes nothing to that column. Columns
//! can therefore end up with different lengths; [`ColumnData::ensure_aligned`] is the
//! check callers run before treating positions as row indices.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use indexmap::IndexMap;
use log::{debug, warn};

use crate::error::{CuratorError, Result};

/// Reads selected columns from CSV input.
#[derive(Debug, Clone)]
pub struct ColumnarReader {
    /// CSV delimiter character (default: ',')
    delimiter: u8,
    /// Whether to trim whitespace from fields
    trim: bool,
    /// Whether rows may have fewer cells than the header
    flexible: bool,
}

impl Default for ColumnarReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ColumnarReader {
    /// Create a reader for comma-separated input that keeps values verbatim.
    pub fn new() -> Self {
        ColumnarReader {
            delimiter: b',',
            trim: false,
            flexible: true,
        }
    }

    /// Set a custom delimiter character.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set whether to trim whitespace from fields.
    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    /// Set whether rows with a different cell count than the header are accepted.
    pub fn with_flexible(mut self, flexible: bool) -> Self {
        self.flexible = flexible;
        self
    }

    /// Read the requested columns from a CSV file.
    ///
    /// # Errors
    ///
    /// [`CuratorError::NotFound`] if the file does not exist, and
    /// [`CuratorError::Parse`] if any record fails to parse.
    pub fn read_columns_from_path<P, S>(&self, path: P, columns: &[S]) -> Result<ColumnData>
    where
        P: AsRef<Path>,
        S: AsRef<str>,
    {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| CuratorError::from_open(e, path))?;
        let data = self.read_columns(file, columns).map_err(|e| match e {
            CuratorError::Parse(msg) => {
                CuratorError::parse(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })?;

        debug!(
            "Loaded {} columns with {} rows from {}",
            data.columns.len(),
            data.row_count(),
            path.display()
        );
        Ok(data)
    }

    /// Read the requested columns from any CSV byte source.
    pub fn read_columns<R, S>(&self, input: R, columns: &[S]) -> Result<ColumnData>
    where
        R: Read,
        S: AsRef<str>,
    {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(if self.trim {
                csv::Trim::All
            } else {
                csv::Trim::None
            })
            .flexible(self.flexible)
            .has_headers(true)
            .from_reader(input);

        let headers = reader
            .headers()
            .map_err(|e| CuratorError::parse(format!("failed to read CSV header: {e}")))?
            .clone();

        let mut data = ColumnData::default();
        let mut positions = Vec::with_capacity(columns.len());
        for column in columns {
            let name = column.as_ref();
            let position = headers.iter().position(|h| h == name);
            if position.is_none() {
                warn!("Column '{name}' is not present in the CSV header");
            }
            data.columns.entry(name.to_string()).or_default();
            positions.push((name.to_string(), position));
        }

        for (row, record) in reader.records().enumerate() {
            let record = record.map_err(|e| {
                CuratorError::parse(format!("failed to read CSV record {}: {e}", row + 1))
            })?;

            for (name, position) in &positions {
                if let Some(value) = position.and_then(|p| record.get(p)) {
                    if let Some(values) = data.columns.get_mut(name) {
                        values.push(value.to_string());
                    }
                }
            }
        }

        Ok(data)
    }
}

/// Column name → ordered values, in the order the columns were requested.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnData {
    columns: IndexMap<String, Vec<String>>,
}

impl ColumnData {
    /// Build column data directly from in-memory columns.
    pub fn from_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<String>)>,
        S: Into<String>,
    {
        ColumnData {
            columns: columns.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Values of one column.
    pub fn get(&self, column: &str) -> Option<&[String]> {
        self.columns.get(column).map(Vec::as_slice)
    }

    /// Column names in request order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Row count, taken from the first column (0 when there are no columns).
    pub fn row_count(&self) -> usize {
        self.columns.values().next().map_or(0, Vec::len)
    }

    /// Verify every column holds the same number of values and return that count.
    ///
    /// # Errors
    ///
    /// [`CuratorError::Parse`] naming the first column whose length differs.
    pub fn ensure_aligned(&self) -> Result<usize> {
        let expected = self.row_count();
        let first = self.columns.keys().next().map_or("", String::as_str);
        for (name, values) in &self.columns {
            if values.len() != expected {
                return Err(CuratorError::parse(format!(
                    "column '{name}' has {} values but column '{first}' has {expected}; \
                     rows cannot be aligned by position",
                    values.len()
                )));
            }
        }
        Ok(expected)
    }

    /// The values of row `index` as (column, value) pairs, skipping columns that
    /// have no value at that position.
    pub fn row(&self, index: usize) -> Vec<(&str, &str)> {
        self.columns
            .iter()
            .filter_map(|(name, values)| {
                values
                    .get(index)
                    .map(|value| (name.as_str(), value.as_str()))
            })
            .collect()
    }

    /// Whether no column holds any value.
    pub fn is_empty(&self) -> bool {
        self.columns.values().all(Vec::is_empty)
    }
}
