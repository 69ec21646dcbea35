//! Header-addressed source tables
//!
//! Reference tables arrive with loosely specified columns (percent-encoded
//! rate columns, optional extras), so they are kept as string cells with a
//! trimmed header index until the assumption builder types them.

use crate::error::DataError;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// Lowercased, trimmed form used for case/whitespace-insensitive key matching
pub fn normalize_key(value: &str) -> String {
    value.trim().to_lowercase()
}

/// A CSV table addressed by column name
#[derive(Debug, Clone, PartialEq)]
pub struct SourceTable {
    /// Table label used in error messages
    pub name: String,
    headers: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<String>>,
}

impl SourceTable {
    /// Build from headers and rows; headers are trimmed
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let headers: Vec<String> = headers.into_iter().map(|h| h.trim().to_string()).collect();
        let index = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), i))
            .collect();
        Self {
            name: name.into(),
            headers,
            index,
            rows,
        }
    }

    /// Load a table from a CSV file
    pub fn from_path<P: AsRef<Path>>(name: &str, path: P) -> Result<Self, DataError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(name, file)
    }

    /// Load a table from any reader (e.g., string buffer, network stream)
    pub fn from_reader<R: Read>(name: &str, reader: R) -> Result<Self, DataError> {
        let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers = csv_reader
            .headers()?
            .iter()
            .map(|h| h.to_string())
            .collect::<Vec<_>>();

        let mut rows = Vec::new();
        for result in csv_reader.records() {
            let record = result?;
            let mut row: Vec<String> = record.iter().map(|c| c.trim().to_string()).collect();
            row.resize(headers.len(), String::new());
            rows.push(row);
        }

        Ok(Self::new(name, headers, rows))
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.index.contains_key(column)
    }

    /// Column position, or `MissingColumn`
    pub fn column(&self, column: &str) -> Result<usize, DataError> {
        self.index.get(column).copied().ok_or_else(|| DataError::MissingColumn {
            table: self.name.clone(),
            column: column.to_string(),
        })
    }

    /// First of several accepted spellings that is present
    pub fn column_any(&self, names: &[&str]) -> Result<usize, DataError> {
        names
            .iter()
            .find_map(|n| self.index.get(*n).copied())
            .ok_or_else(|| DataError::MissingColumn {
                table: self.name.clone(),
                column: names.first().copied().unwrap_or_default().to_string(),
            })
    }

    pub fn rows(&self) -> impl Iterator<Item = &[String]> {
        self.rows.iter().map(|r| r.as_slice())
    }

    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(|s| s.as_str())
            .unwrap_or("")
    }
}
