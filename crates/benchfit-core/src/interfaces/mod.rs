// crates/benchfit-core/src/interfaces/mod.rs
// ============================================================================
// Module: Benchfit Interfaces
// Description: Backend-agnostic interfaces for tabular input and series output.
// Purpose: Define the contract surfaces between the engine and its collaborators.
// Dependencies: crate::runtime::series, csv, thiserror
// ============================================================================

//! ## Overview
//! The engine never parses solver logs or renders charts itself. Tabular
//! loaders implement [`RecordSource`] to hand over a header and raw string
//! rows; presentation backends implement [`SeriesSink`] to receive ready-made
//! point series. [`CsvSource`] and [`InMemorySource`] are the bundled sources.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::Read;
use std::path::Path;

use thiserror::Error;

use crate::runtime::series::Panel;

// ============================================================================
// SECTION: Record Source
// ============================================================================

/// Raw table handed over by a [`RecordSource`].
///
/// # Invariants
/// - Every row has exactly `headers.len()` cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    /// Header names in source order.
    pub headers: Vec<String>,
    /// Raw cell text per row.
    pub rows: Vec<Vec<String>>,
}

/// Record source errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum SourceError {
    /// I/O failure while reading the source.
    #[error("source io error: {0}")]
    Io(String),
    /// The source content is not a well-formed table.
    #[error("source format error: {0}")]
    Format(String),
}

/// Tabular loader producing raw string cells.
pub trait RecordSource {
    /// Reads the full table into memory.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when the table cannot be read.
    fn read_table(&mut self) -> Result<RawTable, SourceError>;
}

/// Comma-separated source backed by the `csv` crate.
pub struct CsvSource<R: Read> {
    /// Underlying CSV reader.
    reader: csv::Reader<R>,
}

impl<R: Read> CsvSource<R> {
    /// Creates a CSV source over any reader; the first record is the header.
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self {
            reader: csv::ReaderBuilder::new()
                .has_headers(true)
                .trim(csv::Trim::All)
                .from_reader(reader),
        }
    }
}

impl CsvSource<File> {
    /// Opens a CSV file.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Io`] when the file cannot be opened.
    pub fn from_path(path: &Path) -> Result<Self, SourceError> {
        let file = File::open(path)
            .map_err(|err| SourceError::Io(format!("{}: {err}", path.display())))?;
        Ok(Self::new(file))
    }
}

impl<R: Read> RecordSource for CsvSource<R> {
    fn read_table(&mut self) -> Result<RawTable, SourceError> {
        let headers = self
            .reader
            .headers()
            .map_err(|err| SourceError::Format(err.to_string()))?
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        let mut rows = Vec::new();
        for record in self.reader.records() {
            let record = record.map_err(|err| SourceError::Format(err.to_string()))?;
            rows.push(record.iter().map(ToString::to_string).collect());
        }
        Ok(RawTable {
            headers,
            rows,
        })
    }
}

/// Source serving an already materialized table.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    /// Table handed out on read.
    table: RawTable,
}

impl InMemorySource {
    /// Creates an in-memory source from headers and rows.
    #[must_use]
    pub fn new(headers: &[&str], rows: &[&[&str]]) -> Self {
        Self {
            table: RawTable {
                headers: headers.iter().map(ToString::to_string).collect(),
                rows: rows
                    .iter()
                    .map(|row| row.iter().map(ToString::to_string).collect())
                    .collect(),
            },
        }
    }
}

impl RecordSource for InMemorySource {
    fn read_table(&mut self) -> Result<RawTable, SourceError> {
        let width = self.table.headers.len();
        if let Some(index) = self.table.rows.iter().position(|row| row.len() != width) {
            return Err(SourceError::Format(format!(
                "row {index} has {} cells, expected {width}",
                self.table.rows[index].len()
            )));
        }
        Ok(self.table.clone())
    }
}

// ============================================================================
// SECTION: Series Sink
// ============================================================================

/// Series sink errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Sink reported a write failure.
    #[error("series sink error: {0}")]
    Write(String),
}

/// Presentation backend consuming labelled point series.
pub trait SeriesSink {
    /// Receives one panel of scatter series, fitted curves and reference lines.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] when the panel cannot be rendered or stored.
    fn emit_panel(&mut self, panel: &Panel) -> Result<(), SinkError>;
}
