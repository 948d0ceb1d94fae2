// crates/benchfit-core/src/core/dataset.rs
// ============================================================================
// Module: Benchfit Record Store
// Description: Normalized in-memory benchmark dataset.
// Purpose: Load, filter, derive and partition measurement rows immutably.
// Dependencies: crate::core::{derive, identifiers, predicate, schema, value}, csv
// ============================================================================

//! ## Overview
//! A [`Dataset`] is a row-oriented table with canonical column names. It is
//! loaded once through a [`RecordSource`] and an alias table, and never
//! mutated afterwards: [`Dataset::filter`], [`Dataset::derive`] and
//! [`Dataset::select`] each return a new dataset. Loading is the only fatal
//! stage; a log whose required fields cannot be resolved aborts with
//! [`LoadError::MalformedLog`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

use thiserror::Error;
use tracing::debug;

use crate::core::derive::DerivationError;
use crate::core::derive::DeriveExpr;
use crate::core::identifiers::GroupKey;
use crate::core::predicate::FilterSet;
use crate::core::record::MeasurementRecord;
use crate::core::record::RecordError;
use crate::core::schema::SchemaAliases;
use crate::core::value::Value;
use crate::core::warnings::Warning;
use crate::interfaces::CsvSource;
use crate::interfaces::RecordSource;
use crate::interfaces::SourceError;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Fatal log loading failures.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - `MalformedLog` always names the unresolved canonical field.
#[derive(Debug, Error)]
pub enum LoadError {
    /// A required canonical field is absent under every known alias.
    #[error("malformed log: required field `{field}` not found (accepted names: {})", .aliases.join(", "))]
    MalformedLog {
        /// Canonical field name.
        field: String,
        /// Accepted header names.
        aliases: Vec<String>,
    },
    /// A column name appears twice after normalization.
    #[error("malformed log: duplicate column `{0}`")]
    DuplicateColumn(String),
    /// A cell cannot be coerced to its canonical kind.
    #[error("malformed log: record {record} column `{column}` value `{raw}` is not {expected}")]
    InvalidCell {
        /// One-based data record number.
        record: usize,
        /// Canonical column name.
        column: String,
        /// Raw cell text.
        raw: String,
        /// Expected kind description.
        expected: String,
    },
    /// A size or count cell violates its non-negativity invariant.
    #[error("malformed log: record {record} column `{column}` must be non-negative")]
    Invariant {
        /// One-based data record number.
        record: usize,
        /// Canonical column name.
        column: String,
    },
    /// The tabular source failed.
    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Dataset shape errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatasetError {
    /// A referenced column does not exist.
    #[error("unknown column `{0}`")]
    UnknownColumn(String),
    /// A column name appears twice.
    #[error("duplicate column `{0}`")]
    DuplicateColumn(String),
    /// A row width disagrees with the column count.
    #[error("row {row} has {found} cells, expected {expected}")]
    RowWidth {
        /// Zero-based row index.
        row: usize,
        /// Cells found.
        found: usize,
        /// Cells expected.
        expected: usize,
    },
}

// ============================================================================
// SECTION: Dataset
// ============================================================================

/// Immutable row-oriented table with canonical column names.
///
/// # Invariants
/// - Column names are unique.
/// - Every row has exactly one cell per column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    /// Column names in order.
    columns: Vec<String>,
    /// Row cells aligned with `columns`.
    rows: Vec<Vec<Value>>,
}

impl Dataset {
    /// Builds a dataset from explicit columns and rows.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError`] when names repeat or a row width is wrong.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, DatasetError> {
        let mut seen = BTreeSet::new();
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(DatasetError::DuplicateColumn(column.clone()));
            }
        }
        if let Some((row, cells)) = rows.iter().enumerate().find(|(_, row)| row.len() != columns.len())
        {
            return Err(DatasetError::RowWidth {
                row,
                found: cells.len(),
                expected: columns.len(),
            });
        }
        Ok(Self {
            columns,
            rows,
        })
    }

    /// Loads a log from a tabular source, normalizing it with the alias table.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] when the source fails, a required field is
    /// unresolvable, or a cell violates its canonical kind or sign.
    pub fn load<S: RecordSource + ?Sized>(
        source: &mut S,
        aliases: &SchemaAliases,
    ) -> Result<Self, LoadError> {
        let table = source.read_table()?;
        let schema = aliases.resolve(&table.headers)?;
        let mut rows = Vec::with_capacity(table.rows.len());
        for (index, raw) in table.rows.iter().enumerate() {
            let record = index + 1;
            let mut row = Vec::with_capacity(schema.columns.len());
            for column in &schema.columns {
                let cell = raw.get(column.source).map_or("", String::as_str);
                let value = Value::parse(cell, column.kind).map_err(|expected| {
                    LoadError::InvalidCell {
                        record,
                        column: column.name.clone(),
                        raw: cell.to_string(),
                        expected,
                    }
                })?;
                if column.non_negative && value.as_f64().is_some_and(|number| number < 0.0) {
                    return Err(LoadError::Invariant {
                        record,
                        column: column.name.clone(),
                    });
                }
                row.push(value);
            }
            rows.push(row);
        }
        debug!(rows = rows.len(), columns = schema.columns.len(), "loaded benchmark log");
        Ok(Self {
            columns: schema.names(),
            rows,
        })
    }

    /// Loads a CSV log from any reader using the standard alias table.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] as for [`Dataset::load`].
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, LoadError> {
        Self::load(&mut CsvSource::new(reader), &SchemaAliases::standard())
    }

    /// Loads a CSV log file using the standard alias table.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] as for [`Dataset::load`].
    pub fn from_csv_path(path: &Path) -> Result<Self, LoadError> {
        Self::load(&mut CsvSource::from_path(path)?, &SchemaAliases::standard())
    }

    /// Returns the column names.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the position of a column.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Returns true when the column exists.
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true when the dataset has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns a view of one row.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<RowRef<'_>> {
        self.rows.get(index).map(|values| RowRef {
            columns: &self.columns,
            index,
            values,
        })
    }

    /// Iterates over row views.
    pub fn rows(&self) -> impl Iterator<Item = RowRef<'_>> {
        self.rows.iter().enumerate().map(|(index, values)| RowRef {
            columns: &self.columns,
            index,
            values,
        })
    }

    /// Iterates over raw row cells.
    pub fn row_slices(&self) -> impl Iterator<Item = &[Value]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Iterates over the cells of one column.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::UnknownColumn`] when the column is absent.
    pub fn column(&self, name: &str) -> Result<impl Iterator<Item = &Value>, DatasetError> {
        let index = self.require_column(name)?;
        Ok(self.rows.iter().map(move |row| &row[index]))
    }

    /// Returns the position of a column or an unknown-column error.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::UnknownColumn`] when the column is absent.
    pub fn require_column(&self, name: &str) -> Result<usize, DatasetError> {
        self.column_index(name).ok_or_else(|| DatasetError::UnknownColumn(name.to_string()))
    }

    /// Returns the rows satisfying every predicate, leaving `self` untouched.
    #[must_use]
    pub fn filter(&self, filters: &FilterSet) -> Self {
        let rows = self
            .rows()
            .filter(|row| filters.matches(row))
            .map(|row| row.values.to_vec())
            .collect::<Vec<_>>();
        debug!(kept = rows.len(), total = self.rows.len(), "filtered dataset");
        Self {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Adds computed columns, failing as a whole on the first bad expression.
    ///
    /// # Errors
    ///
    /// Returns [`DerivationError`] when an input column is missing, an input
    /// is non-numeric, or an output name already exists.
    pub fn derive(&self, expressions: &[DeriveExpr]) -> Result<Self, DerivationError> {
        let mut out = self.clone();
        for expression in expressions {
            out = out.derive_one(expression)?;
        }
        Ok(out)
    }

    /// Adds computed columns, skipping (and reporting) failed expressions.
    #[must_use]
    pub fn derive_lenient(&self, expressions: &[DeriveExpr]) -> (Self, Vec<Warning>) {
        let mut out = self.clone();
        let mut warnings = Vec::new();
        for expression in expressions {
            match out.derive_one(expression) {
                Ok(next) => out = next,
                Err(err) => Warning::DerivationSkipped {
                    column: expression.name().to_string(),
                    reason: err.to_string(),
                }
                .record(&mut warnings),
            }
        }
        (out, warnings)
    }

    /// Evaluates one expression and appends its column.
    fn derive_one(&self, expression: &DeriveExpr) -> Result<Self, DerivationError> {
        if self.has_column(expression.name()) {
            return Err(DerivationError::DuplicateColumn(expression.name().to_string()));
        }
        let values = expression.evaluate(self)?;
        let mut columns = self.columns.clone();
        columns.push(expression.name().to_string());
        let rows = self
            .rows
            .iter()
            .zip(values)
            .map(|(row, value)| {
                let mut row = row.clone();
                row.push(value);
                row
            })
            .collect();
        Ok(Self {
            columns,
            rows,
        })
    }

    /// Keeps only the named columns, in the given order.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError`] when a column is unknown or repeated.
    pub fn select(&self, names: &[&str]) -> Result<Self, DatasetError> {
        let indices = names
            .iter()
            .map(|name| self.require_column(name))
            .collect::<Result<Vec<_>, _>>()?;
        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|index| row[*index].clone()).collect())
            .collect();
        Self::from_rows(names.iter().map(ToString::to_string).collect(), rows)
    }

    /// Builds the group key of one row over the given column positions.
    #[must_use]
    pub fn key_of(&self, row: usize, indices: &[usize]) -> GroupKey {
        let values = &self.rows[row];
        GroupKey::new(indices.iter().map(|index| values[*index].clone()).collect())
    }

    /// Partitions row indices by the values of the key columns.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::UnknownColumn`] when a key column is absent.
    pub fn group_indices(&self, keys: &[&str]) -> Result<BTreeMap<GroupKey, Vec<usize>>, DatasetError> {
        let indices = keys
            .iter()
            .map(|key| self.require_column(key))
            .collect::<Result<Vec<_>, _>>()?;
        let mut groups: BTreeMap<GroupKey, Vec<usize>> = BTreeMap::new();
        for row in 0 .. self.rows.len() {
            groups.entry(self.key_of(row, &indices)).or_default().push(row);
        }
        Ok(groups)
    }

    /// Partitions the dataset into one sub-dataset per key.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::UnknownColumn`] when a key column is absent.
    pub fn partition(&self, keys: &[&str]) -> Result<BTreeMap<GroupKey, Self>, DatasetError> {
        Ok(self
            .group_indices(keys)?
            .into_iter()
            .map(|(key, rows)| {
                let rows = rows.into_iter().map(|row| self.rows[row].clone()).collect();
                (key, Self {
                    columns: self.columns.clone(),
                    rows,
                })
            })
            .collect())
    }

    /// Converts every row into a typed measurement record.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError`] for the first row lacking a typed field.
    pub fn records(&self) -> Result<Vec<MeasurementRecord>, RecordError> {
        self.rows().map(|row| MeasurementRecord::from_row(&row)).collect()
    }
}

// ============================================================================
// SECTION: Row Views
// ============================================================================

/// Borrowed view of one dataset row.
#[derive(Debug, Clone, Copy)]
pub struct RowRef<'a> {
    /// Column names of the owning dataset.
    columns: &'a [String],
    /// Zero-based row index.
    index: usize,
    /// Row cells.
    values: &'a [Value],
}

impl<'a> RowRef<'a> {
    /// Returns the zero-based row index.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Returns the cell of a column, or `None` for an unknown column.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&'a Value> {
        self.columns.iter().position(|name| name == column).map(|at| &self.values[at])
    }

    /// Returns the row cells.
    #[must_use]
    pub const fn values(&self) -> &'a [Value] {
        self.values
    }
}
