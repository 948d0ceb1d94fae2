// crates/benchfit-core/src/core/record.rs
// ============================================================================
// Module: Benchfit Measurement Records
// Description: Typed view over one normalized benchmark row.
// Purpose: Give callers checked access to the canonical measurement fields.
// Dependencies: crate::core::{dataset, schema, value}, serde, thiserror
// ============================================================================

//! ## Overview
//! A [`MeasurementRecord`] is the typed projection of a dataset row onto the
//! canonical schema. Size and iteration counts are unsigned; every outcome
//! metric other than the iteration count is optional because older logs do
//! not carry them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::dataset::RowRef;
use crate::core::schema::fields;
use crate::core::value::Value;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Typed-view conversion failures.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// A required field is absent or null.
    #[error("row {row}: field `{field}` is missing")]
    Missing {
        /// Zero-based row index.
        row: usize,
        /// Canonical field name.
        field: String,
    },
    /// A field holds a value of the wrong kind.
    #[error("row {row}: field `{field}` has the wrong type")]
    WrongType {
        /// Zero-based row index.
        row: usize,
        /// Canonical field name.
        field: String,
    },
}

// ============================================================================
// SECTION: Records
// ============================================================================

/// One benchmark run outcome.
///
/// # Invariants
/// - `vertices`, `arcs` and `iterations` are non-negative by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    /// Unique run identifier.
    pub name: String,
    /// Problem-family label.
    pub problem_class: Option<String>,
    /// Solver-configuration label.
    pub solver: String,
    /// Canonical-parameterization flag, when the log records it.
    pub is_baseline: Option<bool>,
    /// Vertex count.
    pub vertices: u64,
    /// Arc count.
    pub arcs: u64,
    /// Interior-point iterations.
    pub iterations: u64,
    /// Wall-clock seconds.
    pub time_seconds: Option<f64>,
    /// Seconds per arc per iteration.
    pub time_per_arc_per_iter: Option<f64>,
    /// Factorization seconds per arc per iteration.
    pub factorization_time_per_arc_per_iter: Option<f64>,
    /// Inner linear-solve calls per iteration.
    pub inner_solves_per_iter: Option<f64>,
}

impl MeasurementRecord {
    /// Builds a record from a normalized row.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError`] when a required field is missing or mistyped.
    pub fn from_row(row: &RowRef<'_>) -> Result<Self, RecordError> {
        let index = row.index();
        Ok(Self {
            name: required_text(row, fields::NAME)?,
            problem_class: optional_text(row, fields::PROBLEM_CLASS),
            solver: required_text(row, fields::SOLVER)?,
            is_baseline: row.get(fields::IS_BASELINE).and_then(Value::as_bool),
            vertices: required_count(row, fields::VERTICES)?,
            arcs: required_count(row, fields::ARCS)?,
            iterations: required_count(row, fields::ITERATIONS)?,
            time_seconds: optional_number(row, fields::TIME_SECONDS, index)?,
            time_per_arc_per_iter: optional_number(row, fields::TIME_PER_ARC_PER_ITER, index)?,
            factorization_time_per_arc_per_iter: optional_number(
                row,
                fields::FACTORIZATION_TIME_PER_ARC_PER_ITER,
                index,
            )?,
            inner_solves_per_iter: optional_number(row, fields::INNER_SOLVES_PER_ITER, index)?,
        })
    }

    /// Returns the graph size, vertices plus arcs.
    #[must_use]
    pub const fn graph_size(&self) -> u64 {
        self.vertices.saturating_add(self.arcs)
    }

    /// Returns true when the run converged below the iteration threshold.
    #[must_use]
    pub const fn is_converged(&self, threshold: u64) -> bool {
        self.iterations < threshold
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads a required text field.
fn required_text(row: &RowRef<'_>, field: &str) -> Result<String, RecordError> {
    match row.get(field) {
        None | Some(Value::Null) => Err(missing(row, field)),
        Some(value) => Ok(value.to_string()),
    }
}

/// Reads an optional text field.
fn optional_text(row: &RowRef<'_>, field: &str) -> Option<String> {
    row.get(field).filter(|value| !value.is_null()).map(ToString::to_string)
}

/// Reads a required non-negative integer field.
fn required_count(row: &RowRef<'_>, field: &str) -> Result<u64, RecordError> {
    match row.get(field) {
        None | Some(Value::Null) => Err(missing(row, field)),
        Some(value) => value.as_i64().and_then(|count| u64::try_from(count).ok()).ok_or_else(
            || RecordError::WrongType {
                row: row.index(),
                field: field.to_string(),
            },
        ),
    }
}

/// Reads an optional numeric field.
fn optional_number(row: &RowRef<'_>, field: &str, index: usize) -> Result<Option<f64>, RecordError> {
    match row.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value.as_f64().map(Some).ok_or_else(|| RecordError::WrongType {
            row: index,
            field: field.to_string(),
        }),
    }
}

/// Builds the missing-field error.
fn missing(row: &RowRef<'_>, field: &str) -> RecordError {
    RecordError::Missing {
        row: row.index(),
        field: field.to_string(),
    }
}
