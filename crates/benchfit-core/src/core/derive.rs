// crates/benchfit-core/src/core/derive.rs
// ============================================================================
// Module: Benchfit Derived Columns
// Description: Computed-column expressions over normalized datasets.
// Purpose: Add sizes, scaled units and parameter labels without mutating input.
// Dependencies: crate::core::{dataset, value}, serde, thiserror
// ============================================================================

//! ## Overview
//! A [`DeriveExpr`] computes one new column from existing ones. Expressions
//! are evaluated in order, so later expressions may read earlier outputs. A
//! null input yields a null output; a missing input column is a
//! [`DerivationError`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::dataset::Dataset;
use crate::core::value::Value;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Derived-column failures.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DerivationError {
    /// An input column is absent.
    #[error("derivation `{output}` references missing column `{column}`")]
    MissingInput {
        /// Output column of the derivation.
        output: String,
        /// Missing input column.
        column: String,
    },
    /// The output column already exists.
    #[error("derivation `{0}` would overwrite an existing column")]
    DuplicateColumn(String),
    /// An arithmetic input held a non-numeric value.
    #[error("derivation `{output}` found non-numeric `{column}` at row {row}")]
    NonNumeric {
        /// Output column of the derivation.
        output: String,
        /// Offending input column.
        column: String,
        /// Zero-based row index.
        row: usize,
    },
}

// ============================================================================
// SECTION: Expressions
// ============================================================================

/// Default separator for [`DeriveExpr::Concat`].
fn default_separator() -> String {
    ",".to_string()
}

/// Computed-column expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeriveExpr {
    /// Sum of numeric columns; integer when every input is an integer.
    Sum {
        /// Output column.
        name: String,
        /// Input columns.
        columns: Vec<String>,
    },
    /// Numeric column multiplied by a constant factor.
    Scale {
        /// Output column.
        name: String,
        /// Input column.
        column: String,
        /// Multiplier.
        factor: f64,
    },
    /// Text concatenation of columns joined by a separator.
    Concat {
        /// Output column.
        name: String,
        /// Input columns.
        columns: Vec<String>,
        /// Separator between rendered cells.
        #[serde(default = "default_separator")]
        separator: String,
    },
}

impl DeriveExpr {
    /// Creates a sum expression.
    #[must_use]
    pub fn sum(name: &str, columns: &[&str]) -> Self {
        Self::Sum {
            name: name.to_string(),
            columns: columns.iter().map(ToString::to_string).collect(),
        }
    }

    /// Creates a scale expression.
    #[must_use]
    pub fn scale(name: &str, column: &str, factor: f64) -> Self {
        Self::Scale {
            name: name.to_string(),
            column: column.to_string(),
            factor,
        }
    }

    /// Creates a concatenation expression.
    #[must_use]
    pub fn concat(name: &str, columns: &[&str], separator: &str) -> Self {
        Self::Concat {
            name: name.to_string(),
            columns: columns.iter().map(ToString::to_string).collect(),
            separator: separator.to_string(),
        }
    }

    /// Returns the output column name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Sum {
                name,
                ..
            }
            | Self::Scale {
                name,
                ..
            }
            | Self::Concat {
                name,
                ..
            } => name,
        }
    }

    /// Returns the input column names.
    #[must_use]
    pub fn inputs(&self) -> Vec<&str> {
        match self {
            Self::Sum {
                columns,
                ..
            }
            | Self::Concat {
                columns,
                ..
            } => columns.iter().map(String::as_str).collect(),
            Self::Scale {
                column,
                ..
            } => vec![column.as_str()],
        }
    }

    /// Evaluates the expression for every row of the dataset.
    ///
    /// # Errors
    ///
    /// Returns [`DerivationError`] when an input is missing or non-numeric.
    pub fn evaluate(&self, dataset: &Dataset) -> Result<Vec<Value>, DerivationError> {
        let mut indices = Vec::new();
        for column in self.inputs() {
            let index = dataset.column_index(column).ok_or_else(|| DerivationError::MissingInput {
                output: self.name().to_string(),
                column: column.to_string(),
            })?;
            indices.push(index);
        }
        let mut out = Vec::with_capacity(dataset.len());
        for (row, values) in dataset.row_slices().enumerate() {
            let inputs = indices.iter().map(|index| &values[*index]).collect::<Vec<_>>();
            let value = match self {
                Self::Sum {
                    ..
                } => self.sum_cells(row, &inputs)?,
                Self::Scale {
                    factor,
                    ..
                } => self.scale_cell(row, inputs[0], *factor)?,
                Self::Concat {
                    separator,
                    ..
                } => concat_cells(&inputs, separator),
            };
            out.push(value);
        }
        Ok(out)
    }

    /// Sums numeric cells, keeping integers exact while they fit.
    fn sum_cells(&self, row: usize, inputs: &[&Value]) -> Result<Value, DerivationError> {
        if inputs.iter().any(|value| value.is_null()) {
            return Ok(Value::Null);
        }
        let mut integer = Some(0_i64);
        let mut float = 0.0;
        for (position, value) in inputs.iter().enumerate() {
            let number = value.as_f64().ok_or_else(|| self.non_numeric(position, row))?;
            integer = integer.and_then(|sum| value.as_i64().and_then(|int| sum.checked_add(int)));
            float += number;
        }
        Ok(integer.map_or(Value::Float(float), Value::Int))
    }

    /// Multiplies a numeric cell by the factor.
    fn scale_cell(&self, row: usize, input: &Value, factor: f64) -> Result<Value, DerivationError> {
        if input.is_null() {
            return Ok(Value::Null);
        }
        let number = input.as_f64().ok_or_else(|| self.non_numeric(0, row))?;
        Ok(Value::Float(number * factor))
    }

    /// Builds the non-numeric error for an input position.
    fn non_numeric(&self, position: usize, row: usize) -> DerivationError {
        let column = self.inputs().get(position).map_or_else(String::new, ToString::to_string);
        DerivationError::NonNumeric {
            output: self.name().to_string(),
            column,
            row,
        }
    }
}

/// Joins rendered cells; any null input yields null.
fn concat_cells(inputs: &[&Value], separator: &str) -> Value {
    if inputs.iter().any(|value| value.is_null()) {
        return Value::Null;
    }
    let parts = inputs.iter().map(ToString::to_string).collect::<Vec<_>>();
    Value::Text(parts.join(separator))
}
