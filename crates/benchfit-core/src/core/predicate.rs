// crates/benchfit-core/src/core/predicate.rs
// ============================================================================
// Module: Benchfit Row Predicates
// Description: Row-level filters over normalized datasets.
// Purpose: Express allow-lists, numeric thresholds and null exclusion as data.
// Dependencies: crate::core::{dataset, schema, value}, serde
// ============================================================================

//! ## Overview
//! A [`FilterSet`] is a conjunction of [`Predicate`]s. Filters are pure data
//! so they can be declared in configuration and applied uniformly. A
//! predicate over a column the dataset does not have matches no row, and a
//! null cell never satisfies a membership or range test.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::dataset::RowRef;
use crate::core::schema::fields;
use crate::core::value::Value;

// ============================================================================
// SECTION: Predicates
// ============================================================================

/// Single row predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Predicate {
    /// Cell value is one of the listed values.
    InSet {
        /// Column tested.
        column: String,
        /// Accepted values.
        values: Vec<Value>,
    },
    /// Cell value is non-null and none of the listed values.
    NotInSet {
        /// Column tested.
        column: String,
        /// Rejected values.
        values: Vec<Value>,
    },
    /// Numeric cell lies in `[min, max)`; absent bounds are open.
    Range {
        /// Column tested.
        column: String,
        /// Inclusive lower bound.
        #[serde(default)]
        min: Option<f64>,
        /// Exclusive upper bound.
        #[serde(default)]
        max: Option<f64>,
    },
    /// Cell is not null.
    NotNull {
        /// Column tested.
        column: String,
    },
    /// Boolean cell is true.
    IsTrue {
        /// Column tested.
        column: String,
    },
}

impl Predicate {
    /// Returns the column the predicate reads.
    #[must_use]
    pub fn column(&self) -> &str {
        match self {
            Self::InSet {
                column,
                ..
            }
            | Self::NotInSet {
                column,
                ..
            }
            | Self::Range {
                column,
                ..
            }
            | Self::NotNull {
                column,
            }
            | Self::IsTrue {
                column,
            } => column,
        }
    }

    /// Evaluates the predicate against one row.
    #[must_use]
    pub fn matches(&self, row: &RowRef<'_>) -> bool {
        let Some(cell) = row.get(self.column()) else {
            return false;
        };
        match self {
            Self::InSet {
                values,
                ..
            } => !cell.is_null() && values.contains(cell),
            Self::NotInSet {
                values,
                ..
            } => !cell.is_null() && !values.contains(cell),
            Self::Range {
                min,
                max,
                ..
            } => cell.as_f64().is_some_and(|value| {
                min.is_none_or(|min| value >= min) && max.is_none_or(|max| value < max)
            }),
            Self::NotNull {
                ..
            } => !cell.is_null(),
            Self::IsTrue {
                ..
            } => cell.as_bool() == Some(true),
        }
    }
}

// ============================================================================
// SECTION: Filter Sets
// ============================================================================

/// Conjunction of predicates; the empty set keeps every row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSet {
    /// Predicates that must all hold.
    predicates: Vec<Predicate>,
}

impl FilterSet {
    /// Creates an empty filter set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            predicates: Vec::new(),
        }
    }

    /// Adds a predicate.
    #[must_use]
    pub fn with(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Keeps rows whose column value is in the list.
    #[must_use]
    pub fn one_of<V: Into<Value>>(self, column: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.with(Predicate::InSet {
            column: column.to_string(),
            values: values.into_iter().map(Into::into).collect(),
        })
    }

    /// Keeps rows whose solver is in the allow-list.
    #[must_use]
    pub fn solvers<'a>(self, solvers: impl IntoIterator<Item = &'a str>) -> Self {
        self.one_of(fields::SOLVER, solvers)
    }

    /// Keeps rows whose problem class is in the allow-list.
    #[must_use]
    pub fn problem_classes<'a>(self, classes: impl IntoIterator<Item = &'a str>) -> Self {
        self.one_of(fields::PROBLEM_CLASS, classes)
    }

    /// Keeps rows flagged as the canonical parameterization.
    #[must_use]
    pub fn baseline_only(self) -> Self {
        self.with(Predicate::IsTrue {
            column: fields::IS_BASELINE.to_string(),
        })
    }

    /// Keeps rows whose numeric column lies in `[min, max)`.
    #[must_use]
    pub fn range(self, column: &str, min: Option<f64>, max: Option<f64>) -> Self {
        self.with(Predicate::Range {
            column: column.to_string(),
            min,
            max,
        })
    }

    /// Keeps rows whose column is non-null.
    #[must_use]
    pub fn not_null(self, column: &str) -> Self {
        self.with(Predicate::NotNull {
            column: column.to_string(),
        })
    }

    /// Returns the predicates.
    #[must_use]
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Returns true when the set holds no predicate.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Evaluates every predicate against one row.
    #[must_use]
    pub fn matches(&self, row: &RowRef<'_>) -> bool {
        self.predicates.iter().all(|predicate| predicate.matches(row))
    }
}

impl From<Vec<Predicate>> for FilterSet {
    fn from(predicates: Vec<Predicate>) -> Self {
        Self {
            predicates,
        }
    }
}
