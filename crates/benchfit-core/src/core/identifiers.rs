// crates/benchfit-core/src/core/identifiers.rs
// ============================================================================
// Module: Benchfit Identifiers
// Description: Group and curve keys used to partition benchmark datasets.
// Purpose: Provide ordered, serializable keys with stable display forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Group keys identify one aggregation or regression unit: a tuple of cell
//! values drawn from a caller-chosen list of categorical columns. Keys order
//! lexicographically over the tuple, which fixes the presentation order of
//! every grouped output.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::value::Value;

// ============================================================================
// SECTION: Group Keys
// ============================================================================

/// Tuple of key values identifying one group.
///
/// # Invariants
/// - Ordering is lexicographic over the tuple using the [`Value`] total order.
/// - The empty key identifies the single group of an ungrouped dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupKey(Vec<Value>);

impl GroupKey {
    /// Creates a group key from its values.
    #[must_use]
    pub const fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    /// Returns the key values in column order.
    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.0
    }

    /// Returns the number of key columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true for the empty key.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the value at the given key position.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    /// Consumes the key, returning its values.
    #[must_use]
    pub fn into_values(self) -> Vec<Value> {
        self.0
    }
}

impl From<Vec<Value>> for GroupKey {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (index, value) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            value.fmt(f)?;
        }
        f.write_str(")")
    }
}

// ============================================================================
// SECTION: Curve Keys
// ============================================================================

/// Identifier of one fitted curve: a group and the fitted metric.
///
/// # Invariants
/// - Ordered by metric first, then group, matching per-metric presentation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CurveKey {
    /// Dependent metric column name.
    pub metric: String,
    /// Group the curve was fitted on.
    pub group: GroupKey,
}

impl CurveKey {
    /// Creates a curve key.
    #[must_use]
    pub fn new(metric: impl Into<String>, group: GroupKey) -> Self {
        Self {
            metric: metric.into(),
            group,
        }
    }
}

impl fmt::Display for CurveKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.metric, self.group)
    }
}
