// crates/benchfit-core/src/core/value.rs
// ============================================================================
// Module: Benchfit Cell Values
// Description: Dynamically typed cell values for benchmark datasets.
// Purpose: Carry heterogeneous log columns with a deterministic total order.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`Value`] is one cell of a benchmark dataset. Cells are parsed from
//! delimited text either against a declared [`ColumnKind`] or by inference.
//! Values carry a total order (null, booleans, numbers, text) so they can be
//! used inside group keys and sorted deterministically; integers and floats
//! compare numerically.
//!
//! Declared kinds accept the spellings older log versions used: integral
//! floats such as `1000.0` for integer columns and `0`/`1` for flags.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cmp::Ordering;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Text tokens treated as a missing cell.
const NULL_TOKENS: [&str; 5] = ["", "null", "NULL", "NA", "N/A"];

/// 2^63 as a float; every float in `[-2^63, 2^63)` truncates into an i64.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

// ============================================================================
// SECTION: Column Kinds
// ============================================================================

/// Declared storage kind for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Free-form or categorical text.
    Text,
    /// Signed 64-bit integer.
    Integer,
    /// 64-bit float.
    Float,
    /// Boolean flag.
    Bool,
    /// Type inferred per cell (bool, integer, float, then text).
    Inferred,
}

// ============================================================================
// SECTION: Values
// ============================================================================

/// One dataset cell.
///
/// # Invariants
/// - Ordering is total: `Null < Bool < numbers < Text`.
/// - `Int` and `Float` compare numerically, so `Int(2) == Float(2.0)`.
/// - Mixed comparisons are exact, so equality stays transitive for integers
///   beyond 2^53 that no float represents.
/// - `Float(-0.0)` equals `Float(0.0)` and `Int(0)`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Missing cell.
    #[default]
    Null,
    /// Boolean cell.
    Bool(bool),
    /// Integer cell.
    Int(i64),
    /// Float cell.
    Float(f64),
    /// Text cell.
    Text(String),
}

impl Value {
    /// Creates a text value.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Returns true when the cell is missing.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the numeric value of integer and float cells.
    #[must_use]
    #[allow(clippy::cast_precision_loss, reason = "Log integers are far below 2^53.")]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the integer value of integer cells.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the boolean value of boolean cells.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the text of text cells.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Parses a raw cell against a declared column kind.
    ///
    /// # Errors
    ///
    /// Returns a description of the expected kind when the cell cannot be
    /// coerced.
    pub fn parse(raw: &str, kind: ColumnKind) -> Result<Self, String> {
        let trimmed = raw.trim();
        if NULL_TOKENS.contains(&trimmed) {
            return Ok(Self::Null);
        }
        match kind {
            ColumnKind::Text => Ok(Self::Text(trimmed.to_string())),
            ColumnKind::Integer => {
                parse_integer(trimmed).map(Self::Int).ok_or_else(|| "an integer".to_string())
            }
            ColumnKind::Float => {
                trimmed.parse::<f64>().map(Self::Float).map_err(|_| "a number".to_string())
            }
            ColumnKind::Bool => match trimmed {
                "0" => Ok(Self::Bool(false)),
                "1" => Ok(Self::Bool(true)),
                _ => parse_bool(trimmed).map(Self::Bool).ok_or_else(|| "a boolean".to_string()),
            },
            ColumnKind::Inferred => Ok(Self::infer(trimmed)),
        }
    }

    /// Infers the most specific value for a raw cell.
    #[must_use]
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim();
        if NULL_TOKENS.contains(&trimmed) {
            return Self::Null;
        }
        if let Some(flag) = parse_bool(trimmed) {
            return Self::Bool(flag);
        }
        if let Ok(value) = trimmed.parse::<i64>() {
            return Self::Int(value);
        }
        if let Ok(value) = trimmed.parse::<f64>() {
            return Self::Float(value);
        }
        Self::Text(trimmed.to_string())
    }

    /// Rank of the variant within the total order.
    const fn rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool(_) => 1,
            Self::Int(_) | Self::Float(_) => 2,
            Self::Text(_) => 3,
        }
    }
}

/// Parses `true`/`false` tokens, case-insensitively.
fn parse_bool(raw: &str) -> Option<bool> {
    if raw.eq_ignore_ascii_case("true") {
        Some(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Parses an integer cell, accepting integral float spellings.
#[allow(
    clippy::cast_possible_truncation,
    reason = "The float is integral and inside the i64 range before the cast."
)]
fn parse_integer(raw: &str) -> Option<i64> {
    if let Ok(value) = raw.parse::<i64>() {
        return Some(value);
    }
    let value = raw.parse::<f64>().ok()?;
    let in_range = (-I64_BOUND .. I64_BOUND).contains(&value);
    (in_range && value.fract() == 0.0).then_some(value as i64)
}

/// Maps `-0.0` to `0.0` so both zeros order as equal.
const fn unsigned_zero(value: f64) -> f64 {
    // IEEE addition of +0.0 turns -0.0 into +0.0 and leaves everything else.
    value + 0.0
}

/// Compares an integer with a float exactly, without rounding the integer.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    reason = "The float is truncated only inside the i64 range."
)]
fn cmp_int_float(int: i64, float: f64) -> Ordering {
    if float.is_nan() {
        return (int as f64).total_cmp(&float);
    }
    if float >= I64_BOUND {
        return Ordering::Less;
    }
    if float < -I64_BOUND {
        return Ordering::Greater;
    }
    let whole = float.trunc();
    match int.cmp(&(whole as i64)) {
        Ordering::Equal => 0.0_f64.total_cmp(&unsigned_zero(float - whole)),
        ordering => ordering,
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Null, Self::Null) => Ordering::Equal,
            (Self::Bool(left), Self::Bool(right)) => left.cmp(right),
            (Self::Int(left), Self::Int(right)) => left.cmp(right),
            (Self::Float(left), Self::Float(right)) => {
                unsigned_zero(*left).total_cmp(&unsigned_zero(*right))
            }
            (Self::Int(left), Self::Float(right)) => cmp_int_float(*left, *right),
            (Self::Float(left), Self::Int(right)) => cmp_int_float(*right, *left).reverse(),
            (Self::Text(left), Self::Text(right)) => left.cmp(right),
            (left, right) => left.rank().cmp(&right.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(value) => value.fmt(f),
            Self::Int(value) => value.fmt(f),
            Self::Float(value) => value.fmt(f),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
