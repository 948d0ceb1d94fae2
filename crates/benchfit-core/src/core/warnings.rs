// crates/benchfit-core/src/core/warnings.rs
// ============================================================================
// Module: Benchfit Warnings
// Description: Recoverable row- and group-level conditions.
// Purpose: Report isolated failures alongside partial results.
// Dependencies: crate::core::identifiers, tracing
// ============================================================================

//! ## Overview
//! Only a malformed log aborts a run. Every other failure is isolated to the
//! smallest affected unit (a derivation, a run, a row, a group) and reported
//! as a [`Warning`] next to whatever output could still be produced. Warnings
//! are also logged through `tracing` when they are recorded.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use tracing::warn;

use crate::core::identifiers::GroupKey;

// ============================================================================
// SECTION: Warnings
// ============================================================================

/// Recoverable condition recorded during a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    /// A derived column was not added.
    DerivationSkipped {
        /// Output column of the skipped derivation.
        column: String,
        /// Failure description.
        reason: String,
    },
    /// A row lacked a key cell and was left out.
    IncompleteRow {
        /// Zero-based row index.
        row: usize,
        /// Column holding the missing cell.
        column: String,
    },
    /// A run had no baseline record; it has no ratios.
    BaselineMissing {
        /// Run name.
        name: String,
    },
    /// A run had several baseline candidates; it has no ratios.
    BaselineAmbiguous {
        /// Run name.
        name: String,
        /// Number of candidate records.
        candidates: usize,
    },
    /// A (run, solver) pair appeared more than once; the first row was kept.
    DuplicateCell {
        /// Run name.
        name: String,
        /// Solver label.
        solver: String,
    },
    /// A ratio was undefined because the baseline value was zero or non-finite.
    RatioUndefined {
        /// Run name.
        name: String,
        /// Solver label.
        solver: String,
        /// Metric column.
        metric: String,
    },
    /// A regression row fell outside the model domain and was dropped.
    InvalidDomain {
        /// Fitted metric.
        metric: String,
        /// Group the row belonged to.
        group: GroupKey,
        /// Offending independent-variable value.
        x: f64,
    },
    /// A group's curve could not be fitted.
    FitUnavailable {
        /// Fitted metric.
        metric: String,
        /// Affected group.
        group: GroupKey,
        /// Failure description.
        reason: String,
    },
}

impl Warning {
    /// Logs the warning and appends it to the collected list.
    pub(crate) fn record(self, warnings: &mut Vec<Self>) {
        warn!("{self}");
        warnings.push(self);
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DerivationSkipped {
                column,
                reason,
            } => write!(f, "derived column `{column}` skipped: {reason}"),
            Self::IncompleteRow {
                row,
                column,
            } => write!(f, "row {row} skipped: `{column}` is missing"),
            Self::BaselineMissing {
                name,
            } => write!(f, "run `{name}` has no baseline record; ratios omitted"),
            Self::BaselineAmbiguous {
                name,
                candidates,
            } => write!(f, "run `{name}` has {candidates} baseline candidates; ratios omitted"),
            Self::DuplicateCell {
                name,
                solver,
            } => write!(f, "run `{name}` has duplicate rows for solver `{solver}`; kept the first"),
            Self::RatioUndefined {
                name,
                solver,
                metric,
            } => write!(
                f,
                "ratio for run `{name}` solver `{solver}` metric `{metric}` undefined: \
                 baseline value is zero or non-finite"
            ),
            Self::InvalidDomain {
                metric,
                group,
                x,
            } => write!(f, "{metric} {group}: x = {x} outside the model domain; row dropped"),
            Self::FitUnavailable {
                metric,
                group,
                reason,
            } => write!(f, "{metric} {group}: fit unavailable: {reason}"),
        }
    }
}
