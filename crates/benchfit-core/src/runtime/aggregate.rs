// crates/benchfit-core/src/runtime/aggregate.rs
// ============================================================================
// Module: Benchfit Group Aggregator
// Description: Baseline-relative ratio tables and grouped summary statistics.
// Purpose: Compare solver configurations run by run and summarize per group.
// Dependencies: crate::{core, runtime::reshape}, csv, serde, thiserror, tracing
// ============================================================================

//! ## Overview
//! [`ratio_table`] divides each solver's measurement by the baseline solver's
//! measurement on the same run and returns the ratios in long form.
//! [`summarize`] reduces any dataset (raw or [`RelativeTable::to_wide`]) to
//! per-group statistics. Summaries are written as CSV and can be re-read
//! with [`SummaryTable::read_delimited`].
//!
//! Failures confined to one run or cell become [`Warning`]s; only caller
//! mistakes (unknown columns, non-numeric metrics) and I/O are errors.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;
use std::io::Read;
use std::io::Write;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::core::ColumnKind;
use crate::core::Dataset;
use crate::core::DatasetError;
use crate::core::GroupKey;
use crate::core::Value;
use crate::core::Warning;
use crate::core::fields;
use crate::runtime::reshape;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default baseline solver label.
pub const DEFAULT_BASELINE_SOLVER: &str = "tulip_approxchol";

/// Column holding the metric name in long ratio output.
pub const METRIC_COLUMN: &str = "metric";

/// Column holding the ratio in long ratio output.
pub const RATIO_COLUMN: &str = "ratio";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Aggregation failures caused by the caller or the output medium.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregateError {
    /// A metric or key column does not exist.
    #[error("unknown column `{0}`")]
    UnknownColumn(String),
    /// A metric cell is not numeric.
    #[error("column `{column}` holds a non-numeric value at row {row}")]
    NonNumeric {
        /// Metric column.
        column: String,
        /// Zero-based row index.
        row: usize,
    },
    /// Reading or writing delimited output failed.
    #[error("summary io error: {0}")]
    Io(String),
    /// Delimited content is malformed.
    #[error("summary csv error: {0}")]
    Csv(String),
}

impl From<DatasetError> for AggregateError {
    fn from(err: DatasetError) -> Self {
        match err {
            DatasetError::UnknownColumn(column) => Self::UnknownColumn(column),
            other => Self::Csv(other.to_string()),
        }
    }
}

impl From<csv::Error> for AggregateError {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() { Self::Io(err.to_string()) } else { Self::Csv(err.to_string()) }
    }
}

// ============================================================================
// SECTION: Baseline Selection
// ============================================================================

/// Chooses the denominator record of each run.
///
/// # Invariants
/// - A run contributes ratios only when exactly one record qualifies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineSelector {
    /// Solver label of the baseline configuration.
    pub solver: String,
    /// Require `is_baseline = true` on the baseline record.
    pub require_flag: bool,
    /// Emit the baseline's own ratio rows (always 1.0).
    pub include_baseline: bool,
}

impl BaselineSelector {
    /// Creates a selector for the given solver with default flags.
    #[must_use]
    pub fn new(solver: impl Into<String>) -> Self {
        Self {
            solver: solver.into(),
            ..Self::default()
        }
    }

    /// Sets whether the baseline record must carry the baseline flag.
    #[must_use]
    pub const fn require_flag(mut self, require_flag: bool) -> Self {
        self.require_flag = require_flag;
        self
    }

    /// Sets whether the baseline's own rows are emitted.
    #[must_use]
    pub const fn include_baseline(mut self, include_baseline: bool) -> Self {
        self.include_baseline = include_baseline;
        self
    }
}

impl Default for BaselineSelector {
    fn default() -> Self {
        Self {
            solver: DEFAULT_BASELINE_SOLVER.to_string(),
            require_flag: true,
            include_baseline: false,
        }
    }
}

// ============================================================================
// SECTION: Relative Tables
// ============================================================================

/// One (run, solver, metric) ratio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioRow {
    /// Run name.
    pub name: String,
    /// Solver label of the variant record.
    pub solver: String,
    /// Metric column.
    pub metric: String,
    /// Variant value divided by baseline value.
    pub ratio: f64,
    /// Group-key values taken from the variant record.
    pub group: GroupKey,
}

/// Long-form ratio table with the warnings raised while building it.
///
/// # Invariants
/// - Rows are sorted by group, run name, solver, then requested metric order.
/// - Every ratio is finite.
#[derive(Debug, Clone, PartialEq)]
pub struct RelativeTable {
    /// Group key column names carried by every row.
    group_columns: Vec<String>,
    /// Requested metric order.
    metrics: Vec<String>,
    /// Ratio rows.
    rows: Vec<RatioRow>,
    /// Recoverable conditions.
    warnings: Vec<Warning>,
}

impl RelativeTable {
    /// Returns the group key column names.
    #[must_use]
    pub fn group_columns(&self) -> &[String] {
        &self.group_columns
    }

    /// Returns the metric names in requested order.
    #[must_use]
    pub fn metrics(&self) -> &[String] {
        &self.metrics
    }

    /// Returns the ratio rows.
    #[must_use]
    pub fn rows(&self) -> &[RatioRow] {
        &self.rows
    }

    /// Returns the warnings raised while building the table.
    #[must_use]
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Returns the number of ratio rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true when no ratio was produced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the ratio for one (run, solver, metric) cell.
    #[must_use]
    pub fn ratio(&self, name: &str, solver: &str, metric: &str) -> Option<f64> {
        self.rows
            .iter()
            .find(|row| row.name == name && row.solver == solver && row.metric == metric)
            .map(|row| row.ratio)
    }

    /// Returns the long form as a dataset: name, solver, group keys, metric, ratio.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError`] when a group column collides with a fixed
    /// output column.
    pub fn to_long(&self) -> Result<Dataset, AggregateError> {
        let mut columns = vec![fields::NAME.to_string(), fields::SOLVER.to_string()];
        columns.extend(self.group_columns.iter().cloned());
        columns.push(METRIC_COLUMN.to_string());
        columns.push(RATIO_COLUMN.to_string());
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut cells = vec![Value::text(&row.name), Value::text(&row.solver)];
                cells.extend(row.group.values().iter().cloned());
                cells.push(Value::text(&row.metric));
                cells.push(Value::Float(row.ratio));
                cells
            })
            .collect();
        Ok(Dataset::from_rows(columns, rows)?)
    }

    /// Reshapes to one row per (run, solver) with one column per metric.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError`] when a metric name collides with a key column.
    pub fn to_wide(&self) -> Result<Dataset, AggregateError> {
        let long = self.to_long()?;
        let mut index = vec![fields::NAME, fields::SOLVER];
        index.extend(self.group_columns.iter().map(String::as_str));
        let pivot = reshape::pivot(&long, &index, METRIC_COLUMN, RATIO_COLUMN)?;
        Ok(pivot.dataset)
    }
}

/// Builds the baseline-relative ratio table.
///
/// # Errors
///
/// Returns [`AggregateError::UnknownColumn`] when a metric, group or flag
/// column is absent and [`AggregateError::NonNumeric`] when a metric cell is
/// not a number.
pub fn ratio_table(
    dataset: &Dataset,
    metrics: &[&str],
    baseline: &BaselineSelector,
    group_keys: &[&str],
) -> Result<RelativeTable, AggregateError> {
    let name_at = dataset.require_column(fields::NAME)?;
    let solver_at = dataset.require_column(fields::SOLVER)?;
    let metric_at = metrics
        .iter()
        .map(|metric| dataset.require_column(metric))
        .collect::<Result<Vec<_>, _>>()?;
    let group_at = group_keys
        .iter()
        .map(|key| dataset.require_column(key))
        .collect::<Result<Vec<_>, _>>()?;
    let flag_at = if baseline.require_flag {
        Some(dataset.require_column(fields::IS_BASELINE)?)
    } else {
        None
    };

    let cells = dataset.row_slices().collect::<Vec<_>>();
    let mut warnings = Vec::new();
    let mut runs: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (row, values) in cells.iter().enumerate() {
        if let Some(column) = [(name_at, fields::NAME), (solver_at, fields::SOLVER)]
            .into_iter()
            .find_map(|(at, column)| values[at].is_null().then_some(column))
        {
            Warning::IncompleteRow {
                row,
                column: column.to_string(),
            }
            .record(&mut warnings);
            continue;
        }
        runs.entry(values[name_at].to_string()).or_default().push(row);
    }

    let mut rows = Vec::new();
    for (name, members) in &runs {
        let candidates = members
            .iter()
            .copied()
            .filter(|row| {
                let values = cells[*row];
                values[solver_at].as_str() == Some(baseline.solver.as_str())
                    && flag_at.is_none_or(|at| values[at].as_bool() == Some(true))
            })
            .collect::<Vec<_>>();
        let base = match candidates.as_slice() {
            [base] => *base,
            [] => {
                Warning::BaselineMissing {
                    name: name.clone(),
                }
                .record(&mut warnings);
                continue;
            }
            many => {
                Warning::BaselineAmbiguous {
                    name: name.clone(),
                    candidates: many.len(),
                }
                .record(&mut warnings);
                continue;
            }
        };

        let mut seen = BTreeSet::new();
        for row in members.iter().copied() {
            let solver = cells[row][solver_at].to_string();
            let is_base = row == base;
            if (!is_base && solver == baseline.solver) || (is_base && !baseline.include_baseline) {
                continue;
            }
            if !seen.insert(solver.clone()) {
                Warning::DuplicateCell {
                    name: name.clone(),
                    solver,
                }
                .record(&mut warnings);
                continue;
            }
            let group = dataset.key_of(row, &group_at);
            for (metric, at) in metrics.iter().zip(&metric_at) {
                let Some(value) = numeric_cell(cells[row], row, *at, metric)? else {
                    continue;
                };
                let Some(denominator) = numeric_cell(cells[base], base, *at, metric)? else {
                    continue;
                };
                let ratio = value / denominator;
                if denominator == 0.0 || !denominator.is_finite() || !ratio.is_finite() {
                    Warning::RatioUndefined {
                        name: name.clone(),
                        solver: solver.clone(),
                        metric: (*metric).to_string(),
                    }
                    .record(&mut warnings);
                    continue;
                }
                rows.push(RatioRow {
                    name: name.clone(),
                    solver: solver.clone(),
                    metric: (*metric).to_string(),
                    ratio,
                    group: group.clone(),
                });
            }
        }
    }

    let order = |metric: &str| metrics.iter().position(|candidate| *candidate == metric);
    rows.sort_by(|left, right| {
        left.group
            .cmp(&right.group)
            .then_with(|| left.name.cmp(&right.name))
            .then_with(|| left.solver.cmp(&right.solver))
            .then_with(|| order(&left.metric).cmp(&order(&right.metric)))
    });
    debug!(runs = runs.len(), ratios = rows.len(), warnings = warnings.len(), "built ratio table");
    Ok(RelativeTable {
        group_columns: group_keys.iter().map(ToString::to_string).collect(),
        metrics: metrics.iter().map(ToString::to_string).collect(),
        rows,
        warnings,
    })
}

/// Reads a metric cell as a number; null is `None`.
fn numeric_cell(
    cells: &[Value],
    row: usize,
    at: usize,
    column: &str,
) -> Result<Option<f64>, AggregateError> {
    let value = &cells[at];
    if value.is_null() {
        return Ok(None);
    }
    value.as_f64().map(Some).ok_or_else(|| AggregateError::NonNumeric {
        column: column.to_string(),
        row,
    })
}

// ============================================================================
// SECTION: Reducers
// ============================================================================

/// Summary statistic applied to the non-null values of one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reducer {
    /// Smallest value.
    Min,
    /// Largest value.
    Max,
    /// Middle value; the mean of the two middle values for even counts.
    Median,
    /// Arithmetic mean.
    Mean,
    /// Number of non-null values.
    Count,
}

impl Reducer {
    /// Returns the label used in output column names.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Min => "min",
            Self::Max => "max",
            Self::Median => "median",
            Self::Mean => "mean",
            Self::Count => "count",
        }
    }

    /// Returns the output column name for a metric.
    #[must_use]
    pub fn column_name(self, metric: &str) -> String {
        format!("{}_{metric}", self.label())
    }

    /// Reduces values sorted ascending; `None` when there are none.
    #[must_use]
    #[allow(clippy::cast_precision_loss, reason = "Group sizes are far below 2^53.")]
    pub fn apply(self, sorted: &[f64]) -> Option<f64> {
        let (first, last) = (sorted.first()?, sorted.last()?);
        let count = sorted.len();
        Some(match self {
            Self::Min => *first,
            Self::Max => *last,
            Self::Median => median_sorted(sorted),
            Self::Mean => sorted.iter().sum::<f64>() / count as f64,
            Self::Count => count as f64,
        })
    }
}

impl fmt::Display for Reducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Median of a non-empty ascending slice.
fn median_sorted(sorted: &[f64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        f64::midpoint(sorted[mid - 1], sorted[mid])
    }
}

/// Median of unsorted values; `None` when empty.
#[must_use]
pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    Reducer::Median.apply(&sorted)
}

/// Rounds half away from zero to the given number of decimals.
#[must_use]
pub fn round_to(value: f64, digits: u8) -> f64 {
    let factor = 10_f64.powi(i32::from(digits));
    (value * factor).round() / factor
}

// ============================================================================
// SECTION: Summary Tables
// ============================================================================

/// One summarized group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    /// Group key values.
    pub key: GroupKey,
    /// Statistic values aligned with the table's value columns.
    pub values: Vec<Option<f64>>,
}

/// Grouped summary statistics.
///
/// # Invariants
/// - Rows are sorted by key and keys are unique.
/// - Every row has one value per value column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryTable {
    /// Group key column names.
    key_columns: Vec<String>,
    /// Statistic column names, `<reducer>_<metric>`.
    value_columns: Vec<String>,
    /// Summary rows.
    rows: Vec<SummaryRow>,
}

impl SummaryTable {
    /// Returns the group key column names.
    #[must_use]
    pub fn key_columns(&self) -> &[String] {
        &self.key_columns
    }

    /// Returns the statistic column names.
    #[must_use]
    pub fn value_columns(&self) -> &[String] {
        &self.value_columns
    }

    /// Returns the summary rows.
    #[must_use]
    pub fn rows(&self) -> &[SummaryRow] {
        &self.rows
    }

    /// Returns the number of groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true when no group was summarized.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns one statistic for one group.
    #[must_use]
    pub fn value(&self, key: &GroupKey, column: &str) -> Option<f64> {
        let at = self.value_columns.iter().position(|name| name == column)?;
        let row = self.rows.iter().find(|row| &row.key == key)?;
        row.values.get(at).copied().flatten()
    }

    /// Drops groups whose key column equals the given value.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError::UnknownColumn`] when `column` is not a key column.
    pub fn exclude(&self, column: &str, value: &Value) -> Result<Self, AggregateError> {
        let at = self
            .key_columns
            .iter()
            .position(|name| name == column)
            .ok_or_else(|| AggregateError::UnknownColumn(column.to_string()))?;
        Ok(Self {
            key_columns: self.key_columns.clone(),
            value_columns: self.value_columns.clone(),
            rows: self.rows.iter().filter(|row| row.key.get(at) != Some(value)).cloned().collect(),
        })
    }

    /// Converts the summary into a dataset with key then statistic columns.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError`] when a statistic name collides with a key column.
    pub fn to_dataset(&self) -> Result<Dataset, AggregateError> {
        let mut columns = self.key_columns.clone();
        columns.extend(self.value_columns.iter().cloned());
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut cells = row.key.values().to_vec();
                cells.extend(row.values.iter().map(|value| value.map_or(Value::Null, Value::Float)));
                cells
            })
            .collect();
        Ok(Dataset::from_rows(columns, rows)?)
    }

    /// Writes the table as CSV: key columns, then statistic columns.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError`] when the writer fails.
    pub fn write_delimited<W: Write>(&self, writer: W) -> Result<(), AggregateError> {
        let mut out = csv::Writer::from_writer(writer);
        out.write_record(self.key_columns.iter().chain(&self.value_columns))?;
        for row in &self.rows {
            let keys = row.key.values().iter().map(ToString::to_string);
            let stats = row.values.iter().map(|value| value.map(|v| v.to_string()).unwrap_or_default());
            out.write_record(keys.chain(stats))?;
        }
        out.flush().map_err(|err| AggregateError::Io(err.to_string()))
    }

    /// Reads a table written by [`SummaryTable::write_delimited`].
    ///
    /// The first `key_kinds.len()` columns are group keys, each parsed with
    /// its declared kind so a text key such as `1e-6` stays text; the rest
    /// are statistics, empty meaning null.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError`] when the content is not a summary table or
    /// a key cell does not fit its kind.
    pub fn read_delimited<R: Read>(
        reader: R,
        key_kinds: &[ColumnKind],
    ) -> Result<Self, AggregateError> {
        let key_count = key_kinds.len();
        let mut input = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
        let headers = input.headers()?.iter().map(ToString::to_string).collect::<Vec<_>>();
        if headers.len() < key_count {
            return Err(AggregateError::Csv(format!(
                "expected at least {key_count} key columns, found {}",
                headers.len()
            )));
        }
        let (keys, values) = headers.split_at(key_count);
        let mut rows = Vec::new();
        for record in input.records() {
            let record = record?;
            let key = record
                .iter()
                .zip(key_kinds)
                .map(|(cell, kind)| {
                    Value::parse(cell, *kind).map_err(|expected| {
                        AggregateError::Csv(format!("key `{cell}` is not {expected}"))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            let key = GroupKey::new(key);
            let stats = record
                .iter()
                .skip(key_count)
                .map(|cell| {
                    if cell.is_empty() {
                        Ok(None)
                    } else {
                        cell.parse::<f64>()
                            .map(Some)
                            .map_err(|_| AggregateError::Csv(format!("`{cell}` is not a number")))
                    }
                })
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(SummaryRow {
                key,
                values: stats,
            });
        }
        Ok(Self {
            key_columns: keys.to_vec(),
            value_columns: values.to_vec(),
            rows,
        })
    }
}

/// Summarizes metrics per group with the requested reducers.
///
/// Statistic columns are ordered metric by metric, reducers in request order
/// within each metric. Null metric values are ignored; a group without any
/// value for a metric gets null statistics for it.
///
/// # Errors
///
/// Returns [`AggregateError::UnknownColumn`] for an absent key or metric
/// column and [`AggregateError::NonNumeric`] for a non-numeric metric cell.
pub fn summarize(
    dataset: &Dataset,
    group_keys: &[&str],
    metrics: &[&str],
    reducers: &[Reducer],
    round_digits: Option<u8>,
) -> Result<SummaryTable, AggregateError> {
    let metric_at = metrics
        .iter()
        .map(|metric| dataset.require_column(metric))
        .collect::<Result<Vec<_>, _>>()?;
    let groups = dataset.group_indices(group_keys)?;
    let cells = dataset.row_slices().collect::<Vec<_>>();

    let mut rows = Vec::with_capacity(groups.len());
    for (key, members) in groups {
        let mut values = Vec::with_capacity(metrics.len() * reducers.len());
        for (metric, at) in metrics.iter().zip(&metric_at) {
            let mut observed = Vec::with_capacity(members.len());
            for row in &members {
                if let Some(value) = numeric_cell(cells[*row], *row, *at, metric)? {
                    observed.push(value);
                }
            }
            observed.sort_by(f64::total_cmp);
            for reducer in reducers {
                let stat = reducer.apply(&observed);
                values.push(match round_digits {
                    Some(digits) => stat.map(|value| round_to(value, digits)),
                    None => stat,
                });
            }
        }
        rows.push(SummaryRow {
            key,
            values,
        });
    }
    debug!(groups = rows.len(), "summarized dataset");
    Ok(SummaryTable {
        key_columns: group_keys.iter().map(ToString::to_string).collect(),
        value_columns: metrics
            .iter()
            .flat_map(|metric| reducers.iter().map(move |reducer| reducer.column_name(metric)))
            .collect(),
        rows,
    })
}
