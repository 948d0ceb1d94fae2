// crates/benchfit-core/src/runtime/reshape.rs
// ============================================================================
// Module: Benchfit Reshaping
// Description: Pure pivot and melt transforms over datasets.
// Purpose: Move between long (one row per observation) and wide layouts.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! [`pivot`] spreads the values of one column into one column per distinct
//! key; [`melt`] stacks several columns back into (variable, value) pairs.
//! Both are pure and deterministic: output rows follow the sorted index key
//! and pivot columns follow the sorted pivot values.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use crate::core::Dataset;
use crate::core::DatasetError;
use crate::core::GroupKey;
use crate::core::Value;

// ============================================================================
// SECTION: Pivot
// ============================================================================

/// Result of [`pivot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pivot {
    /// Wide dataset: index columns, then one column per pivot value.
    pub dataset: Dataset,
    /// (index key, pivot value) cells that appeared more than once.
    pub duplicates: Vec<(GroupKey, Value)>,
}

/// Spreads `value_key` into one column per distinct `pivot_key` value.
///
/// Rows with a null pivot value are ignored. When an (index, pivot) cell
/// repeats, the first occurrence wins and the cell is listed in
/// [`Pivot::duplicates`]. Absent cells are null.
///
/// # Errors
///
/// Returns [`DatasetError`] when a named column is unknown or a pivot value
/// renders to the name of an index column.
pub fn pivot(
    dataset: &Dataset,
    index: &[&str],
    pivot_key: &str,
    value_key: &str,
) -> Result<Pivot, DatasetError> {
    let index_at = index
        .iter()
        .map(|column| dataset.require_column(column))
        .collect::<Result<Vec<_>, _>>()?;
    let pivot_at = dataset.require_column(pivot_key)?;
    let value_at = dataset.require_column(value_key)?;

    let mut spread: BTreeSet<Value> = BTreeSet::new();
    let mut cells: BTreeMap<GroupKey, BTreeMap<Value, Value>> = BTreeMap::new();
    let mut duplicates = Vec::new();
    for (row, values) in dataset.row_slices().enumerate() {
        let pivot_value = &values[pivot_at];
        if pivot_value.is_null() {
            continue;
        }
        spread.insert(pivot_value.clone());
        let key = dataset.key_of(row, &index_at);
        let entry = cells.entry(key.clone()).or_default();
        if entry.contains_key(pivot_value) {
            duplicates.push((key, pivot_value.clone()));
        } else {
            entry.insert(pivot_value.clone(), values[value_at].clone());
        }
    }

    let mut columns = index.iter().map(ToString::to_string).collect::<Vec<_>>();
    columns.extend(spread.iter().map(ToString::to_string));
    let rows = cells
        .into_iter()
        .map(|(key, mut row_cells)| {
            let mut row = key.into_values();
            row.extend(spread.iter().map(|value| row_cells.remove(value).unwrap_or_default()));
            row
        })
        .collect();
    Ok(Pivot {
        dataset: Dataset::from_rows(columns, rows)?,
        duplicates,
    })
}

// ============================================================================
// SECTION: Melt
// ============================================================================

/// Stacks `value_columns` into `variable_name`/`value_name` pairs.
///
/// Output holds the `id_columns`, then the variable and value columns. Rows
/// are emitted column by column: every input row for the first value column,
/// then every input row for the next.
///
/// # Errors
///
/// Returns [`DatasetError`] when a named column is unknown or an output
/// column name repeats.
pub fn melt(
    dataset: &Dataset,
    id_columns: &[&str],
    value_columns: &[&str],
    variable_name: &str,
    value_name: &str,
) -> Result<Dataset, DatasetError> {
    let id_at = id_columns
        .iter()
        .map(|column| dataset.require_column(column))
        .collect::<Result<Vec<_>, _>>()?;
    let value_at = value_columns
        .iter()
        .map(|column| dataset.require_column(column))
        .collect::<Result<Vec<_>, _>>()?;

    let mut rows = Vec::with_capacity(dataset.len() * value_columns.len());
    for (column, at) in value_columns.iter().zip(&value_at) {
        for values in dataset.row_slices() {
            let mut row = id_at.iter().map(|index| values[*index].clone()).collect::<Vec<_>>();
            row.push(Value::text(*column));
            row.push(values[*at].clone());
            rows.push(row);
        }
    }
    let mut columns = id_columns.iter().map(ToString::to_string).collect::<Vec<_>>();
    columns.push(variable_name.to_string());
    columns.push(value_name.to_string());
    Dataset::from_rows(columns, rows)
}
