// crates/benchfit-core/src/core/schema.rs
// ============================================================================
// Module: Benchfit Schema Aliases
// Description: Canonical field table and historical column aliases.
// Purpose: Normalize every known log naming scheme into one schema at load.
// Dependencies: crate::core::value
// ============================================================================

//! ## Overview
//! Benchmark logs were written by several generations of tooling, each with
//! its own column names (`probclass`, `labels`, `problem_class`, ...). The
//! [`SchemaAliases`] table declares, per canonical field, its storage kind,
//! whether it is required, and the ordered list of names it may appear under.
//! Resolution picks the first alias present in the header and fails loudly
//! when a required field has none; there is no silent defaulting.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use tracing::warn;

use crate::core::dataset::LoadError;
use crate::core::value::ColumnKind;

// ============================================================================
// SECTION: Canonical Field Names
// ============================================================================

/// Canonical field names produced by [`SchemaAliases::standard`].
pub mod fields {
    /// Unique run identifier.
    pub const NAME: &str = "name";
    /// Problem-family label.
    pub const PROBLEM_CLASS: &str = "problem_class";
    /// Solver-configuration label.
    pub const SOLVER: &str = "solver";
    /// Canonical-parameterization flag.
    pub const IS_BASELINE: &str = "is_baseline";
    /// Vertex count.
    pub const VERTICES: &str = "vertices";
    /// Arc count.
    pub const ARCS: &str = "arcs";
    /// Iteration count.
    pub const ITERATIONS: &str = "iterations";
    /// Wall-clock seconds.
    pub const TIME_SECONDS: &str = "time_seconds";
    /// Seconds per arc per iteration.
    pub const TIME_PER_ARC_PER_ITER: &str = "time_per_arc_per_iter";
    /// Factorization seconds per arc per iteration.
    pub const FACTORIZATION_TIME_PER_ARC_PER_ITER: &str = "factorization_time_per_arc_per_iter";
    /// Inner linear-solve calls per iteration.
    pub const INNER_SOLVES_PER_ITER: &str = "inner_solves_per_iter";
    /// Conjugate-gradient tolerance parameter.
    pub const CG_TOLERANCE: &str = "cg_tolerance";
    /// Primal feasibility tolerance parameter.
    pub const PRIMAL_TOLERANCE: &str = "primal_tolerance";
    /// Dual feasibility tolerance parameter.
    pub const DUAL_TOLERANCE: &str = "dual_tolerance";
    /// Floating-point precision width parameter.
    pub const FLOAT_BITS: &str = "float_bits";
    /// Derived `vertices + arcs`.
    pub const GRAPH_SIZE: &str = "graph_size";
}

// ============================================================================
// SECTION: Alias Table
// ============================================================================

/// One canonical field and the historical names it may appear under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldAlias {
    /// Canonical column name after normalization.
    pub canonical: String,
    /// Storage kind cells are coerced to.
    pub kind: ColumnKind,
    /// Whether load fails when no alias is present.
    pub required: bool,
    /// Whether numeric cells must be non-negative.
    pub non_negative: bool,
    /// Accepted header names, in resolution priority order.
    pub aliases: Vec<String>,
}

impl FieldAlias {
    /// Creates a field alias entry.
    #[must_use]
    pub fn new(canonical: &str, kind: ColumnKind, required: bool, aliases: &[&str]) -> Self {
        Self {
            canonical: canonical.to_string(),
            kind,
            required,
            non_negative: false,
            aliases: aliases.iter().map(ToString::to_string).collect(),
        }
    }

    /// Marks numeric cells of this field as non-negative.
    #[must_use]
    pub const fn non_negative(mut self) -> Self {
        self.non_negative = true;
        self
    }
}

/// Declared alias table mapping canonical fields to historical names.
///
/// # Invariants
/// - Canonical names are unique.
/// - Every alias list is non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaAliases {
    /// Canonical field entries in output column order.
    fields: Vec<FieldAlias>,
}

impl SchemaAliases {
    /// Creates an alias table from explicit entries.
    #[must_use]
    pub const fn new(fields: Vec<FieldAlias>) -> Self {
        Self {
            fields,
        }
    }

    /// Returns the alias table covering every known benchmark log version.
    #[must_use]
    pub fn standard() -> Self {
        use fields::*;

        Self::new(vec![
            FieldAlias::new(NAME, ColumnKind::Text, true, &[NAME]),
            FieldAlias::new(
                PROBLEM_CLASS,
                ColumnKind::Text,
                true,
                &[PROBLEM_CLASS, "probclass", "labels"],
            ),
            FieldAlias::new(SOLVER, ColumnKind::Text, true, &[SOLVER]),
            FieldAlias::new(IS_BASELINE, ColumnKind::Bool, false, &[IS_BASELINE, "baseline"]),
            FieldAlias::new(VERTICES, ColumnKind::Integer, true, &[VERTICES])
                .non_negative(),
            FieldAlias::new(ARCS, ColumnKind::Integer, true, &[ARCS]).non_negative(),
            FieldAlias::new(ITERATIONS, ColumnKind::Integer, true, &[ITERATIONS, "iters"])
                .non_negative(),
            FieldAlias::new(TIME_SECONDS, ColumnKind::Float, false, &[TIME_SECONDS, "time_s"])
                .non_negative(),
            FieldAlias::new(
                TIME_PER_ARC_PER_ITER,
                ColumnKind::Float,
                false,
                &[TIME_PER_ARC_PER_ITER, "time_s_per_arc_per_iter"],
            ),
            FieldAlias::new(
                FACTORIZATION_TIME_PER_ARC_PER_ITER,
                ColumnKind::Float,
                false,
                &[FACTORIZATION_TIME_PER_ARC_PER_ITER, "fact_s_per_arc_per_iter"],
            ),
            FieldAlias::new(
                INNER_SOLVES_PER_ITER,
                ColumnKind::Float,
                false,
                &[INNER_SOLVES_PER_ITER, "sddm_calls_per_iter"],
            ),
            FieldAlias::new(CG_TOLERANCE, ColumnKind::Text, false, &[CG_TOLERANCE, "epcg"]),
            FieldAlias::new(PRIMAL_TOLERANCE, ColumnKind::Text, false, &[PRIMAL_TOLERANCE, "rhop"]),
            FieldAlias::new(DUAL_TOLERANCE, ColumnKind::Text, false, &[DUAL_TOLERANCE, "rhod"]),
            FieldAlias::new(FLOAT_BITS, ColumnKind::Text, false, &[FLOAT_BITS, "floatbits"]),
        ])
    }

    /// Returns the field entries.
    #[must_use]
    pub fn fields(&self) -> &[FieldAlias] {
        &self.fields
    }

    /// Returns the entry for a canonical field.
    #[must_use]
    pub fn field(&self, canonical: &str) -> Option<&FieldAlias> {
        self.fields.iter().find(|field| field.canonical == canonical)
    }

    /// Returns the declared kind of each column, `Inferred` for unknown ones.
    #[must_use]
    pub fn kinds_of(&self, columns: &[&str]) -> Vec<ColumnKind> {
        columns
            .iter()
            .map(|column| self.field(column).map_or(ColumnKind::Inferred, |field| field.kind))
            .collect()
    }

    /// Resolves a log header into canonical output columns.
    ///
    /// Canonical fields come first in table order; unrecognized columns pass
    /// through afterwards in header order with inferred cell types. A column
    /// shadowed by a higher-priority alias of the same field is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::MalformedLog`] when a required field has no alias
    /// in the header, and [`LoadError::DuplicateColumn`] when a pass-through
    /// name repeats or collides with a canonical name.
    pub fn resolve(&self, header: &[String]) -> Result<ResolvedSchema, LoadError> {
        let mut columns = Vec::new();
        let mut consumed = BTreeSet::new();
        for field in &self.fields {
            let mut present = field
                .aliases
                .iter()
                .filter_map(|alias| position(header, alias).map(|at| (alias, at)));
            match present.next() {
                Some((_, source)) => {
                    consumed.insert(source);
                    columns.push(ResolvedColumn {
                        name: field.canonical.clone(),
                        kind: field.kind,
                        non_negative: field.non_negative,
                        source,
                    });
                    for (alias, shadowed) in present {
                        warn!(
                            field = %field.canonical,
                            column = %alias,
                            "dropping column shadowed by a higher-priority alias"
                        );
                        consumed.insert(shadowed);
                    }
                }
                None if field.required => {
                    return Err(LoadError::MalformedLog {
                        field: field.canonical.clone(),
                        aliases: field.aliases.clone(),
                    });
                }
                None => {}
            }
        }
        for (source, name) in header.iter().enumerate() {
            if consumed.contains(&source) {
                continue;
            }
            let name = name.trim();
            if columns.iter().any(|column| column.name == name) {
                return Err(LoadError::DuplicateColumn(name.to_string()));
            }
            columns.push(ResolvedColumn {
                name: name.to_string(),
                kind: ColumnKind::Inferred,
                non_negative: false,
                source,
            });
        }
        Ok(ResolvedSchema {
            columns,
        })
    }
}

impl Default for SchemaAliases {
    fn default() -> Self {
        Self::standard()
    }
}

/// Finds the header position of a column name, ignoring surrounding spaces.
fn position(header: &[String], name: &str) -> Option<usize> {
    header.iter().position(|column| column.trim() == name)
}

// ============================================================================
// SECTION: Resolved Schema
// ============================================================================

/// One output column mapped back to its source header position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumn {
    /// Output column name.
    pub name: String,
    /// Storage kind.
    pub kind: ColumnKind,
    /// Whether numeric cells must be non-negative.
    pub non_negative: bool,
    /// Index of the source header column.
    pub source: usize,
}

/// Header resolved against an alias table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSchema {
    /// Output columns in dataset order.
    pub columns: Vec<ResolvedColumn>,
}

impl ResolvedSchema {
    /// Returns the output column names.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.columns.iter().map(|column| column.name.clone()).collect()
    }
}
