// crates/benchfit-core/src/core/mod.rs
// ============================================================================
// Module: Benchfit Record Store
// Description: Values, schema normalization and the immutable measurement dataset.
// Purpose: Provide the typed data model every aggregation and fit reads from.
// Dependencies: csv, serde, thiserror, tracing
// ============================================================================

//! ## Overview
//! The record store turns heterogeneous benchmark logs into one normalized
//! [`Dataset`]. It owns the cell model ([`Value`]), the historical alias
//! table ([`SchemaAliases`]), row predicates, derived columns and the
//! warnings that isolated failures produce downstream.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod dataset;
pub mod derive;
pub mod identifiers;
pub mod predicate;
pub mod record;
pub mod schema;
pub mod value;
pub mod warnings;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use dataset::Dataset;
pub use dataset::DatasetError;
pub use dataset::LoadError;
pub use dataset::RowRef;
pub use derive::DerivationError;
pub use derive::DeriveExpr;
pub use identifiers::CurveKey;
pub use identifiers::GroupKey;
pub use predicate::FilterSet;
pub use predicate::Predicate;
pub use record::MeasurementRecord;
pub use record::RecordError;
pub use schema::FieldAlias;
pub use schema::ResolvedColumn;
pub use schema::ResolvedSchema;
pub use schema::SchemaAliases;
pub use schema::fields;
pub use value::ColumnKind;
pub use value::Value;
pub use warnings::Warning;
