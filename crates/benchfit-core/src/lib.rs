// crates/benchfit-core/src/lib.rs
// ============================================================================
// Module: Benchfit Core Library
// Description: Public API surface for the benchmark analysis engine.
// Purpose: Expose the record store, group aggregator and scaling-law fitter.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Benchfit core ingests benchmark measurement logs, computes
//! baseline-relative performance summaries between solver configurations,
//! and fits scaling-law curves of a metric against problem size per group.
//! It reads logs and emits presentation series through explicit interfaces
//! and never renders charts or runs benchmarks itself.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::CsvSource;
pub use interfaces::InMemorySource;
pub use interfaces::RawTable;
pub use interfaces::RecordSource;
pub use interfaces::SeriesSink;
pub use interfaces::SinkError;
pub use interfaces::SourceError;
pub use runtime::AggregateError;
pub use runtime::BaselineSelector;
pub use runtime::DomainError;
pub use runtime::FitError;
pub use runtime::FitOptions;
pub use runtime::FitReport;
pub use runtime::FitSpec;
pub use runtime::FittedCurve;
pub use runtime::InitStrategy;
pub use runtime::ModelFamily;
pub use runtime::Palette;
pub use runtime::Panel;
pub use runtime::PanelSpec;
pub use runtime::PointSeries;
pub use runtime::Reducer;
pub use runtime::RelativeTable;
pub use runtime::Sampling;
pub use runtime::SamplingScale;
pub use runtime::SolverOptions;
pub use runtime::SummaryTable;
pub use runtime::Window;
pub use runtime::build_panels;
pub use runtime::fit_batch;
pub use runtime::fit_groups;
pub use runtime::ratio_table;
pub use runtime::summarize;
