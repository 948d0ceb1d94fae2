// crates/benchfit-core/src/runtime/mod.rs
// ============================================================================
// Module: Benchfit Runtime
// Description: Aggregation, reshaping, curve fitting and series export.
// Purpose: Run the analysis stages over an immutable dataset.
// Dependencies: crate::{core, interfaces}, csv, rayon
// ============================================================================

//! ## Overview
//! Runtime modules consume a normalized [`crate::core::Dataset`] and never
//! mutate it. The group aggregator ([`aggregate`], [`reshape`]) and the
//! scaling-law fitter ([`models`], [`solver`], [`fitter`]) are independent of
//! each other; [`series`] combines their outputs for presentation.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod aggregate;
pub mod fitter;
pub mod models;
pub mod reshape;
pub mod series;
pub mod solver;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use aggregate::AggregateError;
pub use aggregate::BaselineSelector;
pub use aggregate::RatioRow;
pub use aggregate::Reducer;
pub use aggregate::RelativeTable;
pub use aggregate::SummaryRow;
pub use aggregate::SummaryTable;
pub use aggregate::ratio_table;
pub use aggregate::summarize;
pub use fitter::FailureFilter;
pub use fitter::FitError;
pub use fitter::FitOptions;
pub use fitter::FitReport;
pub use fitter::FitSpec;
pub use fitter::FittedCurve;
pub use fitter::InitStrategy;
pub use fitter::Sampling;
pub use fitter::SamplingScale;
pub use fitter::Window;
pub use fitter::fit_batch;
pub use fitter::fit_group;
pub use fitter::fit_groups;
pub use fitter::fit_points;
pub use models::DomainError;
pub use models::ModelFamily;
pub use reshape::Pivot;
pub use reshape::melt;
pub use reshape::pivot;
pub use series::AxisRange;
pub use series::Palette;
pub use series::Panel;
pub use series::PanelSpec;
pub use series::PointSeries;
pub use series::SeriesKind;
pub use series::build_panels;
pub use series::emit_panels;
pub use solver::LeastSquaresProblem;
pub use solver::ParameterBound;
pub use solver::Solution;
pub use solver::SolveError;
pub use solver::SolverOptions;
pub use solver::Termination;
