// crates/benchfit-cli/src/pipeline.rs
// ============================================================================
// Module: Analysis Pipelines
// Description: Config-driven ratio, summary, fit and series pipelines.
// Purpose: Turn a loaded log into the CSV tables each subcommand prints.
// Dependencies: benchfit-config, benchfit-core, csv, thiserror, tracing
// ============================================================================

//! ## Overview
//! Every pipeline starts from [`prepare`], which applies the configured
//! derivations and then the configured filters, and ends with CSV bytes. The
//! entry point decides where those bytes go.

// ============================================================================
// SECTION: Imports
// ============================================================================

use benchfit_config::BenchfitConfig;
use benchfit_config::FitConfig;
use benchfit_config::RatiosConfig;
use benchfit_config::StatsConfig;
use benchfit_core::AggregateError;
use benchfit_core::Dataset;
use benchfit_core::DatasetError;
use benchfit_core::FitError;
use benchfit_core::FitReport;
use benchfit_core::SinkError;
use benchfit_core::Value;
use benchfit_core::build_panels;
use benchfit_core::fields;
use benchfit_core::fit_batch;
use benchfit_core::ratio_table;
use benchfit_core::runtime::emit_panels;
use benchfit_core::summarize;
use thiserror::Error;
use tracing::debug;
use tracing::info;

use crate::sink::CsvSeriesSink;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Parameter columns of the fit table, covering every model family.
const PARAMETER_COLUMNS: [&str; 3] = ["c", "a", "b"];

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Pipeline failures.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Ratio or summary computation failed.
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
    /// The fit batch referenced an absent column.
    #[error(transparent)]
    Fit(#[from] FitError),
    /// Panel layout referenced an absent column.
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    /// The series sink failed.
    #[error(transparent)]
    Sink(#[from] SinkError),
    /// No run had a usable baseline record.
    #[error("no ratios: no run has a unique `{0}` baseline record")]
    NoRatios(String),
    /// Writing a table failed.
    #[error("table output error: {0}")]
    Output(String),
}

impl From<csv::Error> for PipelineError {
    fn from(err: csv::Error) -> Self {
        Self::Output(err.to_string())
    }
}

// ============================================================================
// SECTION: Preparation
// ============================================================================

/// Applies configured derivations, then configured filters.
///
/// Derivations that cannot be computed are skipped with a warning so filters
/// and pipelines that do not need them still run.
#[must_use]
pub fn prepare(dataset: &Dataset, config: &BenchfitConfig) -> Dataset {
    let (derived, warnings) = dataset.derive_lenient(&config.derive);
    let prepared = derived.filter(&config.filter_set());
    debug!(
        rows = prepared.len(),
        skipped_derivations = warnings.len(),
        "prepared dataset"
    );
    prepared
}

/// Borrows owned names as string slices.
fn names(values: &[String]) -> Vec<&str> {
    values.iter().map(String::as_str).collect()
}

// ============================================================================
// SECTION: Ratios And Summaries
// ============================================================================

/// Summarizes per-solver ratios against the baseline.
///
/// Ratios are grouped by the configured keys plus solver; the baseline's
/// own groups are left out of the summary.
///
/// # Errors
///
/// Returns [`PipelineError::NoRatios`] when no run has a unique baseline and
/// [`PipelineError::Aggregate`] for absent or non-numeric columns.
pub fn ratios_csv(dataset: &Dataset, config: &RatiosConfig) -> Result<Vec<u8>, PipelineError> {
    let metrics = names(&config.metrics);
    let group_keys = names(&config.group_keys);
    let table = ratio_table(dataset, &metrics, &config.baseline, &group_keys)?;
    if table.is_empty() {
        return Err(PipelineError::NoRatios(config.baseline.solver.clone()));
    }
    let wide = table.to_wide()?;
    let mut keys = group_keys;
    keys.push(fields::SOLVER);
    let summary = summarize(&wide, &keys, &metrics, &config.reducers, config.round_digits)?
        .exclude(fields::SOLVER, &Value::text(config.baseline.solver.as_str()))?;
    info!(ratios = table.len(), groups = summary.len(), "summarized ratios");
    let mut out = Vec::new();
    summary.write_delimited(&mut out)?;
    Ok(out)
}

/// Summarizes raw metrics per group.
///
/// # Errors
///
/// Returns [`PipelineError::Aggregate`] for absent or non-numeric columns.
pub fn stats_csv(dataset: &Dataset, config: &StatsConfig) -> Result<Vec<u8>, PipelineError> {
    let summary = summarize(
        dataset,
        &names(&config.group_keys),
        &names(&config.metrics),
        &config.reducers,
        config.round_digits,
    )?;
    let mut out = Vec::new();
    summary.write_delimited(&mut out)?;
    Ok(out)
}

// ============================================================================
// SECTION: Fitting
// ============================================================================

/// Fits every configured metric per group.
///
/// # Errors
///
/// Returns [`PipelineError::Fit`] when a spec references an absent column.
pub fn fit_report(dataset: &Dataset, config: &FitConfig) -> Result<FitReport, PipelineError> {
    let report = fit_batch(dataset, &config.specs(), &config.options())?;
    info!(
        curves = report.curves.len(),
        unavailable = report.failures.len(),
        warnings = report.warnings.len(),
        "fit batch finished"
    );
    Ok(report)
}

/// Renders fitted curves as CSV: metric, group keys, model, fit extent,
/// cost and parameters. Unavailable groups are not listed.
///
/// # Errors
///
/// Returns [`PipelineError::Output`] when writing fails.
pub fn curves_csv(report: &FitReport, config: &FitConfig) -> Result<Vec<u8>, PipelineError> {
    let mut out = csv::Writer::from_writer(Vec::new());
    let mut header = vec!["metric".to_string()];
    header.extend(config.group_keys.iter().cloned());
    header.extend(["model", "points", "x_min", "x_max", "cost"].map(ToString::to_string));
    header.extend(PARAMETER_COLUMNS.map(ToString::to_string));
    out.write_record(&header)?;

    for (key, curve) in &report.curves {
        let model = curve.model();
        let (x_min, x_max) = curve.x_range();
        let mut record = vec![key.metric.clone()];
        record.extend(key.group.values().iter().map(ToString::to_string));
        record.push(model.as_str().to_string());
        record.push(curve.points().to_string());
        record.push(x_min.to_string());
        record.push(x_max.to_string());
        record.push(curve.cost().to_string());
        for column in PARAMETER_COLUMNS {
            let value = model
                .parameter_names()
                .iter()
                .position(|name| *name == column)
                .and_then(|at| curve.parameters().get(at))
                .map(ToString::to_string)
                .unwrap_or_default();
            record.push(value);
        }
        out.write_record(&record)?;
    }
    out.into_inner().map_err(|err| PipelineError::Output(err.error().to_string()))
}

// ============================================================================
// SECTION: Series
// ============================================================================

/// Fits every configured metric and exports one panel set per metric.
///
/// # Errors
///
/// Returns [`PipelineError`] when a referenced column is absent or the sink
/// fails.
pub fn series_csv(dataset: &Dataset, config: &BenchfitConfig) -> Result<Vec<u8>, PipelineError> {
    let report = fit_report(dataset, &config.fit)?;
    let mut sink = CsvSeriesSink::new(Vec::new())?;
    let mut seen = Vec::new();
    for entry in &config.fit.metrics {
        if seen.contains(&entry.metric.as_str()) {
            continue;
        }
        seen.push(entry.metric.as_str());
        let spec = config.series.panel_spec(&config.fit, &entry.metric);
        let panels = build_panels(dataset, &spec, &report.curves)?;
        debug!(metric = %entry.metric, panels = panels.len(), "built panels");
        emit_panels(&panels, &mut sink)?;
    }
    Ok(sink.finish()?)
}
