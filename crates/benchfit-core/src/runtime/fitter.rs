// crates/benchfit-core/src/runtime/fitter.rs
// ============================================================================
// Module: Benchfit Scaling-Law Fitter
// Description: Per-group regression of a metric against problem size.
// Purpose: Turn filtered measurements into fitted curves with isolated failures.
// Dependencies: crate::{core, runtime::{models, solver}}, rayon, serde, thiserror, tracing
// ============================================================================

//! ## Overview
//! A [`FitSpec`] names the independent axis, the metric, the model family and
//! the grouping columns. [`fit_groups`] partitions the dataset by the group
//! keys and fits every group independently:
//!
//! 1. keep rows whose axis value lies in the regression window `[min, max)`
//! 2. drop non-convergent rows (failure column at or above the threshold)
//! 3. drop rows missing `x` or `y`; drop rows outside the model domain with a
//!    warning
//! 4. collapse rows sharing an `x` to the median `y`, sorted by `x`
//! 5. solve the bounded least-squares problem, searching `ln c` for the scale
//!
//! A failing group yields a [`FitError`] for that group only; every other
//! group still gets its curve. Results are keyed by [`CurveKey`] in
//! `BTreeMap`s, so parallel fitting never changes output order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use rayon::prelude::*;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;
use tracing::info;

use crate::core::CurveKey;
use crate::core::Dataset;
use crate::core::GroupKey;
use crate::core::Warning;
use crate::core::fields;
use crate::runtime::aggregate::median;
use crate::runtime::models::ModelFamily;
use crate::runtime::solver::LeastSquaresProblem;
use crate::runtime::solver::ParameterBound;
use crate::runtime::solver::SolveError;
use crate::runtime::solver::SolverOptions;
use crate::runtime::solver::Termination;
use crate::runtime::solver::solve;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default independent axis.
pub const DEFAULT_AXIS: &str = fields::ARCS;

/// Default lower edge of the regression window.
pub const DEFAULT_WINDOW_MIN: f64 = 1e3;

/// Default upper edge of the regression window.
pub const DEFAULT_WINDOW_MAX: f64 = 5e50;

/// Default iteration count at which a run counts as non-convergent.
pub const DEFAULT_FAILURE_THRESHOLD: f64 = 200.0;

/// Minimum number of distinct `x` values needed for a fit.
pub const MIN_DISTINCT_POINTS: usize = 2;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Group-level fit failures.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Only `UnknownColumn` aborts a whole batch; the rest affect one group.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FitError {
    /// Too few distinct `x` values survived filtering.
    #[error("insufficient data: {distinct} distinct x value(s), need {MIN_DISTINCT_POINTS}")]
    InsufficientData {
        /// Distinct `x` values available.
        distinct: usize,
    },
    /// The solver ran out of evaluations.
    #[error("solver budget of {evaluations} evaluations exhausted")]
    BudgetExhausted {
        /// Evaluation budget.
        evaluations: usize,
    },
    /// The normal equations were singular.
    #[error("singular jacobian")]
    SingularJacobian,
    /// The solve produced non-finite values.
    #[error("non-finite parameters")]
    NonFinite,
    /// A referenced column does not exist.
    #[error("unknown column `{0}`")]
    UnknownColumn(String),
    /// A batch fits the same metric more than once.
    #[error("metric `{0}` is fitted more than once in one batch")]
    DuplicateMetric(String),
}

impl From<SolveError> for FitError {
    fn from(err: SolveError) -> Self {
        match err {
            SolveError::BudgetExhausted(evaluations) => Self::BudgetExhausted {
                evaluations,
            },
            SolveError::SingularJacobian => Self::SingularJacobian,
            SolveError::NonFinite | SolveError::InvalidStart(_) => Self::NonFinite,
        }
    }
}

// ============================================================================
// SECTION: Specification
// ============================================================================

/// How the starting point of a solve is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitStrategy {
    /// Linear fit in log space, falling back to the fixed guess.
    #[default]
    LogLinear,
    /// Always the family's fixed guess.
    Fixed,
}

/// Half-open regression window `[min, max)` on the axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Window {
    /// Inclusive lower edge.
    pub min: f64,
    /// Exclusive upper edge.
    pub max: f64,
}

impl Window {
    /// Creates a window.
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
        }
    }

    /// Returns true when `x` lies in the window.
    #[must_use]
    pub fn contains(&self, x: f64) -> bool {
        x >= self.min && x < self.max
    }
}

impl Default for Window {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_MIN, DEFAULT_WINDOW_MAX)
    }
}

/// Non-convergence exclusion rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureFilter {
    /// Column compared against the threshold.
    pub column: String,
    /// Values at or above this mark a failed run.
    pub threshold: f64,
}

impl FailureFilter {
    /// Returns true when the value marks a non-convergent run.
    #[must_use]
    pub fn is_failure(&self, value: f64) -> bool {
        value >= self.threshold
    }
}

impl Default for FailureFilter {
    fn default() -> Self {
        Self {
            column: fields::ITERATIONS.to_string(),
            threshold: DEFAULT_FAILURE_THRESHOLD,
        }
    }
}

/// One regression request: a metric against an axis, per group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitSpec {
    /// Independent axis column.
    pub axis: String,
    /// Dependent metric column.
    pub metric: String,
    /// Model family.
    pub model: ModelFamily,
    /// Regression window on the axis.
    pub window: Window,
    /// Non-convergence exclusion, if any.
    pub failure: Option<FailureFilter>,
    /// Grouping columns.
    pub group_keys: Vec<String>,
    /// Starting-point strategy.
    pub init: InitStrategy,
    /// Solver budget and tolerances.
    pub solver: SolverOptions,
}

impl FitSpec {
    /// Creates a spec with the default window, failure rule and solver options.
    #[must_use]
    pub fn new(axis: &str, metric: &str, model: ModelFamily) -> Self {
        Self {
            axis: axis.to_string(),
            metric: metric.to_string(),
            model,
            window: Window::default(),
            failure: Some(FailureFilter::default()),
            group_keys: Vec::new(),
            init: InitStrategy::default(),
            solver: SolverOptions::default(),
        }
    }

    /// Sets the regression window.
    #[must_use]
    pub const fn with_window(mut self, window: Window) -> Self {
        self.window = window;
        self
    }

    /// Sets or clears the non-convergence rule.
    #[must_use]
    pub fn with_failure(mut self, failure: Option<FailureFilter>) -> Self {
        self.failure = failure;
        self
    }

    /// Sets the grouping columns.
    #[must_use]
    pub fn grouped_by(mut self, keys: &[&str]) -> Self {
        self.group_keys = keys.iter().map(ToString::to_string).collect();
        self
    }

    /// Sets the starting-point strategy.
    #[must_use]
    pub const fn with_init(mut self, init: InitStrategy) -> Self {
        self.init = init;
        self
    }

    /// Sets the solver options.
    #[must_use]
    pub const fn with_solver(mut self, solver: SolverOptions) -> Self {
        self.solver = solver;
        self
    }

    /// Returns every column this request reads.
    fn columns(&self) -> impl Iterator<Item = &str> {
        [self.axis.as_str(), self.metric.as_str()]
            .into_iter()
            .chain(self.failure.iter().map(|failure| failure.column.as_str()))
            .chain(self.group_keys.iter().map(String::as_str))
    }
}

/// Batch execution options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FitOptions {
    /// Fit groups on the rayon pool.
    pub parallel: bool,
}

// ============================================================================
// SECTION: Sampling
// ============================================================================

/// Spacing of sampled abscissae.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingScale {
    /// Evenly spaced values.
    #[default]
    Linear,
    /// Evenly spaced in log space.
    Geometric,
}

/// Abscissae at which a curve is sampled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scale", rename_all = "snake_case")]
pub enum Sampling {
    /// `count` evenly spaced values from `start` to `end` inclusive.
    Linear {
        /// First value.
        start: f64,
        /// Last value.
        end: f64,
        /// Number of values.
        count: usize,
    },
    /// `count` values from `start` to `end` inclusive, evenly spaced in log space.
    Geometric {
        /// First value, positive.
        start: f64,
        /// Last value, positive.
        end: f64,
        /// Number of values.
        count: usize,
    },
}

impl Sampling {
    /// Creates a sampling over a range with the given scale.
    #[must_use]
    pub const fn new(scale: SamplingScale, start: f64, end: f64, count: usize) -> Self {
        match scale {
            SamplingScale::Linear => Self::Linear {
                start,
                end,
                count,
            },
            SamplingScale::Geometric => Self::Geometric {
                start,
                end,
                count,
            },
        }
    }

    /// Returns the sampled abscissae; empty for an invalid geometric range.
    #[must_use]
    pub fn abscissae(&self) -> Vec<f64> {
        match *self {
            Self::Linear {
                start,
                end,
                count,
            } => spaced(start, end, count),
            Self::Geometric {
                start,
                end,
                count,
            } => {
                if !(start > 0.0 && end > 0.0) {
                    return Vec::new();
                }
                let mut values =
                    spaced(start.ln(), end.ln(), count).into_iter().map(f64::exp).collect::<Vec<_>>();
                if let Some(first) = values.first_mut() {
                    *first = start;
                }
                if count > 1
                    && let Some(last) = values.last_mut()
                {
                    *last = end;
                }
                values
            }
        }
    }
}

/// Evenly spaced values from `start` to `end` inclusive.
fn spaced(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let last = count - 1;
            (0 ..= last)
                .map(|step| {
                    if step == last {
                        end
                    } else {
                        start + (end - start) * fraction(step, last)
                    }
                })
                .collect()
        }
    }
}

/// Returns `step / total` as a float.
#[allow(clippy::cast_precision_loss, reason = "Sample counts are far below 2^53.")]
fn fraction(step: usize, total: usize) -> f64 {
    step as f64 / total as f64
}

// ============================================================================
// SECTION: Fitted Curves
// ============================================================================

/// Curve fitted to one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedCurve {
    /// Metric and group the curve belongs to.
    key: CurveKey,
    /// Model family.
    model: ModelFamily,
    /// Fitted parameters in family order.
    parameters: Vec<f64>,
    /// Number of distinct `x` values fitted.
    points: usize,
    /// Smallest and largest fitted `x`.
    x_range: (f64, f64),
    /// Final cost, half the residual sum of squares.
    cost: f64,
    /// Residual evaluations used.
    evaluations: usize,
    /// Solver stopping reason.
    termination: Termination,
}

impl FittedCurve {
    /// Returns the curve key.
    #[must_use]
    pub const fn key(&self) -> &CurveKey {
        &self.key
    }

    /// Returns the model family.
    #[must_use]
    pub const fn model(&self) -> ModelFamily {
        self.model
    }

    /// Returns the fitted parameters.
    #[must_use]
    pub fn parameters(&self) -> &[f64] {
        &self.parameters
    }

    /// Returns the number of distinct `x` values fitted.
    #[must_use]
    pub const fn points(&self) -> usize {
        self.points
    }

    /// Returns the smallest and largest fitted `x`.
    #[must_use]
    pub const fn x_range(&self) -> (f64, f64) {
        self.x_range
    }

    /// Returns the final cost.
    #[must_use]
    pub const fn cost(&self) -> f64 {
        self.cost
    }

    /// Returns the residual evaluations used.
    #[must_use]
    pub const fn evaluations(&self) -> usize {
        self.evaluations
    }

    /// Returns the solver stopping reason.
    #[must_use]
    pub const fn termination(&self) -> Termination {
        self.termination
    }

    /// Evaluates the curve; `None` outside the model domain.
    #[must_use]
    pub fn evaluate(&self, x: f64) -> Option<f64> {
        if !ModelFamily::in_domain(x) {
            return None;
        }
        let y = self.model.evaluate(&self.parameters, x);
        y.is_finite().then_some(y)
    }

    /// Samples the curve, skipping abscissae where it is undefined.
    #[must_use]
    pub fn sample(&self, sampling: &Sampling) -> Vec<(f64, f64)> {
        sampling.abscissae().into_iter().filter_map(|x| self.evaluate(x).map(|y| (x, y))).collect()
    }
}

// ============================================================================
// SECTION: Reports
// ============================================================================

/// Outcome of fitting many groups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FitReport {
    /// Successful curves.
    pub curves: BTreeMap<CurveKey, FittedCurve>,
    /// Groups whose fit was unavailable.
    pub failures: BTreeMap<CurveKey, FitError>,
    /// Row- and group-level warnings in group order.
    pub warnings: Vec<Warning>,
}

impl FitReport {
    /// Folds another report into this one.
    fn merge(&mut self, other: Self) {
        self.curves.extend(other.curves);
        self.failures.extend(other.failures);
        self.warnings.extend(other.warnings);
    }
}

// ============================================================================
// SECTION: Fitting
// ============================================================================

/// Least-squares problem of one model over prepared points.
///
/// The solver searches `[ln c, ..]` instead of `[c, ..]`: the scale stays
/// positive and a start many orders of magnitude off `y` still converges.
struct CurveProblem<'a> {
    /// Model family.
    model: ModelFamily,
    /// Prepared (x, y) points.
    points: &'a [(f64, f64)],
    /// Model bounds with the scale bound mapped to log space.
    bounds: Vec<ParameterBound>,
}

impl<'a> CurveProblem<'a> {
    /// Builds the problem for one model.
    fn new(model: ModelFamily, points: &'a [(f64, f64)]) -> Self {
        let mut bounds = model.bounds().to_vec();
        if let Some(scale) = bounds.first_mut() {
            *scale = ParameterBound::new(scale.lower.ln(), scale.upper.ln());
        }
        Self {
            model,
            points,
            bounds,
        }
    }

    /// Maps model parameters into solver space.
    fn to_search(parameters: &[f64]) -> Vec<f64> {
        let mut search = parameters.to_vec();
        if let Some(scale) = search.first_mut() {
            *scale = scale.max(f64::MIN_POSITIVE).ln();
        }
        search
    }

    /// Maps solver parameters back to model parameters.
    fn to_model(search: &[f64]) -> Vec<f64> {
        let mut parameters = search.to_vec();
        if let Some(scale) = parameters.first_mut() {
            *scale = scale.exp();
        }
        parameters
    }
}

impl LeastSquaresProblem for CurveProblem<'_> {
    fn bounds(&self) -> &[ParameterBound] {
        &self.bounds
    }

    fn residuals(&self, search: &[f64]) -> Vec<f64> {
        let parameters = Self::to_model(search);
        self.points.iter().map(|(x, y)| self.model.evaluate(&parameters, *x) - y).collect()
    }

    fn jacobian(&self, search: &[f64]) -> Vec<f64> {
        let parameters = Self::to_model(search);
        let scale = parameters.first().copied().unwrap_or(f64::NAN);
        self.points
            .iter()
            .flat_map(|(x, _)| {
                let mut row = self.model.gradient(&parameters, *x);
                // d/d(ln c) = c * d/dc
                if let Some(first) = row.first_mut() {
                    *first *= scale;
                }
                row
            })
            .collect()
    }
}

/// Fits one model to prepared points.
///
/// Points must lie in the model domain; duplicates in `x` are allowed.
///
/// # Errors
///
/// Returns [`FitError`] when fewer than two distinct `x` values are given or
/// the solver fails.
pub fn fit_points(
    key: CurveKey,
    model: ModelFamily,
    points: &[(f64, f64)],
    init: InitStrategy,
    options: &SolverOptions,
) -> Result<FittedCurve, FitError> {
    let points = collapse_median(points);
    if points.len() < MIN_DISTINCT_POINTS {
        return Err(FitError::InsufficientData {
            distinct: points.len(),
        });
    }
    let start = match init {
        InitStrategy::LogLinear => {
            model.log_linear_guess(&points).unwrap_or_else(|| model.initial_guess().to_vec())
        }
        InitStrategy::Fixed => model.initial_guess().to_vec(),
    };
    let problem = CurveProblem::new(model, &points);
    let solution = solve(&problem, &CurveProblem::to_search(&start), options)?;
    let parameters = CurveProblem::to_model(&solution.parameters);
    if parameters.iter().any(|value| !value.is_finite()) {
        return Err(FitError::NonFinite);
    }
    let x_range = (points[0].0, points[points.len() - 1].0);
    debug!(
        curve = %key,
        model = %model,
        points = points.len(),
        cost = solution.cost,
        evaluations = solution.evaluations,
        "fitted curve"
    );
    Ok(FittedCurve {
        key,
        model,
        parameters,
        points: points.len(),
        x_range,
        cost: solution.cost,
        evaluations: solution.evaluations,
        termination: solution.termination,
    })
}

/// Sorts points by `x` and collapses equal `x` values to their median `y`.
fn collapse_median(points: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let mut sorted = points.to_vec();
    sorted.sort_by(|left, right| left.0.total_cmp(&right.0));
    let mut out: Vec<(f64, f64)> = Vec::new();
    let mut start = 0;
    while start < sorted.len() {
        let x = sorted[start].0;
        let end = sorted[start ..]
            .iter()
            .position(|(other, _)| *other != x)
            .map_or(sorted.len(), |at| start + at);
        let ys = sorted[start .. end].iter().map(|(_, y)| *y).collect::<Vec<_>>();
        if let Some(y) = median(&ys) {
            out.push((x, y));
        }
        start = end;
    }
    out
}

/// Fits one group of rows, recording row-level warnings.
///
/// `dataset` holds the group's rows only; `group` is its key.
///
/// # Errors
///
/// Returns [`FitError`] when a referenced column is unknown, too little data
/// survives filtering, or the solver fails.
pub fn fit_group(
    dataset: &Dataset,
    spec: &FitSpec,
    group: &GroupKey,
    warnings: &mut Vec<Warning>,
) -> Result<FittedCurve, FitError> {
    let require = |column: &str| {
        dataset.column_index(column).ok_or_else(|| FitError::UnknownColumn(column.to_string()))
    };
    let axis_at = require(&spec.axis)?;
    let metric_at = require(&spec.metric)?;
    let failure_at = spec
        .failure
        .as_ref()
        .map(|failure| require(&failure.column).map(|at| (failure, at)))
        .transpose()?;

    let mut points = Vec::new();
    for values in dataset.row_slices() {
        let Some(x) = values[axis_at].as_f64() else {
            continue;
        };
        if !spec.window.contains(x) {
            continue;
        }
        if let Some((failure, at)) = failure_at
            && values[at].as_f64().is_some_and(|value| failure.is_failure(value))
        {
            continue;
        }
        let Some(y) = values[metric_at].as_f64().filter(|y| y.is_finite()) else {
            continue;
        };
        if let Err(err) = ModelFamily::check_domain(x) {
            debug!(error = %err, "dropping row outside the model domain");
            Warning::InvalidDomain {
                metric: spec.metric.clone(),
                group: group.clone(),
                x,
            }
            .record(warnings);
            continue;
        }
        points.push((x, y));
    }
    let key = CurveKey::new(&spec.metric, group.clone());
    fit_points(key, spec.model, &points, spec.init, &spec.solver)
}

/// Fits every group of the dataset for one spec.
///
/// # Errors
///
/// Returns [`FitError::UnknownColumn`] when the axis, metric, failure or
/// group column is absent. Group-level failures are reported in the
/// returned [`FitReport`] instead.
pub fn fit_groups(
    dataset: &Dataset,
    spec: &FitSpec,
    options: &FitOptions,
) -> Result<FitReport, FitError> {
    if let Some(missing) = spec.columns().find(|column| !dataset.has_column(column)) {
        return Err(FitError::UnknownColumn(missing.to_string()));
    }
    let keys = spec.group_keys.iter().map(String::as_str).collect::<Vec<_>>();
    let groups = dataset
        .partition(&keys)
        .map_err(|err| FitError::UnknownColumn(err.to_string()))?
        .into_iter()
        .collect::<Vec<_>>();

    let run = |(group, rows): &(GroupKey, Dataset)| {
        let mut warnings = Vec::new();
        let outcome = fit_group(rows, spec, group, &mut warnings);
        (group.clone(), outcome, warnings)
    };
    let outcomes = if options.parallel {
        groups.par_iter().map(run).collect::<Vec<_>>()
    } else {
        groups.iter().map(run).collect::<Vec<_>>()
    };

    let mut report = FitReport::default();
    for (group, outcome, warnings) in outcomes {
        report.warnings.extend(warnings);
        let key = CurveKey::new(&spec.metric, group.clone());
        match outcome {
            Ok(curve) => {
                report.curves.insert(key, curve);
            }
            Err(err) => {
                Warning::FitUnavailable {
                    metric: spec.metric.clone(),
                    group,
                    reason: err.to_string(),
                }
                .record(&mut report.warnings);
                report.failures.insert(key, err);
            }
        }
    }
    info!(
        metric = %spec.metric,
        model = %spec.model,
        curves = report.curves.len(),
        failures = report.failures.len(),
        "fitted groups"
    );
    Ok(report)
}

/// Fits several specs over the same dataset.
///
/// Curves are keyed by metric and group, so each metric may appear in one
/// spec only.
///
/// # Errors
///
/// Returns [`FitError::DuplicateMetric`] before fitting anything when two
/// specs share a metric, and [`FitError::UnknownColumn`] for the first spec
/// that references an absent column.
pub fn fit_batch(
    dataset: &Dataset,
    specs: &[FitSpec],
    options: &FitOptions,
) -> Result<FitReport, FitError> {
    let mut seen = BTreeSet::new();
    if let Some(repeated) = specs.iter().find(|spec| !seen.insert(spec.metric.as_str())) {
        return Err(FitError::DuplicateMetric(repeated.metric.clone()));
    }
    let mut report = FitReport::default();
    for spec in specs {
        report.merge(fit_groups(dataset, spec, options)?);
    }
    Ok(report)
}
