// crates/benchfit-core/src/runtime/solver.rs
// ============================================================================
// Module: Benchfit Least-Squares Solver
// Description: Bound-constrained Levenberg-Marquardt minimization.
// Purpose: Fit small nonlinear models to a handful of points deterministically.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! [`solve`] minimizes `0.5 * |r(p)|^2` for a [`LeastSquaresProblem`] with
//! box bounds on every parameter. Each iteration solves the damped normal
//! equations `(J^T J + lambda * D) dp = -J^T r` with Marquardt diagonal
//! scaling `D`, projects the trial point back into the box, and adapts
//! `lambda` on acceptance or rejection.
//!
//! The problems fitted here have two or three parameters, so dense
//! row-major storage and a Cholesky factorization are sufficient.
//!
//! The gradient test is scale-free (MINPACK's `gtol`), so the magnitude of
//! the data does not decide when a solve stops.
//!
//! Every residual evaluation counts against
//! [`SolverOptions::max_evaluations`]; exceeding it is an error, never a
//! silently truncated result.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Initial damping factor.
const INITIAL_LAMBDA: f64 = 1e-3;

/// Damping above which the solver reports a stall.
const MAX_LAMBDA: f64 = 1e16;

/// Damping floor after repeated acceptance.
const MIN_LAMBDA: f64 = 1e-15;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Closed interval constraint on one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterBound {
    /// Lower bound, possibly negative infinity.
    pub lower: f64,
    /// Upper bound, possibly positive infinity.
    pub upper: f64,
}

impl ParameterBound {
    /// Creates a bound.
    #[must_use]
    pub const fn new(lower: f64, upper: f64) -> Self {
        Self {
            lower,
            upper,
        }
    }

    /// Returns true when the value lies inside the bound.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }

    /// Clamps a value into the bound.
    #[must_use]
    pub fn project(&self, value: f64) -> f64 {
        value.max(self.lower).min(self.upper)
    }

    /// Returns true when the value sits on a bound the slope pushes against.
    fn blocks(&self, value: f64, slope: f64) -> bool {
        (value <= self.lower && slope > 0.0) || (value >= self.upper && slope < 0.0)
    }
}

/// Solver budget and stopping tolerances.
///
/// # Invariants
/// - All tolerances are positive; `max_evaluations` is at least one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    /// Maximum residual evaluations per solve.
    pub max_evaluations: usize,
    /// Relative cost reduction below which the solve stops.
    pub ftol: f64,
    /// Relative step size below which the solve stops.
    pub xtol: f64,
    /// Scaled gradient below which the solve stops: the largest cosine
    /// between the residual vector and a free Jacobian column.
    pub gtol: f64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_evaluations: 2000,
            ftol: 1e-12,
            xtol: 1e-12,
            gtol: 1e-12,
        }
    }
}

/// Reason a solve stopped successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Residuals vanished.
    ZeroResidual,
    /// Scaled projected gradient fell below `gtol`.
    Gradient,
    /// Cost reduction fell below `ftol`.
    CostTolerance,
    /// Step size fell below `xtol`.
    StepTolerance,
    /// No damping produced a decrease; the point is a local minimum to
    /// machine precision.
    Stalled,
}

/// Converged solve result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    /// Fitted parameters.
    pub parameters: Vec<f64>,
    /// Final cost, half the residual sum of squares.
    pub cost: f64,
    /// Residual evaluations used.
    pub evaluations: usize,
    /// Accepted iterations.
    pub iterations: usize,
    /// Stopping reason.
    pub termination: Termination,
}

/// Solve failures.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolveError {
    /// The evaluation budget ran out before convergence.
    #[error("evaluation budget of {0} exhausted")]
    BudgetExhausted(usize),
    /// The damped normal equations could not be factorized.
    #[error("jacobian is singular")]
    SingularJacobian,
    /// Residuals or parameters became non-finite.
    #[error("non-finite residuals or parameters")]
    NonFinite,
    /// The starting point has the wrong length or is non-finite.
    #[error("invalid starting point: {0}")]
    InvalidStart(String),
}

/// Nonlinear least-squares problem with box constraints.
pub trait LeastSquaresProblem {
    /// Returns the per-parameter bounds; its length is the parameter count.
    fn bounds(&self) -> &[ParameterBound];

    /// Evaluates the residual vector at `parameters`.
    fn residuals(&self, parameters: &[f64]) -> Vec<f64>;

    /// Evaluates the row-major Jacobian of the residuals at `parameters`.
    fn jacobian(&self, parameters: &[f64]) -> Vec<f64>;
}

// ============================================================================
// SECTION: Solver
// ============================================================================

/// Minimizes the problem's cost starting from `start`.
///
/// # Errors
///
/// Returns [`SolveError`] when the start is invalid, the budget is exhausted,
/// the normal equations are singular at every damping level, or the
/// evaluation turns non-finite.
pub fn solve<P: LeastSquaresProblem + ?Sized>(
    problem: &P,
    start: &[f64],
    options: &SolverOptions,
) -> Result<Solution, SolveError> {
    let bounds = problem.bounds();
    let n = bounds.len();
    if start.len() != n {
        return Err(SolveError::InvalidStart(format!(
            "expected {n} parameters, got {}",
            start.len()
        )));
    }
    if start.iter().any(|value| !value.is_finite()) {
        return Err(SolveError::InvalidStart("non-finite parameter".to_string()));
    }

    let mut params = project(bounds, start);
    let mut residuals = problem.residuals(&params);
    let mut cost = half_norm_squared(&residuals);
    let mut evaluations = 1;
    let mut iterations = 0;
    if !cost.is_finite() {
        return Err(SolveError::NonFinite);
    }

    let mut lambda = INITIAL_LAMBDA;
    let mut scale = vec![0.0; n];
    loop {
        if cost == 0.0 {
            return finish(params, cost, evaluations, iterations, Termination::ZeroResidual);
        }
        let jacobian = problem.jacobian(&params);
        if jacobian.iter().any(|value| !value.is_finite()) {
            return Err(SolveError::NonFinite);
        }
        let (normal, gradient) = normal_equations(&jacobian, &residuals, n);
        for (index, entry) in scale.iter_mut().enumerate() {
            *entry = f64::max(*entry, normal[index * n + index]);
        }
        let blocked = bounds
            .iter()
            .zip(&params)
            .zip(&gradient)
            .map(|((bound, value), slope)| bound.blocks(*value, *slope))
            .collect::<Vec<_>>();
        let residual_norm = (2.0 * cost).sqrt();
        let gradient_norm = gradient
            .iter()
            .zip(&blocked)
            .enumerate()
            .filter(|(_, (_, blocked))| !**blocked)
            .map(|(index, (slope, _))| {
                let column_norm = normal[index * n + index].sqrt();
                if column_norm > 0.0 { slope.abs() / (column_norm * residual_norm) } else { 0.0 }
            })
            .fold(0.0, f64::max);
        if gradient_norm <= options.gtol {
            return finish(params, cost, evaluations, iterations, Termination::Gradient);
        }

        loop {
            if evaluations >= options.max_evaluations {
                return Err(SolveError::BudgetExhausted(options.max_evaluations));
            }
            let Some(step) = damped_step(&normal, &gradient, &scale, &blocked, lambda) else {
                lambda *= 10.0;
                if lambda > MAX_LAMBDA {
                    return Err(SolveError::SingularJacobian);
                }
                continue;
            };
            let trial = project(
                bounds,
                &params.iter().zip(&step).map(|(value, delta)| value + delta).collect::<Vec<_>>(),
            );
            let trial_residuals = problem.residuals(&trial);
            evaluations += 1;
            let trial_cost = half_norm_squared(&trial_residuals);
            if trial_cost.is_finite() && trial_cost < cost {
                let reduction = cost - trial_cost;
                let step_norm = distance(&trial, &params);
                let param_norm = norm(&params);
                params = trial;
                residuals = trial_residuals;
                let previous = cost;
                cost = trial_cost;
                iterations += 1;
                lambda = f64::max(lambda / 10.0, MIN_LAMBDA);
                if reduction <= options.ftol * previous {
                    return finish(
                        params,
                        cost,
                        evaluations,
                        iterations,
                        Termination::CostTolerance,
                    );
                }
                if step_norm <= options.xtol * (options.xtol + param_norm) {
                    return finish(
                        params,
                        cost,
                        evaluations,
                        iterations,
                        Termination::StepTolerance,
                    );
                }
                break;
            }
            lambda *= 10.0;
            if lambda > MAX_LAMBDA {
                return finish(params, cost, evaluations, iterations, Termination::Stalled);
            }
        }
    }
}

/// Validates the final parameters and builds the solution.
fn finish(
    parameters: Vec<f64>,
    cost: f64,
    evaluations: usize,
    iterations: usize,
    termination: Termination,
) -> Result<Solution, SolveError> {
    if parameters.iter().any(|value| !value.is_finite()) {
        return Err(SolveError::NonFinite);
    }
    Ok(Solution {
        parameters,
        cost,
        evaluations,
        iterations,
        termination,
    })
}

// ============================================================================
// SECTION: Linear Algebra
// ============================================================================

/// Solves a symmetric positive-definite system by Cholesky factorization.
///
/// `matrix` is row-major `n x n` with `n = rhs.len()`. Returns `None` when a
/// pivot is not safely positive.
pub(crate) fn cholesky_solve(matrix: &[f64], rhs: &[f64]) -> Option<Vec<f64>> {
    let n = rhs.len();
    if matrix.len() != n * n {
        return None;
    }
    let max_diagonal = (0 .. n).map(|i| matrix[i * n + i].abs()).fold(0.0, f64::max);
    let threshold = max_diagonal * 1e-14;
    let mut lower = vec![0.0; n * n];
    for i in 0 .. n {
        for j in 0 ..= i {
            let dot = (0 .. j).map(|k| lower[i * n + k] * lower[j * n + k]).sum::<f64>();
            let value = matrix[i * n + j] - dot;
            if i == j {
                if value.is_nan() || value <= threshold || value.is_infinite() {
                    return None;
                }
                lower[i * n + i] = value.sqrt();
            } else {
                lower[i * n + j] = value / lower[j * n + j];
            }
        }
    }
    let mut forward = vec![0.0; n];
    for i in 0 .. n {
        let dot = (0 .. i).map(|k| lower[i * n + k] * forward[k]).sum::<f64>();
        forward[i] = (rhs[i] - dot) / lower[i * n + i];
    }
    let mut solution = vec![0.0; n];
    for i in (0 .. n).rev() {
        let dot = (i + 1 .. n).map(|k| lower[k * n + i] * solution[k]).sum::<f64>();
        solution[i] = (forward[i] - dot) / lower[i * n + i];
    }
    solution.iter().all(|value| value.is_finite()).then_some(solution)
}

/// Builds `J^T J` (row-major) and `J^T r`.
fn normal_equations(jacobian: &[f64], residuals: &[f64], n: usize) -> (Vec<f64>, Vec<f64>) {
    let mut normal = vec![0.0; n * n];
    let mut gradient = vec![0.0; n];
    for (row, residual) in jacobian.chunks_exact(n).zip(residuals) {
        for i in 0 .. n {
            gradient[i] += row[i] * residual;
            for j in 0 .. n {
                normal[i * n + j] += row[i] * row[j];
            }
        }
    }
    (normal, gradient)
}

/// Solves the Marquardt-damped normal equations for a step.
///
/// Parameters held by an active bound are frozen: their rows and columns are
/// replaced by the identity and their step is zero.
fn damped_step(
    normal: &[f64],
    gradient: &[f64],
    scale: &[f64],
    blocked: &[bool],
    lambda: f64,
) -> Option<Vec<f64>> {
    let n = gradient.len();
    let mut damped = normal.to_vec();
    let mut rhs = gradient.iter().map(|value| -value).collect::<Vec<_>>();
    for i in 0 .. n {
        if blocked[i] {
            for j in 0 .. n {
                damped[i * n + j] = 0.0;
                damped[j * n + i] = 0.0;
            }
            damped[i * n + i] = 1.0;
            rhs[i] = 0.0;
        } else {
            let weight = if scale[i] > 0.0 { scale[i] } else { 1.0 };
            damped[i * n + i] += lambda * weight;
        }
    }
    cholesky_solve(&damped, &rhs)
}

/// Clamps every parameter into its bound.
fn project(bounds: &[ParameterBound], params: &[f64]) -> Vec<f64> {
    bounds.iter().zip(params).map(|(bound, value)| bound.project(*value)).collect()
}

/// Half the squared Euclidean norm.
fn half_norm_squared(values: &[f64]) -> f64 {
    0.5 * values.iter().map(|value| value * value).sum::<f64>()
}

/// Euclidean norm.
fn norm(values: &[f64]) -> f64 {
    values.iter().map(|value| value * value).sum::<f64>().sqrt()
}

/// Euclidean distance between two points.
fn distance(left: &[f64], right: &[f64]) -> f64 {
    left.iter().zip(right).map(|(a, b)| (a - b) * (a - b)).sum::<f64>().sqrt()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        reason = "Test-only assertions are permitted."
    )]

    use super::*;

    /// Straight line `y = m x + q` through fixed points.
    struct Line {
        /// Sample points.
        points: Vec<(f64, f64)>,
        /// Parameter bounds.
        bounds: Vec<ParameterBound>,
    }

    impl LeastSquaresProblem for Line {
        fn bounds(&self) -> &[ParameterBound] {
            &self.bounds
        }

        fn residuals(&self, p: &[f64]) -> Vec<f64> {
            self.points.iter().map(|(x, y)| p[0] * x + p[1] - y).collect()
        }

        fn jacobian(&self, _p: &[f64]) -> Vec<f64> {
            self.points.iter().flat_map(|(x, _)| [*x, 1.0]).collect()
        }
    }

    fn line(points: &[(f64, f64)], bounds: [ParameterBound; 2]) -> Line {
        Line {
            points: points.to_vec(),
            bounds: bounds.to_vec(),
        }
    }

    const FREE: ParameterBound = ParameterBound::new(f64::NEG_INFINITY, f64::INFINITY);

    #[test]
    fn cholesky_solves_spd_system() {
        let solution = cholesky_solve(&[4.0, 2.0, 2.0, 3.0], &[2.0, 1.0]).unwrap();
        assert!((solution[0] - 0.5).abs() < 1e-12);
        assert!(solution[1].abs() < 1e-12);
    }

    #[test]
    fn cholesky_rejects_singular_system() {
        assert!(cholesky_solve(&[1.0, 1.0, 1.0, 1.0], &[1.0, 1.0]).is_none());
    }

    #[test]
    fn fits_line_exactly() {
        let problem = line(&[(0.0, 1.0), (1.0, 3.0), (2.0, 5.0)], [FREE, FREE]);
        let solution = solve(&problem, &[0.0, 0.0], &SolverOptions::default()).unwrap();
        assert!((solution.parameters[0] - 2.0).abs() < 1e-8);
        assert!((solution.parameters[1] - 1.0).abs() < 1e-8);
        assert!(solution.cost < 1e-16);
    }

    #[test]
    fn tiny_residuals_do_not_stop_the_solve_early() {
        let problem = line(&[(0.0, 1e-9), (1.0, 3e-9), (2.0, 5e-9)], [FREE, FREE]);
        let solution = solve(&problem, &[0.0, 0.0], &SolverOptions::default()).unwrap();
        assert!((solution.parameters[0] - 2e-9).abs() < 1e-15);
        assert!((solution.parameters[1] - 1e-9).abs() < 1e-15);
    }

    #[test]
    fn respects_bounds() {
        let capped = ParameterBound::new(0.0, 1.5);
        let problem = line(&[(0.0, 1.0), (1.0, 3.0), (2.0, 5.0)], [capped, FREE]);
        let solution = solve(&problem, &[1.0, 0.0], &SolverOptions::default()).unwrap();
        assert!(solution.parameters[0] <= 1.5);
        assert!((solution.parameters[0] - 1.5).abs() < 1e-6);
    }

    #[test]
    fn rejects_wrong_start_length() {
        let problem = line(&[(0.0, 1.0), (1.0, 3.0)], [FREE, FREE]);
        let err = solve(&problem, &[0.0], &SolverOptions::default()).unwrap_err();
        assert!(matches!(err, SolveError::InvalidStart(_)));
    }

    #[test]
    fn reports_budget_exhaustion() {
        let problem = line(&[(0.0, 1.0), (1.0, 3.0), (2.0, 5.0)], [FREE, FREE]);
        let options = SolverOptions {
            max_evaluations: 1,
            ..SolverOptions::default()
        };
        let err = solve(&problem, &[0.0, 0.0], &options).unwrap_err();
        assert_eq!(err, SolveError::BudgetExhausted(1));
    }
}
