// crates/benchfit-core/src/runtime/models.rs
// ============================================================================
// Module: Benchfit Scaling-Law Models
// Description: Parametric growth curves in ln(x) and their derivatives.
// Purpose: Describe each model family once: formula, guess, bounds, Jacobian.
// Dependencies: crate::runtime::solver, serde, thiserror
// ============================================================================

//! ## Overview
//! Three families describe how a metric grows with problem size `x`, with
//! `L = ln(x)`:
//!
//! | Family | Formula | Parameters |
//! |---|---|---|
//! | [`ModelFamily::LogPower`] | `c * L^b` | `[c, b]` |
//! | [`ModelFamily::LinearLog`] | `c * x * L^b` | `[c, b]` |
//! | [`ModelFamily::PowerLog`] | `c * x^a * L^b` | `[c, a, b]` |
//!
//! `L^b` is real only for `L > 0`, so the domain of every family is `x > 1`.
//! All three are linear in log space (`ln y = ln c + a ln x + b ln L`), which
//! [`ModelFamily::log_linear_guess`] exploits to start the nonlinear solve
//! close to the optimum.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::runtime::solver::ParameterBound;
use crate::runtime::solver::cholesky_solve;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Bound on the scale parameter `c`.
const SCALE_BOUND: ParameterBound = ParameterBound::new(0.0, f64::INFINITY);

/// Bound on the `x` exponent `a`.
const POWER_BOUND: ParameterBound = ParameterBound::new(-4.0, 4.0);

/// Bound on the `ln(x)` exponent `b`.
const LOG_POWER_BOUND: ParameterBound = ParameterBound::new(-16.0, 16.0);

/// Bounds of two-parameter families, `[c, b]`.
const TWO_PARAMETER_BOUNDS: [ParameterBound; 2] = [SCALE_BOUND, LOG_POWER_BOUND];

/// Bounds of the three-parameter family, `[c, a, b]`.
const THREE_PARAMETER_BOUNDS: [ParameterBound; 3] = [SCALE_BOUND, POWER_BOUND, LOG_POWER_BOUND];

/// Fixed initial guess of two-parameter families.
const TWO_PARAMETER_GUESS: [f64; 2] = [1e-6, 3.0];

/// Fixed initial guess of the three-parameter family.
const THREE_PARAMETER_GUESS: [f64; 3] = [1e-6, 0.5, 0.0];

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Row-level domain violation.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum DomainError {
    /// `x` is not a finite value above one.
    #[error("x = {x} is outside the model domain x > 1")]
    InvalidDomain {
        /// Offending value.
        x: f64,
    },
}

// ============================================================================
// SECTION: Model Families
// ============================================================================

/// Scaling-law model family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFamily {
    /// `y = c * ln(x)^b`.
    LogPower,
    /// `y = c * x * ln(x)^b`.
    LinearLog,
    /// `y = c * x^a * ln(x)^b`.
    PowerLog,
}

impl ModelFamily {
    /// Every family, in declaration order.
    pub const ALL: [Self; 3] = [Self::LogPower, Self::LinearLog, Self::PowerLog];

    /// Returns the stable identifier used in configuration and output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LogPower => "log_power",
            Self::LinearLog => "linear_log",
            Self::PowerLog => "power_log",
        }
    }

    /// Returns the number of parameters.
    #[must_use]
    pub const fn parameter_count(self) -> usize {
        match self {
            Self::LogPower | Self::LinearLog => 2,
            Self::PowerLog => 3,
        }
    }

    /// Returns the parameter names in vector order.
    #[must_use]
    pub const fn parameter_names(self) -> &'static [&'static str] {
        match self {
            Self::LogPower | Self::LinearLog => &["c", "b"],
            Self::PowerLog => &["c", "a", "b"],
        }
    }

    /// Returns the formula in human-readable form.
    #[must_use]
    pub const fn formula(self) -> &'static str {
        match self {
            Self::LogPower => "c * ln(x)^b",
            Self::LinearLog => "c * x * ln(x)^b",
            Self::PowerLog => "c * x^a * ln(x)^b",
        }
    }

    /// Returns the fixed initial guess.
    #[must_use]
    pub const fn initial_guess(self) -> &'static [f64] {
        match self {
            Self::LogPower | Self::LinearLog => &TWO_PARAMETER_GUESS,
            Self::PowerLog => &THREE_PARAMETER_GUESS,
        }
    }

    /// Returns the parameter bounds.
    #[must_use]
    pub const fn bounds(self) -> &'static [ParameterBound] {
        match self {
            Self::LogPower | Self::LinearLog => &TWO_PARAMETER_BOUNDS,
            Self::PowerLog => &THREE_PARAMETER_BOUNDS,
        }
    }

    /// Returns true when `x` lies in the model domain.
    #[must_use]
    pub fn in_domain(x: f64) -> bool {
        x.is_finite() && x > 1.0
    }

    /// Checks that `x` lies in the model domain.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidDomain`] for non-finite `x` or `x <= 1`.
    pub fn check_domain(x: f64) -> Result<(), DomainError> {
        if Self::in_domain(x) {
            Ok(())
        } else {
            Err(DomainError::InvalidDomain {
                x,
            })
        }
    }

    /// Evaluates the model at `x`; the caller guarantees the domain.
    #[must_use]
    pub fn evaluate(self, parameters: &[f64], x: f64) -> f64 {
        let log_x = x.ln();
        match (self, parameters) {
            (Self::LogPower, [c, b]) => c * log_x.powf(*b),
            (Self::LinearLog, [c, b]) => c * x * log_x.powf(*b),
            (Self::PowerLog, [c, a, b]) => c * x.powf(*a) * log_x.powf(*b),
            _ => f64::NAN,
        }
    }

    /// Returns the partial derivatives of the model at `x`, in parameter order.
    #[must_use]
    pub fn gradient(self, parameters: &[f64], x: f64) -> Vec<f64> {
        let log_x = x.ln();
        let log_log_x = log_x.ln();
        match (self, parameters) {
            (Self::LogPower, [c, b]) => {
                let basis = log_x.powf(*b);
                vec![basis, c * basis * log_log_x]
            }
            (Self::LinearLog, [c, b]) => {
                let basis = x * log_x.powf(*b);
                vec![basis, c * basis * log_log_x]
            }
            (Self::PowerLog, [c, a, b]) => {
                let basis = x.powf(*a) * log_x.powf(*b);
                let value = c * basis;
                vec![basis, value * log_x, value * log_log_x]
            }
            _ => vec![f64::NAN; self.parameter_count()],
        }
    }

    /// Derives a starting point from a linear least-squares fit in log space.
    ///
    /// Returns `None` when any point is outside the domain, any `y` is not
    /// positive, or the log-space design matrix is singular. The result is
    /// clamped into the parameter bounds.
    #[must_use]
    pub fn log_linear_guess(self, points: &[(f64, f64)]) -> Option<Vec<f64>> {
        if points.iter().any(|(x, y)| !Self::in_domain(*x) || !(y.is_finite() && *y > 0.0)) {
            return None;
        }
        let n = self.parameter_count();
        let mut normal = vec![0.0; n * n];
        let mut rhs = vec![0.0; n];
        for (x, y) in points {
            let log_x = x.ln();
            let (features, target) = match self {
                Self::LogPower => (vec![1.0, log_x.ln()], y.ln()),
                Self::LinearLog => (vec![1.0, log_x.ln()], y.ln() - log_x),
                Self::PowerLog => (vec![1.0, log_x, log_x.ln()], y.ln()),
            };
            for i in 0 .. n {
                rhs[i] += features[i] * target;
                for j in 0 .. n {
                    normal[i * n + j] += features[i] * features[j];
                }
            }
        }
        let mut solution = cholesky_solve(&normal, &rhs)?;
        solution[0] = solution[0].exp();
        let guess = self
            .bounds()
            .iter()
            .zip(&solution)
            .map(|(bound, value)| bound.project(*value))
            .collect::<Vec<_>>();
        guess.iter().all(|value| value.is_finite()).then_some(guess)
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
