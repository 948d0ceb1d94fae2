// crates/benchfit-config/src/config.rs
// ============================================================================
// Module: Benchfit Configuration
// Description: Configuration loading and validation for Benchfit runs.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: benchfit-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Every section has documented defaults, so an absent default file yields a
//! usable configuration; an explicitly named file that cannot be read or
//! fails validation is an error. Sections convert into the explicit request
//! structures consumed by `benchfit-core`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use benchfit_core::BaselineSelector;
use benchfit_core::DeriveExpr;
use benchfit_core::FilterSet;
use benchfit_core::FitOptions;
use benchfit_core::FitSpec;
use benchfit_core::InitStrategy;
use benchfit_core::ModelFamily;
use benchfit_core::Palette;
use benchfit_core::PanelSpec;
use benchfit_core::Predicate;
use benchfit_core::Reducer;
use benchfit_core::SamplingScale;
use benchfit_core::SolverOptions;
use benchfit_core::Window;
use benchfit_core::fields;
use benchfit_core::runtime::FailureFilter;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "benchfit.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "BENCHFIT_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum decimal digits accepted for summary rounding.
pub(crate) const MAX_ROUND_DIGITS: u8 = 12;
/// Minimum number of samples per fitted curve.
pub(crate) const MIN_SAMPLE_COUNT: usize = 2;
/// Default decimal digits for ratio summaries.
const DEFAULT_ROUND_DIGITS: u8 = 2;
/// Default non-convergence iteration threshold.
const DEFAULT_FAILURE_THRESHOLD: f64 = 200.0;
/// Default number of samples per fitted curve.
const DEFAULT_SAMPLES: usize = 100;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Benchfit run configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BenchfitConfig {
    /// Row predicates applied after the derivations, all of which must hold.
    #[serde(default)]
    pub filters: Vec<Predicate>,
    /// Derived columns added in order before the filters run, so a filter
    /// may name a derived column.
    #[serde(default)]
    pub derive: Vec<DeriveExpr>,
    /// Baseline-relative ratio summary settings.
    #[serde(default)]
    pub ratios: RatiosConfig,
    /// Raw per-group summary settings.
    #[serde(default)]
    pub stats: StatsConfig,
    /// Scaling-law fit settings.
    #[serde(default)]
    pub fit: FitConfig,
    /// Presentation series settings.
    #[serde(default)]
    pub series: SeriesConfig,
}

impl BenchfitConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// The path is taken from `path`, then [`CONFIG_ENV_VAR`], then
    /// `benchfit.toml` in the working directory. Only the last may be absent,
    /// in which case the defaults are returned.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (resolved, explicit) = resolve_path(path)?;
        validate_path(&resolved)?;
        if !explicit && !resolved.exists() {
            return Ok(Self::default());
        }
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for predicate in &self.filters {
            validate_predicate(predicate)?;
        }
        validate_derivations(&self.derive)?;
        self.ratios.validate()?;
        self.stats.validate()?;
        self.fit.validate()?;
        self.series.validate()?;
        Ok(())
    }

    /// Returns the configured row filters.
    #[must_use]
    pub fn filter_set(&self) -> FilterSet {
        FilterSet::from(self.filters.clone())
    }
}

/// Baseline-relative ratio summary configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RatiosConfig {
    /// Metric columns divided by the baseline value.
    #[serde(default = "default_ratio_metrics")]
    pub metrics: Vec<String>,
    /// Baseline selection rule.
    #[serde(default)]
    pub baseline: BaselineSelector,
    /// Columns carried into each ratio row and used to group the summary.
    #[serde(default = "default_ratio_group_keys")]
    pub group_keys: Vec<String>,
    /// Statistics computed per (group, solver).
    #[serde(default = "default_ratio_reducers")]
    pub reducers: Vec<Reducer>,
    /// Decimal digits kept in summary values; two by default.
    #[serde(default = "default_round_digits")]
    pub round_digits: Option<u8>,
}

impl Default for RatiosConfig {
    fn default() -> Self {
        Self {
            metrics: default_ratio_metrics(),
            baseline: BaselineSelector::default(),
            group_keys: default_ratio_group_keys(),
            reducers: default_ratio_reducers(),
            round_digits: default_round_digits(),
        }
    }
}

impl RatiosConfig {
    /// Validates the ratio settings.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_names("ratios.metrics", &self.metrics)?;
        validate_name("ratios.baseline.solver", &self.baseline.solver)?;
        validate_keys("ratios.group_keys", &self.group_keys)?;
        validate_reducers("ratios.reducers", &self.reducers)?;
        validate_round_digits("ratios.round_digits", self.round_digits)
    }
}

/// Raw per-group summary configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StatsConfig {
    /// Metric columns summarized.
    #[serde(default = "default_stats_metrics")]
    pub metrics: Vec<String>,
    /// Grouping columns.
    #[serde(default = "default_stats_group_keys")]
    pub group_keys: Vec<String>,
    /// Statistics computed per group.
    #[serde(default = "default_stats_reducers")]
    pub reducers: Vec<Reducer>,
    /// Decimal digits kept in summary values; absent keeps full precision.
    #[serde(default)]
    pub round_digits: Option<u8>,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            metrics: default_stats_metrics(),
            group_keys: default_stats_group_keys(),
            reducers: default_stats_reducers(),
            round_digits: None,
        }
    }
}

impl StatsConfig {
    /// Validates the summary settings.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_names("stats.metrics", &self.metrics)?;
        validate_keys("stats.group_keys", &self.group_keys)?;
        validate_reducers("stats.reducers", &self.reducers)?;
        validate_round_digits("stats.round_digits", self.round_digits)
    }
}

/// One fitted metric and its model family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FitMetricConfig {
    /// Dependent metric column.
    pub metric: String,
    /// Model family fitted to the metric.
    pub model: ModelFamily,
}

/// Scaling-law fit configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FitConfig {
    /// Independent axis column.
    #[serde(default = "default_axis")]
    pub axis: String,
    /// Grouping columns; one curve per distinct key and metric.
    #[serde(default = "default_fit_group_keys")]
    pub group_keys: Vec<String>,
    /// Regression window `[min, max)` on the axis.
    #[serde(default)]
    pub window: Window,
    /// Excludes non-convergent runs before fitting.
    #[serde(default = "default_true")]
    pub exclude_failures: bool,
    /// Column compared against the failure threshold.
    #[serde(default = "default_failure_column")]
    pub failure_column: String,
    /// Values at or above this mark a non-convergent run.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: f64,
    /// Starting-point strategy.
    #[serde(default)]
    pub init: InitStrategy,
    /// Solver budget and tolerances.
    #[serde(default)]
    pub solver: SolverOptions,
    /// Fits groups on the rayon pool.
    #[serde(default = "default_true")]
    pub parallel: bool,
    /// Metrics fitted, each with its model family.
    #[serde(default = "default_fit_metrics")]
    pub metrics: Vec<FitMetricConfig>,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            axis: default_axis(),
            group_keys: default_fit_group_keys(),
            window: Window::default(),
            exclude_failures: true,
            failure_column: default_failure_column(),
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            init: InitStrategy::default(),
            solver: SolverOptions::default(),
            parallel: true,
            metrics: default_fit_metrics(),
        }
    }
}

impl FitConfig {
    /// Returns one fit request per configured metric.
    #[must_use]
    pub fn specs(&self) -> Vec<FitSpec> {
        let keys = self.group_keys.iter().map(String::as_str).collect::<Vec<_>>();
        self.metrics
            .iter()
            .map(|entry| {
                FitSpec::new(&self.axis, &entry.metric, entry.model)
                    .with_window(self.window)
                    .with_failure(self.failure_filter())
                    .grouped_by(&keys)
                    .with_init(self.init)
                    .with_solver(self.solver)
            })
            .collect()
    }

    /// Returns the batch execution options.
    #[must_use]
    pub const fn options(&self) -> FitOptions {
        FitOptions {
            parallel: self.parallel,
        }
    }

    /// Returns the non-convergence rule, if enabled.
    #[must_use]
    pub fn failure_filter(&self) -> Option<FailureFilter> {
        self.exclude_failures.then(|| FailureFilter {
            column: self.failure_column.clone(),
            threshold: self.failure_threshold,
        })
    }

    /// Validates the fit settings.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_name("fit.axis", &self.axis)?;
        validate_keys("fit.group_keys", &self.group_keys)?;
        let Window {
            min,
            max,
        } = self.window;
        if min.is_nan() || max.is_nan() || min >= max {
            return Err(ConfigError::Invalid(
                "fit.window.min must be less than fit.window.max".to_string(),
            ));
        }
        if self.exclude_failures {
            validate_name("fit.failure_column", &self.failure_column)?;
            if !self.failure_threshold.is_finite() {
                return Err(ConfigError::Invalid("fit.failure_threshold must be finite".to_string()));
            }
        }
        if self.solver.max_evaluations == 0 {
            return Err(ConfigError::Invalid(
                "fit.solver.max_evaluations must be greater than zero".to_string(),
            ));
        }
        for (field, value) in [
            ("fit.solver.ftol", self.solver.ftol),
            ("fit.solver.xtol", self.solver.xtol),
            ("fit.solver.gtol", self.solver.gtol),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ConfigError::Invalid(format!("{field} must be positive")));
            }
        }
        if self.metrics.is_empty() {
            return Err(ConfigError::Invalid("fit.metrics must be non-empty".to_string()));
        }
        let mut seen = BTreeSet::new();
        for entry in &self.metrics {
            validate_name("fit.metrics.metric", &entry.metric)?;
            if !seen.insert(entry.metric.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "fit.metrics lists `{}` more than once",
                    entry.metric
                )));
            }
        }
        Ok(())
    }
}

/// Presentation series configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SeriesConfig {
    /// Columns whose values split the dataset into panels.
    #[serde(default = "default_panel_keys")]
    pub panel_keys: Vec<String>,
    /// Column whose values become series within a panel.
    #[serde(default = "default_category")]
    pub category: String,
    /// Curve sampling scale.
    #[serde(default)]
    pub scale: SamplingScale,
    /// Samples per fitted curve.
    #[serde(default = "default_samples")]
    pub samples: usize,
    /// Lower x bound for curve sampling; defaults to the fit window minimum.
    #[serde(default)]
    pub curve_min: Option<f64>,
    /// Draws the failure threshold on panels of the failure column.
    #[serde(default = "default_true")]
    pub reference_line: bool,
    /// Category colors and markers.
    #[serde(default)]
    pub palette: Palette,
}

impl Default for SeriesConfig {
    fn default() -> Self {
        Self {
            panel_keys: default_panel_keys(),
            category: default_category(),
            scale: SamplingScale::default(),
            samples: DEFAULT_SAMPLES,
            curve_min: None,
            reference_line: true,
            palette: Palette::default(),
        }
    }
}

impl SeriesConfig {
    /// Returns the panel layout for one fitted metric.
    ///
    /// Curves are looked up by `panel_keys` then `category`, so the fit is
    /// expected to group by those columns in that order.
    #[must_use]
    pub fn panel_spec(&self, fit: &FitConfig, metric: &str) -> PanelSpec {
        let reference = (self.reference_line && fit.exclude_failures && metric == fit.failure_column)
            .then_some(fit.failure_threshold);
        PanelSpec {
            panel_keys: self.panel_keys.clone(),
            category: self.category.clone(),
            axis: fit.axis.clone(),
            metric: metric.to_string(),
            curve_min: self.curve_min.unwrap_or(fit.window.min),
            scale: self.scale,
            samples: self.samples,
            reference,
            palette: self.palette.clone(),
        }
    }

    /// Validates the series settings.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_keys("series.panel_keys", &self.panel_keys)?;
        validate_name("series.category", &self.category)?;
        if self.samples < MIN_SAMPLE_COUNT {
            return Err(ConfigError::Invalid(format!(
                "series.samples must be at least {MIN_SAMPLE_COUNT}"
            )));
        }
        if let Some(min) = self.curve_min
            && !min.is_finite()
        {
            return Err(ConfigError::Invalid("series.curve_min must be finite".to_string()));
        }
        if self.palette.colors.is_empty() {
            return Err(ConfigError::Invalid("series.palette.colors must be non-empty".to_string()));
        }
        if self.palette.markers.is_empty() {
            return Err(ConfigError::Invalid(
                "series.palette.markers must be non-empty".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default ratio metrics.
fn default_ratio_metrics() -> Vec<String> {
    vec![fields::ITERATIONS.to_string(), fields::TIME_PER_ARC_PER_ITER.to_string()]
}

/// Default ratio grouping columns.
fn default_ratio_group_keys() -> Vec<String> {
    vec![fields::PROBLEM_CLASS.to_string()]
}

/// Default ratio statistics.
fn default_ratio_reducers() -> Vec<Reducer> {
    vec![Reducer::Min, Reducer::Max]
}

/// Default ratio rounding.
#[allow(clippy::unnecessary_wraps, reason = "serde default functions return the field type.")]
const fn default_round_digits() -> Option<u8> {
    Some(DEFAULT_ROUND_DIGITS)
}

/// Default summary metrics.
fn default_stats_metrics() -> Vec<String> {
    vec![fields::TIME_SECONDS.to_string()]
}

/// Default summary grouping columns.
fn default_stats_group_keys() -> Vec<String> {
    vec![fields::PROBLEM_CLASS.to_string(), fields::SOLVER.to_string()]
}

/// Default summary statistics.
fn default_stats_reducers() -> Vec<Reducer> {
    vec![Reducer::Median, Reducer::Max]
}

/// Default fit axis.
fn default_axis() -> String {
    fields::ARCS.to_string()
}

/// Default fit grouping columns.
fn default_fit_group_keys() -> Vec<String> {
    vec![fields::PROBLEM_CLASS.to_string(), fields::SOLVER.to_string()]
}

/// Default failure column.
fn default_failure_column() -> String {
    fields::ITERATIONS.to_string()
}

/// Default failure threshold.
const fn default_failure_threshold() -> f64 {
    DEFAULT_FAILURE_THRESHOLD
}

/// Default fitted metrics.
fn default_fit_metrics() -> Vec<FitMetricConfig> {
    vec![
        FitMetricConfig {
            metric: fields::ITERATIONS.to_string(),
            model: ModelFamily::LogPower,
        },
        FitMetricConfig {
            metric: fields::TIME_PER_ARC_PER_ITER.to_string(),
            model: ModelFamily::PowerLog,
        },
    ]
}

/// Default panel columns.
fn default_panel_keys() -> Vec<String> {
    vec![fields::PROBLEM_CLASS.to_string()]
}

/// Default series category column.
fn default_category() -> String {
    fields::SOLVER.to_string()
}

/// Default curve sample count.
const fn default_samples() -> usize {
    DEFAULT_SAMPLES
}

/// Serde default for flags that are on unless disabled.
const fn default_true() -> bool {
    true
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
///
/// The flag is true when the path was named explicitly.
fn resolve_path(path: Option<&Path>) -> Result<(PathBuf, bool), ConfigError> {
    if let Some(path) = path {
        return Ok((path.to_path_buf(), true));
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok((PathBuf::from(env_path), true));
    }
    Ok((PathBuf::from(DEFAULT_CONFIG_NAME), false))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a column name.
fn validate_name(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    Ok(())
}

/// Validates a non-empty list of distinct column names.
fn validate_names(field: &str, values: &[String]) -> Result<(), ConfigError> {
    if values.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    validate_keys(field, values)
}

/// Validates a possibly empty list of distinct column names.
fn validate_keys(field: &str, values: &[String]) -> Result<(), ConfigError> {
    let mut seen = BTreeSet::new();
    for value in values {
        validate_name(field, value)?;
        if !seen.insert(value.as_str()) {
            return Err(ConfigError::Invalid(format!("{field} lists `{value}` twice")));
        }
    }
    Ok(())
}

/// Validates a non-empty reducer list.
fn validate_reducers(field: &str, reducers: &[Reducer]) -> Result<(), ConfigError> {
    if reducers.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    Ok(())
}

/// Validates summary rounding.
fn validate_round_digits(field: &str, digits: Option<u8>) -> Result<(), ConfigError> {
    if let Some(digits) = digits
        && digits > MAX_ROUND_DIGITS
    {
        return Err(ConfigError::Invalid(format!("{field} must be at most {MAX_ROUND_DIGITS}")));
    }
    Ok(())
}

/// Validates one filter predicate.
fn validate_predicate(predicate: &Predicate) -> Result<(), ConfigError> {
    validate_name("filters.column", predicate.column())?;
    if let Predicate::Range {
        min,
        max,
        ..
    } = predicate
    {
        if min.is_some_and(f64::is_nan) || max.is_some_and(f64::is_nan) {
            return Err(ConfigError::Invalid("filters range bounds must be numbers".to_string()));
        }
        if let (Some(min), Some(max)) = (min, max)
            && min >= max
        {
            return Err(ConfigError::Invalid(format!(
                "filters range on `{}` must have min below max",
                predicate.column()
            )));
        }
    }
    Ok(())
}

/// Validates derivations: named outputs, named inputs, distinct outputs.
fn validate_derivations(derivations: &[DeriveExpr]) -> Result<(), ConfigError> {
    let mut seen = BTreeSet::new();
    for derivation in derivations {
        validate_name("derive.name", derivation.name())?;
        if derivation.inputs().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "derive `{}` must name at least one input column",
                derivation.name()
            )));
        }
        for input in derivation.inputs() {
            validate_name("derive.columns", input)?;
        }
        if let DeriveExpr::Scale {
            factor,
            ..
        } = derivation
            && !factor.is_finite()
        {
            return Err(ConfigError::Invalid(format!(
                "derive `{}` factor must be finite",
                derivation.name()
            )));
        }
        if !seen.insert(derivation.name()) {
            return Err(ConfigError::Invalid(format!(
                "derive lists output `{}` twice",
                derivation.name()
            )));
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions are permitted."
    )]

    use super::*;

    #[test]
    fn validate_path_rejects_long_component() {
        let component = "a".repeat(MAX_PATH_COMPONENT_LENGTH + 1);
        let err = validate_path(Path::new(&component)).unwrap_err();
        assert_eq!(err.to_string(), "invalid config: config path component too long");
    }

    #[test]
    fn validate_path_accepts_component_at_max() {
        let component = "a".repeat(MAX_PATH_COMPONENT_LENGTH);
        assert!(validate_path(Path::new(&component)).is_ok());
    }

    #[test]
    fn validate_keys_rejects_duplicates_and_blanks() {
        let duplicate = vec!["solver".to_string(), "solver".to_string()];
        assert!(validate_keys("k", &duplicate).is_err());
        assert!(validate_keys("k", &[" ".to_string()]).is_err());
        assert!(validate_keys("k", &[]).is_ok());
        assert!(validate_names("k", &[]).is_err());
    }

    #[test]
    fn round_digits_limit_is_inclusive() {
        assert!(validate_round_digits("r", Some(MAX_ROUND_DIGITS)).is_ok());
        assert!(validate_round_digits("r", Some(MAX_ROUND_DIGITS + 1)).is_err());
        assert!(validate_round_digits("r", None).is_ok());
    }

    #[test]
    fn explicit_path_is_flagged() {
        let (path, explicit) = resolve_path(Some(Path::new("custom.toml"))).unwrap();
        assert_eq!(path, PathBuf::from("custom.toml"));
        assert!(explicit);
    }
}
