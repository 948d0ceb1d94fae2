//! Section validation tests for benchfit-config.
// crates/benchfit-config/tests/section_validation.rs
// =============================================================================
// Module: Config Section Validation Tests
// Description: Validate per-section rules and conversions into core requests.
// Purpose: Ensure invalid settings fail closed with the offending field named.
// =============================================================================

use benchfit_config::BenchfitConfig;
use benchfit_config::config_toml_example;
use benchfit_core::FitOptions;
use benchfit_core::InitStrategy;
use benchfit_core::ModelFamily;
use benchfit_core::Predicate;
use benchfit_core::Reducer;
use benchfit_core::SamplingScale;
use benchfit_core::fields;

type TestResult = Result<(), String>;

fn assert_rejected(toml: &str, needle: &str) -> TestResult {
    match BenchfitConfig::from_toml_str(toml) {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err(format!("expected config to be rejected: {toml}")),
    }
}

fn parse(toml: &str) -> Result<BenchfitConfig, String> {
    BenchfitConfig::from_toml_str(toml).map_err(|err| err.to_string())
}

#[test]
fn defaults_pass_validation() -> TestResult {
    let config = BenchfitConfig::default();
    config.validate().map_err(|err| err.to_string())?;
    if config.ratios.reducers != vec![Reducer::Min, Reducer::Max] {
        return Err("ratio summaries default to min and max".to_string());
    }
    if config.ratios.round_digits != Some(2) {
        return Err("ratio summaries default to two decimals".to_string());
    }
    if config.stats.reducers != vec![Reducer::Median, Reducer::Max] {
        return Err("raw summaries default to median and max".to_string());
    }
    if config.series.samples != 100 || config.series.scale != SamplingScale::Linear {
        return Err("series default to 100 linear samples".to_string());
    }
    Ok(())
}

#[test]
fn example_round_trips_to_the_defaults_it_documents() -> TestResult {
    let example = parse(&config_toml_example())?;
    let defaults = BenchfitConfig::default();
    if example.fit.specs() != defaults.fit.specs() {
        return Err("example fit section should match the defaults".to_string());
    }
    if example.series.palette != defaults.series.palette {
        return Err("example palette should match the default palette".to_string());
    }
    if example.filter_set().predicates().len() != 2 {
        return Err("example should declare two filters".to_string());
    }
    Ok(())
}

#[test]
fn fit_specs_follow_the_fit_section() -> TestResult {
    let config = parse(
        r#"
[fit]
axis = "graph_size"
group_keys = ["solver"]
exclude_failures = false
init = "fixed"
parallel = false

[fit.window]
min = 10.0
max = 1e9

[[fit.metrics]]
metric = "time_seconds"
model = "linear_log"
"#,
    )?;
    let specs = config.fit.specs();
    let [spec] = specs.as_slice() else {
        return Err(format!("expected one spec, got {}", specs.len()));
    };
    if spec.axis != fields::GRAPH_SIZE || spec.metric != fields::TIME_SECONDS {
        return Err("spec should carry the configured axis and metric".to_string());
    }
    if spec.model != ModelFamily::LinearLog || spec.init != InitStrategy::Fixed {
        return Err("spec should carry the configured model and init".to_string());
    }
    if spec.failure.is_some() || spec.group_keys != vec![fields::SOLVER.to_string()] {
        return Err("spec should drop the failure rule and group by solver".to_string());
    }
    if (spec.window.min, spec.window.max) != (10.0, 1e9) {
        return Err("spec should carry the configured window".to_string());
    }
    if config.fit.options() != FitOptions::default() {
        return Err("parallel = false should give sequential options".to_string());
    }
    Ok(())
}

#[test]
fn reference_line_appears_only_for_the_failure_column() -> TestResult {
    let config = BenchfitConfig::default();
    let iterations = config.series.panel_spec(&config.fit, fields::ITERATIONS);
    if iterations.reference != Some(200.0) {
        return Err("iteration panels should show the failure threshold".to_string());
    }
    let time = config.series.panel_spec(&config.fit, fields::TIME_PER_ARC_PER_ITER);
    if time.reference.is_some() {
        return Err("time panels should not show a reference line".to_string());
    }
    if time.curve_min != 1e3 || time.axis != fields::ARCS {
        return Err("curves should start at the fit window minimum".to_string());
    }
    Ok(())
}

#[test]
fn filters_deserialize_into_predicates() -> TestResult {
    let config = parse(
        r#"
[[filters]]
kind = "in_set"
column = "solver"
values = ["tulip_cmg", "tulip_hypre"]

[[filters]]
kind = "not_null"
column = "time_seconds"
"#,
    )?;
    match config.filters.as_slice() {
        [Predicate::InSet { column, values }, Predicate::NotNull { .. }]
            if column == fields::SOLVER && values.len() == 2 =>
        {
            Ok(())
        }
        other => Err(format!("unexpected filters: {}", other.len())),
    }
}

#[test]
fn empty_metric_lists_are_rejected() -> TestResult {
    assert_rejected("[ratios]\nmetrics = []\n", "ratios.metrics must be non-empty")?;
    assert_rejected("[stats]\nmetrics = []\n", "stats.metrics must be non-empty")?;
    assert_rejected("[fit]\nmetrics = []\n", "fit.metrics must be non-empty")?;
    Ok(())
}

#[test]
fn blank_and_duplicate_names_are_rejected() -> TestResult {
    assert_rejected("[fit]\naxis = \" \"\n", "fit.axis must be non-empty")?;
    assert_rejected("[ratios.baseline]\nsolver = \"\"\n", "ratios.baseline.solver must be non-empty")?;
    assert_rejected(
        "[stats]\ngroup_keys = [\"solver\", \"solver\"]\n",
        "stats.group_keys lists `solver` twice",
    )?;
    assert_rejected(
        "[[fit.metrics]]\nmetric = \"iterations\"\nmodel = \"log_power\"\n\
         [[fit.metrics]]\nmetric = \"iterations\"\nmodel = \"log_power\"\n",
        "fit.metrics lists `iterations` more than once",
    )?;
    assert_rejected(
        "[[fit.metrics]]\nmetric = \"iterations\"\nmodel = \"log_power\"\n\
         [[fit.metrics]]\nmetric = \"iterations\"\nmodel = \"power_log\"\n",
        "fit.metrics lists `iterations` more than once",
    )?;
    Ok(())
}

#[test]
fn invalid_windows_are_rejected() -> TestResult {
    assert_rejected("[fit.window]\nmin = 10.0\nmax = 10.0\n", "fit.window.min must be less")?;
    assert_rejected("[fit.window]\nmin = nan\nmax = 10.0\n", "fit.window.min must be less")?;
    Ok(())
}

#[test]
fn non_positive_solver_settings_are_rejected() -> TestResult {
    assert_rejected("[fit.solver]\nmax_evaluations = 0\n", "fit.solver.max_evaluations")?;
    assert_rejected("[fit.solver]\nftol = 0.0\n", "fit.solver.ftol must be positive")?;
    assert_rejected("[fit.solver]\ngtol = -1e-9\n", "fit.solver.gtol must be positive")?;
    Ok(())
}

#[test]
fn derivation_outputs_must_be_distinct() -> TestResult {
    assert_rejected(
        "[[derive]]\nkind = \"sum\"\nname = \"n\"\ncolumns = [\"vertices\"]\n\
         [[derive]]\nkind = \"scale\"\nname = \"n\"\ncolumn = \"arcs\"\nfactor = 2.0\n",
        "derive lists output `n` twice",
    )?;
    assert_rejected(
        "[[derive]]\nkind = \"concat\"\nname = \"params\"\ncolumns = []\n",
        "derive `params` must name at least one input column",
    )?;
    Ok(())
}

#[test]
fn rounding_samples_and_palettes_are_bounded() -> TestResult {
    assert_rejected("[ratios]\nround_digits = 13\n", "ratios.round_digits must be at most 12")?;
    assert_rejected("[series]\nsamples = 1\n", "series.samples must be at least 2")?;
    assert_rejected("[series.palette]\ncolors = []\n", "series.palette.colors must be non-empty")?;
    assert_rejected("[stats]\nreducers = []\n", "stats.reducers must be non-empty")?;
    Ok(())
}

#[test]
fn inverted_filter_range_is_rejected() -> TestResult {
    assert_rejected(
        "[[filters]]\nkind = \"range\"\ncolumn = \"arcs\"\nmin = 5.0\nmax = 1.0\n",
        "filters range on `arcs` must have min below max",
    )?;
    Ok(())
}

#[test]
fn unknown_model_is_a_parse_error() -> TestResult {
    assert_rejected("[[fit.metrics]]\nmetric = \"iterations\"\nmodel = \"cubic\"\n", "config parse error")?;
    Ok(())
}
