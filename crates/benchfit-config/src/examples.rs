// crates/benchfit-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payloads.
// Purpose: Deterministic examples for docs and tooling.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example `benchfit.toml`. The example spells out every section
//! with its default values plus a typical filter and derivation set, and is
//! kept loadable by the config tests.

/// Returns a canonical example `benchfit.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r##"[[filters]]
kind = "not_null"
column = "time_per_arc_per_iter"

[[filters]]
kind = "range"
column = "iterations"
max = 200.0

[[derive]]
kind = "sum"
name = "graph_size"
columns = ["vertices", "arcs"]

[[derive]]
kind = "scale"
name = "time_us_per_arc_per_iter"
column = "time_per_arc_per_iter"
factor = 1000000.0

[[derive]]
kind = "concat"
name = "params"
columns = ["cg_tolerance", "primal_tolerance", "dual_tolerance", "float_bits"]
separator = ","

[ratios]
metrics = ["iterations", "time_per_arc_per_iter"]
group_keys = ["problem_class"]
reducers = ["min", "max"]
round_digits = 2

[ratios.baseline]
solver = "tulip_approxchol"
require_flag = true
include_baseline = false

[stats]
metrics = ["time_seconds"]
group_keys = ["problem_class", "solver"]
reducers = ["median", "max"]

[fit]
axis = "arcs"
group_keys = ["problem_class", "solver"]
exclude_failures = true
failure_column = "iterations"
failure_threshold = 200.0
init = "log_linear"
parallel = true

[fit.window]
min = 1000.0
max = 5e50

[fit.solver]
max_evaluations = 2000
ftol = 1e-12
xtol = 1e-12
gtol = 1e-12

[[fit.metrics]]
metric = "iterations"
model = "log_power"

[[fit.metrics]]
metric = "time_per_arc_per_iter"
model = "power_log"

[series]
panel_keys = ["problem_class"]
category = "solver"
scale = "linear"
samples = 100
reference_line = true

[series.palette]
colors = ["#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b"]
markers = ["circle", "diamond", "triangle", "square", "inverted_triangle", "hex"]
"##,
    )
}
