// crates/benchfit-core/tests/aggregation.rs
// ============================================================================
// Module: Group Aggregator Tests
// Description: Baseline ratios, reshaping and grouped summary statistics.
// Purpose: Pin ratio semantics, warnings and the summary export format.
// ============================================================================

//! Group aggregator integration tests.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    clippy::float_cmp,
    reason = "Test-only assertions and helpers are permitted."
)]

use benchfit_core::AggregateError;
use benchfit_core::BaselineSelector;
use benchfit_core::ColumnKind;
use benchfit_core::Dataset;
use benchfit_core::GroupKey;
use benchfit_core::Reducer;
use benchfit_core::SchemaAliases;
use benchfit_core::SummaryTable;
use benchfit_core::Value;
use benchfit_core::Warning;
use benchfit_core::fields;
use benchfit_core::ratio_table;
use benchfit_core::runtime::aggregate::median;
use benchfit_core::runtime::aggregate::round_to;
use benchfit_core::runtime::melt;
use benchfit_core::runtime::pivot;
use benchfit_core::summarize;

fn table(columns: &[&str], rows: Vec<Vec<Value>>) -> Dataset {
    Dataset::from_rows(columns.iter().map(ToString::to_string).collect(), rows).unwrap()
}

fn runs() -> Dataset {
    table(
        &[fields::NAME, fields::PROBLEM_CLASS, fields::SOLVER, fields::IS_BASELINE, fields::ITERATIONS],
        vec![
            vec!["r1".into(), "netgen_8".into(), "S".into(), true.into(), 10_i64.into()],
            vec!["r1".into(), "netgen_8".into(), "T".into(), true.into(), 20_i64.into()],
            vec!["r1".into(), "netgen_8".into(), "U".into(), true.into(), 5_i64.into()],
            vec!["r2".into(), "grid_long".into(), "S".into(), true.into(), 4_i64.into()],
            vec!["r2".into(), "grid_long".into(), "T".into(), true.into(), 6_i64.into()],
        ],
    )
}

// ============================================================================
// SECTION: Ratio Tables
// ============================================================================

#[test]
fn variant_ratio_divides_by_baseline_of_same_run() {
    let selector = BaselineSelector::new("S").require_flag(false);
    let relative = ratio_table(&runs(), &[fields::ITERATIONS], &selector, &[]).unwrap();
    assert_eq!(relative.ratio("r1", "T", fields::ITERATIONS), Some(2.0));
    assert_eq!(relative.ratio("r1", "U", fields::ITERATIONS), Some(0.5));
    assert_eq!(relative.ratio("r2", "T", fields::ITERATIONS), Some(1.5));
    assert_eq!(relative.ratio("r1", "S", fields::ITERATIONS), None);
    assert_eq!(relative.len(), 3);
    assert!(relative.warnings().is_empty());
}

#[test]
fn baseline_rows_are_emitted_only_on_request() {
    let selector = BaselineSelector::new("S").require_flag(false).include_baseline(true);
    let relative = ratio_table(&runs(), &[fields::ITERATIONS], &selector, &[]).unwrap();
    assert_eq!(relative.ratio("r1", "S", fields::ITERATIONS), Some(1.0));
    assert_eq!(relative.ratio("r2", "S", fields::ITERATIONS), Some(1.0));
    assert_eq!(relative.len(), 5);
}

#[test]
fn run_without_baseline_is_skipped_with_warning() {
    let dataset = table(
        &[fields::NAME, fields::SOLVER, fields::ITERATIONS],
        vec![
            vec!["r1".into(), "S".into(), 10_i64.into()],
            vec!["r1".into(), "T".into(), 20_i64.into()],
            vec!["r2".into(), "T".into(), 6_i64.into()],
        ],
    );
    let selector = BaselineSelector::new("S").require_flag(false);
    let relative = ratio_table(&dataset, &[fields::ITERATIONS], &selector, &[]).unwrap();
    assert_eq!(relative.len(), 1);
    assert_eq!(relative.ratio("r2", "T", fields::ITERATIONS), None);
    assert_eq!(
        relative.warnings(),
        [Warning::BaselineMissing {
            name: "r2".to_string(),
        }]
    );
}

#[test]
fn ambiguous_baseline_yields_no_ratios_for_the_run() {
    let dataset = table(
        &[fields::NAME, fields::SOLVER, fields::ITERATIONS],
        vec![
            vec!["r1".into(), "S".into(), 10_i64.into()],
            vec!["r1".into(), "S".into(), 12_i64.into()],
            vec!["r1".into(), "T".into(), 20_i64.into()],
        ],
    );
    let selector = BaselineSelector::new("S").require_flag(false);
    let relative = ratio_table(&dataset, &[fields::ITERATIONS], &selector, &[]).unwrap();
    assert!(relative.is_empty());
    assert!(matches!(
        relative.warnings(),
        [Warning::BaselineAmbiguous { name, candidates: 2 }] if name == "r1"
    ));
}

#[test]
fn baseline_flag_disambiguates_repeated_solver() {
    let dataset = table(
        &[fields::NAME, fields::SOLVER, fields::IS_BASELINE, fields::ITERATIONS],
        vec![
            vec!["r1".into(), "S".into(), false.into(), 40_i64.into()],
            vec!["r1".into(), "S".into(), true.into(), 10_i64.into()],
            vec!["r1".into(), "T".into(), false.into(), 20_i64.into()],
        ],
    );
    let relative =
        ratio_table(&dataset, &[fields::ITERATIONS], &BaselineSelector::new("S"), &[]).unwrap();
    assert_eq!(relative.rows().len(), 1);
    assert_eq!(relative.ratio("r1", "T", fields::ITERATIONS), Some(2.0));
}

#[test]
fn required_flag_without_flag_column_is_unknown_column() {
    let dataset = table(
        &[fields::NAME, fields::SOLVER, fields::ITERATIONS],
        vec![vec!["r1".into(), "S".into(), 10_i64.into()]],
    );
    let err = ratio_table(&dataset, &[fields::ITERATIONS], &BaselineSelector::new("S"), &[])
        .unwrap_err();
    assert_eq!(err, AggregateError::UnknownColumn(fields::IS_BASELINE.to_string()));
}

#[test]
fn zero_baseline_value_is_an_undefined_ratio() {
    let dataset = table(
        &[fields::NAME, fields::SOLVER, fields::TIME_SECONDS, fields::ITERATIONS],
        vec![
            vec!["r1".into(), "S".into(), 0.0.into(), 10_i64.into()],
            vec!["r1".into(), "T".into(), 2.0.into(), 30_i64.into()],
        ],
    );
    let selector = BaselineSelector::new("S").require_flag(false);
    let relative =
        ratio_table(&dataset, &[fields::TIME_SECONDS, fields::ITERATIONS], &selector, &[]).unwrap();
    assert_eq!(relative.ratio("r1", "T", fields::TIME_SECONDS), None);
    assert_eq!(relative.ratio("r1", "T", fields::ITERATIONS), Some(3.0));
    assert!(matches!(
        relative.warnings(),
        [Warning::RatioUndefined { metric, .. }] if metric == fields::TIME_SECONDS
    ));
}

#[test]
fn unknown_metric_is_reported() {
    let selector = BaselineSelector::new("S").require_flag(false);
    let err = ratio_table(&runs(), &["walltime"], &selector, &[]).unwrap_err();
    assert_eq!(err, AggregateError::UnknownColumn("walltime".to_string()));
}

#[test]
fn wide_form_has_one_column_per_metric() {
    let dataset = table(
        &[fields::NAME, fields::PROBLEM_CLASS, fields::SOLVER, fields::TIME_SECONDS, fields::ITERATIONS],
        vec![
            vec!["r1".into(), "c".into(), "S".into(), 2.0.into(), 10_i64.into()],
            vec!["r1".into(), "c".into(), "T".into(), 1.0.into(), 30_i64.into()],
        ],
    );
    let selector = BaselineSelector::new("S").require_flag(false);
    let relative = ratio_table(
        &dataset,
        &[fields::TIME_SECONDS, fields::ITERATIONS],
        &selector,
        &[fields::PROBLEM_CLASS],
    )
    .unwrap();
    let wide = relative.to_wide().unwrap();
    assert_eq!(
        wide.columns(),
        [
            fields::NAME.to_string(),
            fields::SOLVER.to_string(),
            fields::PROBLEM_CLASS.to_string(),
            fields::ITERATIONS.to_string(),
            fields::TIME_SECONDS.to_string(),
        ]
    );
    let row = wide.row(0).unwrap();
    assert_eq!(row.get(fields::ITERATIONS), Some(&Value::Float(3.0)));
    assert_eq!(row.get(fields::TIME_SECONDS), Some(&Value::Float(0.5)));
    assert_eq!(relative.to_long().unwrap().len(), 2);
}

// ============================================================================
// SECTION: Reshaping
// ============================================================================

#[test]
fn pivot_keeps_first_duplicate_and_reports_it() {
    let dataset = table(
        &["name", "solver", "time"],
        vec![
            vec!["a".into(), "x".into(), 1.0.into()],
            vec!["a".into(), "y".into(), 2.0.into()],
            vec!["a".into(), "x".into(), 9.0.into()],
            vec!["b".into(), "y".into(), 4.0.into()],
        ],
    );
    let result = pivot(&dataset, &["name"], "solver", "time").unwrap();
    assert_eq!(result.dataset.columns(), ["name".to_string(), "x".to_string(), "y".to_string()]);
    assert_eq!(result.dataset.row(0).unwrap().get("x"), Some(&Value::Float(1.0)));
    assert_eq!(result.dataset.row(1).unwrap().get("x"), Some(&Value::Null));
    assert_eq!(result.duplicates, vec![(GroupKey::new(vec![Value::text("a")]), Value::text("x"))]);
}

#[test]
fn melt_stacks_value_columns_in_order() {
    let dataset = table(
        &["name", "x", "y"],
        vec![vec!["a".into(), 1.0.into(), 2.0.into()], vec!["b".into(), 3.0.into(), 4.0.into()]],
    );
    let long = melt(&dataset, &["name"], &["x", "y"], "solver", "value").unwrap();
    assert_eq!(long.len(), 4);
    let pairs = long
        .rows()
        .map(|row| (row.get("name").cloned(), row.get("solver").cloned()))
        .collect::<Vec<_>>();
    assert_eq!(
        pairs,
        vec![
            (Some(Value::text("a")), Some(Value::text("x"))),
            (Some(Value::text("b")), Some(Value::text("x"))),
            (Some(Value::text("a")), Some(Value::text("y"))),
            (Some(Value::text("b")), Some(Value::text("y"))),
        ]
    );
    assert_eq!(long.row(3).unwrap().get("value"), Some(&Value::Float(4.0)));
}

// ============================================================================
// SECTION: Summaries
// ============================================================================

#[test]
fn reducers_and_rounding() {
    assert_eq!(Reducer::Median.apply(&[1.0, 2.0, 3.0, 10.0]), Some(2.5));
    assert_eq!(Reducer::Mean.apply(&[1.0, 2.0, 3.0]), Some(2.0));
    assert_eq!(Reducer::Count.apply(&[4.0, 4.0]), Some(2.0));
    assert_eq!(Reducer::Min.apply(&[]), None);
    assert_eq!(median(&[5.0, 1.0, 3.0]), Some(3.0));
    assert_eq!(round_to(1.25, 1), 1.3);
    assert_eq!(round_to(-1.25, 1), -1.3);
    assert_eq!(round_to(0.125_9, 2), 0.13);
    assert_eq!(Reducer::Max.column_name("ratio"), "max_ratio");
}

#[test]
fn baseline_relative_pipeline_summarizes_per_class_and_solver() {
    let selector = BaselineSelector::new("S").require_flag(false).include_baseline(true);
    let relative =
        ratio_table(&runs(), &[fields::ITERATIONS], &selector, &[fields::PROBLEM_CLASS]).unwrap();
    let wide = relative.to_wide().unwrap();
    let summary = summarize(
        &wide,
        &[fields::PROBLEM_CLASS, fields::SOLVER],
        &[fields::ITERATIONS],
        &[Reducer::Min, Reducer::Max],
        Some(2),
    )
    .unwrap()
    .exclude(fields::SOLVER, &Value::text("S"))
    .unwrap();

    assert_eq!(summary.value_columns(), ["min_iterations".to_string(), "max_iterations".to_string()]);
    assert_eq!(summary.len(), 3);
    let key = GroupKey::new(vec![Value::text("netgen_8"), Value::text("U")]);
    assert_eq!(summary.value(&key, "min_iterations"), Some(0.5));
    let key = GroupKey::new(vec![Value::text("grid_long"), Value::text("T")]);
    assert_eq!(summary.value(&key, "max_iterations"), Some(1.5));
    assert!(summary.rows().iter().all(|row| row.key.get(1) != Some(&Value::text("S"))));
}

#[test]
fn groups_without_values_get_null_statistics() {
    let dataset = table(
        &["class", "time"],
        vec![
            vec!["a".into(), 1.0.into()],
            vec!["a".into(), 3.0.into()],
            vec!["b".into(), Value::Null],
        ],
    );
    let summary =
        summarize(&dataset, &["class"], &["time"], &[Reducer::Median, Reducer::Count], None).unwrap();
    let b = GroupKey::new(vec![Value::text("b")]);
    assert_eq!(summary.rows()[1].key, b);
    assert_eq!(summary.rows()[1].values, vec![None, None]);
    assert_eq!(summary.value(&GroupKey::new(vec![Value::text("a")]), "median_time"), Some(2.0));
}

#[test]
fn non_numeric_metric_is_rejected() {
    let dataset = table(&["class", "time"], vec![vec!["a".into(), "fast".into()]]);
    let err = summarize(&dataset, &["class"], &["time"], &[Reducer::Min], None).unwrap_err();
    assert!(matches!(err, AggregateError::NonNumeric { ref column, row: 0 } if column == "time"));
}

#[test]
fn delimited_summary_round_trips() {
    let dataset = table(
        &["class", "solver", "time"],
        vec![
            vec!["grid".into(), "cmg".into(), 1.5.into()],
            vec!["grid".into(), "cmg".into(), 2.5.into()],
            vec!["netgen".into(), "cmg".into(), Value::Null],
        ],
    );
    let summary =
        summarize(&dataset, &["class", "solver"], &["time"], &[Reducer::Min, Reducer::Max], None)
            .unwrap();
    let mut buffer = Vec::new();
    summary.write_delimited(&mut buffer).unwrap();
    let text = String::from_utf8(buffer.clone()).unwrap();
    assert_eq!(text.lines().next(), Some("class,solver,min_time,max_time"));
    assert!(text.contains("netgen,cmg,,"));
    let kinds = [ColumnKind::Text, ColumnKind::Text];
    let restored = SummaryTable::read_delimited(buffer.as_slice(), &kinds).unwrap();
    assert_eq!(restored, summary);
}

#[test]
fn numeric_looking_text_keys_survive_the_delimited_round_trip() {
    let dataset = table(
        &[fields::CG_TOLERANCE, fields::FLOAT_BITS, "time"],
        vec![
            vec!["1e-6".into(), "64".into(), 1.0.into()],
            vec!["1e-8".into(), "32".into(), 3.0.into()],
        ],
    );
    let summary = summarize(
        &dataset,
        &[fields::CG_TOLERANCE, fields::FLOAT_BITS],
        &["time"],
        &[Reducer::Max],
        None,
    )
    .unwrap();
    let mut buffer = Vec::new();
    summary.write_delimited(&mut buffer).unwrap();

    let kinds = SchemaAliases::standard().kinds_of(&[fields::CG_TOLERANCE, fields::FLOAT_BITS]);
    assert_eq!(kinds, vec![ColumnKind::Text, ColumnKind::Text]);
    let restored = SummaryTable::read_delimited(buffer.as_slice(), &kinds).unwrap();
    assert_eq!(restored, summary);
    let key = GroupKey::new(vec![Value::text("1e-6"), Value::text("64")]);
    assert_eq!(restored.value(&key, "max_time"), Some(1.0));

    let inferred = [ColumnKind::Inferred, ColumnKind::Inferred];
    let guessed = SummaryTable::read_delimited(buffer.as_slice(), &inferred).unwrap();
    assert_ne!(guessed, summary);
}

#[test]
fn key_cell_that_does_not_fit_its_kind_is_rejected() {
    let text = "vertices,max_time\nmany,1\n";
    let err = SummaryTable::read_delimited(text.as_bytes(), &[ColumnKind::Integer]).unwrap_err();
    assert!(matches!(err, AggregateError::Csv(ref message) if message.contains("many")));
}

#[test]
fn excluding_an_unknown_key_column_fails() {
    let dataset = table(&["class", "time"], vec![vec!["a".into(), 1.0.into()]]);
    let summary = summarize(&dataset, &["class"], &["time"], &[Reducer::Min], None).unwrap();
    let err = summary.exclude("solver", &Value::text("a")).unwrap_err();
    assert_eq!(err, AggregateError::UnknownColumn("solver".to_string()));
}
