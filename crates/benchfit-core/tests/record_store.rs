// crates/benchfit-core/tests/record_store.rs
// ============================================================================
// Module: Record Store Tests
// Description: Loading, normalization, filtering and derivation of benchmark logs.
// Purpose: Pin alias resolution, fatal load errors and immutable transforms.
// ============================================================================

//! Record store integration tests.

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
    reason = "Test-only assertions and helpers are permitted."
)]

use benchfit_core::Dataset;
use benchfit_core::DerivationError;
use benchfit_core::DeriveExpr;
use benchfit_core::FilterSet;
use benchfit_core::InMemorySource;
use benchfit_core::LoadError;
use benchfit_core::Predicate;
use benchfit_core::SchemaAliases;
use benchfit_core::Value;
use benchfit_core::Warning;
use benchfit_core::fields;

const CANONICAL_LOG: &str = "\
name,problem_class,solver,is_baseline,vertices,arcs,iterations,time_seconds,time_per_arc_per_iter
r1,netgen_8,tulip_approxchol,true,10,90,10,1.5,0.001
r1,netgen_8,tulip_cmg,true,10,90,20,3.0,0.002
r2,grid_long,tulip_approxchol,true,20,180,250,4.0,
";

const HISTORICAL_LOG: &str = "\
probclass,name,iters,solver,baseline,arcs,vertices,time_s,time_s_per_arc_per_iter
netgen_8,r1,10,tulip_approxchol,true,90,10,1.5,0.001
netgen_8,r1,20,tulip_cmg,true,90,10,3.0,0.002
grid_long,r2,250,tulip_approxchol,true,180,20,4.0,
";

fn load(text: &str) -> Dataset {
    Dataset::from_csv_reader(text.as_bytes()).expect("log loads")
}

#[test]
fn historical_and_canonical_headers_normalize_identically() {
    let canonical = load(CANONICAL_LOG);
    let historical = load(HISTORICAL_LOG);
    assert_eq!(canonical, historical);
    assert_eq!(canonical.records().unwrap(), historical.records().unwrap());
}

#[test]
fn labels_alias_resolves_problem_class() {
    let dataset = load("labels,name,solver,vertices,arcs,iters\nnetgen_sr,r9,tulip_hypre,1,2,3\n");
    let row = dataset.row(0).unwrap();
    assert_eq!(row.get(fields::PROBLEM_CLASS), Some(&Value::text("netgen_sr")));
    assert_eq!(row.get(fields::IS_BASELINE), None);
}

#[test]
fn missing_required_field_is_malformed_log() {
    let err = Dataset::from_csv_reader("name,probclass,solver,vertices,arcs\nr1,c,s,1,2\n".as_bytes())
        .unwrap_err();
    match &err {
        LoadError::MalformedLog {
            field,
            aliases,
        } => {
            assert_eq!(field, fields::ITERATIONS);
            assert!(aliases.iter().any(|alias| alias == "iters"));
        }
        other => panic!("unexpected error: {other}"),
    }
    let message = err.to_string();
    assert!(message.contains("iterations"), "{message}");
    assert!(message.contains("iters"), "{message}");
}

#[test]
fn negative_size_is_rejected_with_record_number() {
    let err = Dataset::from_csv_reader(
        "name,probclass,solver,vertices,arcs,iters\nr1,c,s,1,2,3\nr2,c,s,1,-2,3\n".as_bytes(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        LoadError::Invariant { record: 2, ref column } if column == fields::ARCS
    ));
}

#[test]
fn non_integer_count_is_rejected() {
    let err = Dataset::from_csv_reader(
        "name,probclass,solver,vertices,arcs,iters\nr1,c,s,1,many,3\n".as_bytes(),
    )
    .unwrap_err();
    assert!(matches!(err, LoadError::InvalidCell { record: 1, .. }));
}

#[test]
fn older_log_spellings_of_counts_and_flags_normalize() {
    let dataset = load(
        "name,probclass,solver,baseline,vertices,arcs,iters\nr1,c,s,1,10.0,1000.0,3\nr2,c,s,0,10,90,4\n",
    );
    let first = dataset.row(0).unwrap();
    assert_eq!(first.get(fields::ARCS), Some(&Value::Int(1000)));
    assert_eq!(first.get(fields::VERTICES).and_then(Value::as_i64), Some(10));
    assert_eq!(first.get(fields::IS_BASELINE), Some(&Value::Bool(true)));
    assert_eq!(dataset.row(1).unwrap().get(fields::IS_BASELINE), Some(&Value::Bool(false)));
}

#[test]
fn fractional_count_and_numeric_flag_above_one_are_rejected() {
    let err = Dataset::from_csv_reader(
        "name,probclass,solver,vertices,arcs,iters\nr1,c,s,1,2.5,3\n".as_bytes(),
    )
    .unwrap_err();
    assert!(matches!(err, LoadError::InvalidCell { record: 1, ref column, .. } if column == fields::ARCS));
    let err = Dataset::from_csv_reader(
        "name,probclass,solver,baseline,vertices,arcs,iters\nr1,c,s,2,1,2,3\n".as_bytes(),
    )
    .unwrap_err();
    assert!(matches!(err, LoadError::InvalidCell { record: 1, .. }));
}

#[test]
fn zero_signs_and_large_integers_order_consistently() {
    assert_eq!(Value::Float(-0.0), Value::Int(0));
    assert_eq!(Value::Float(-0.0), Value::Float(0.0));
    assert_eq!(Value::Int(2), Value::Float(2.0));
    assert!(Value::Int(2) < Value::Float(2.5));
    assert!(Value::Float(-2.5) < Value::Int(-2));

    let big = 1_i64 << 53;
    let float = Value::Float(9_007_199_254_740_992.0);
    assert_eq!(Value::Int(big), float);
    assert_ne!(Value::Int(big + 1), float);
    assert!(Value::Int(big + 1) > float);
    assert!(Value::Int(i64::MAX) < Value::Float(1e19));
    assert!(Value::Int(i64::MIN) > Value::Float(-1e19));
}

#[test]
fn first_alias_wins_and_shadowed_column_is_dropped() {
    let dataset = load(
        "name,probclass,problem_class,solver,vertices,arcs,iters\nr1,old,new,s,1,2,3\n",
    );
    assert_eq!(dataset.row(0).unwrap().get(fields::PROBLEM_CLASS), Some(&Value::text("new")));
    assert!(!dataset.has_column("probclass"));
}

#[test]
fn unknown_columns_pass_through_with_inferred_types() {
    let dataset = load("name,probclass,solver,vertices,arcs,iters,seed,note\nr1,c,s,1,2,3,42,fast\n");
    let row = dataset.row(0).unwrap();
    assert_eq!(row.get("seed"), Some(&Value::Int(42)));
    assert_eq!(row.get("note"), Some(&Value::text("fast")));
}

#[test]
fn custom_alias_table_is_honoured() {
    let aliases = SchemaAliases::standard();
    let mut source = InMemorySource::new(
        &["name", "labels", "solver", "vertices", "arcs", "iterations"],
        &[&["r1", "grid_wide", "tulip_cmg", "4", "8", "12"]],
    );
    let dataset = Dataset::load(&mut source, &aliases).unwrap();
    assert_eq!(dataset.len(), 1);
    let record = &dataset.records().unwrap()[0];
    assert_eq!(record.graph_size(), 12);
    assert!(record.is_converged(200));
}

#[test]
fn filter_keeps_matching_rows_and_leaves_input_untouched() {
    let dataset = load(CANONICAL_LOG);
    let filters = FilterSet::new()
        .solvers(["tulip_approxchol"])
        .range(fields::ITERATIONS, None, Some(200.0));
    let filtered = dataset.filter(&filters);
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered.row(0).unwrap().get(fields::NAME), Some(&Value::text("r1")));
    assert_eq!(dataset.len(), 3);
}

#[test]
fn range_maximum_is_exclusive() {
    let dataset = load(CANONICAL_LOG);
    let filtered = dataset.filter(&FilterSet::new().range(fields::ITERATIONS, Some(10.0), Some(20.0)));
    assert_eq!(filtered.len(), 1);
}

#[test]
fn predicate_on_missing_column_matches_nothing() {
    let dataset = load(CANONICAL_LOG);
    let filtered = dataset.filter(&FilterSet::new().not_null("no_such_column"));
    assert!(filtered.is_empty());
    assert_eq!(filtered.columns(), dataset.columns());
}

#[test]
fn null_cells_fail_membership_and_not_null() {
    let dataset = load(CANONICAL_LOG);
    let filters = FilterSet::from(vec![Predicate::NotNull {
        column: fields::TIME_PER_ARC_PER_ITER.to_string(),
    }]);
    assert_eq!(dataset.filter(&filters).len(), 2);
    let baseline_only = dataset.filter(&FilterSet::new().baseline_only());
    assert_eq!(baseline_only.len(), 3);
}

#[test]
fn derive_adds_size_microseconds_and_parameter_label() {
    let dataset = load(
        "name,probclass,solver,vertices,arcs,iters,time_s_per_arc_per_iter,epcg,rhop,rhod,floatbits\n\
         r1,c,s,10,90,5,0.000002,1e-6,1e-8,1e-8,64\n\
         r2,c,s,20,80,6,,1e-4,1e-8,1e-8,32\n",
    );
    let derived = dataset
        .derive(&[
            DeriveExpr::sum(fields::GRAPH_SIZE, &[fields::VERTICES, fields::ARCS]),
            DeriveExpr::scale("time_us_per_arc_per_iter", fields::TIME_PER_ARC_PER_ITER, 1e6),
            DeriveExpr::concat(
                "params",
                &[fields::CG_TOLERANCE, fields::PRIMAL_TOLERANCE, fields::DUAL_TOLERANCE, fields::FLOAT_BITS],
                ",",
            ),
        ])
        .unwrap();
    let first = derived.row(0).unwrap();
    assert_eq!(first.get(fields::GRAPH_SIZE), Some(&Value::Int(100)));
    let micros = first.get("time_us_per_arc_per_iter").and_then(Value::as_f64).unwrap();
    assert!((micros - 2.0).abs() < 1e-9);
    assert_eq!(first.get("params"), Some(&Value::text("1e-6,1e-8,1e-8,64")));
    let second = derived.row(1).unwrap();
    assert_eq!(second.get("time_us_per_arc_per_iter"), Some(&Value::Null));
    assert_eq!(derived.columns().len(), dataset.columns().len() + 3);
    assert!(!dataset.has_column(fields::GRAPH_SIZE));
}

#[test]
fn derive_fails_on_missing_input_and_collision() {
    let dataset = load(CANONICAL_LOG);
    let missing = dataset.derive(&[DeriveExpr::scale("x", "absent", 2.0)]).unwrap_err();
    assert_eq!(
        missing,
        DerivationError::MissingInput {
            output: "x".to_string(),
            column: "absent".to_string(),
        }
    );
    let collision = dataset.derive(&[DeriveExpr::sum(fields::ARCS, &[fields::VERTICES])]).unwrap_err();
    assert_eq!(collision, DerivationError::DuplicateColumn(fields::ARCS.to_string()));
}

#[test]
fn lenient_derivation_skips_only_the_failed_expression() {
    let dataset = load(CANONICAL_LOG);
    let (derived, warnings) = dataset.derive_lenient(&[
        DeriveExpr::scale("broken", "absent", 2.0),
        DeriveExpr::sum(fields::GRAPH_SIZE, &[fields::VERTICES, fields::ARCS]),
    ]);
    assert!(derived.has_column(fields::GRAPH_SIZE));
    assert!(!derived.has_column("broken"));
    assert_eq!(warnings.len(), 1);
    assert!(matches!(&warnings[0], Warning::DerivationSkipped { column, .. } if column == "broken"));
}

#[test]
fn select_and_partition_follow_requested_keys() {
    let dataset = load(CANONICAL_LOG);
    let narrow = dataset.select(&[fields::SOLVER, fields::NAME]).unwrap();
    assert_eq!(narrow.columns(), [fields::SOLVER.to_string(), fields::NAME.to_string()]);
    let groups = dataset.partition(&[fields::PROBLEM_CLASS]).unwrap();
    let sizes = groups.values().map(Dataset::len).collect::<Vec<_>>();
    assert_eq!(sizes, vec![1, 2]);
}
