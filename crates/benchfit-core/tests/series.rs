// crates/benchfit-core/tests/series.rs
// ============================================================================
// Module: Presentation Series Tests
// Description: Panel layout, category colors, fitted curves and sinks.
// Purpose: Pin what renderers receive for a fitted benchmark dataset.
// ============================================================================

//! Presentation series integration tests.

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

use benchfit_core::Dataset;
use benchfit_core::DatasetError;
use benchfit_core::FitOptions;
use benchfit_core::FitSpec;
use benchfit_core::ModelFamily;
use benchfit_core::Palette;
use benchfit_core::Panel;
use benchfit_core::PanelSpec;
use benchfit_core::SamplingScale;
use benchfit_core::SeriesSink;
use benchfit_core::SinkError;
use benchfit_core::Value;
use benchfit_core::build_panels;
use benchfit_core::fields;
use benchfit_core::fit_groups;
use benchfit_core::runtime::SeriesKind;
use benchfit_core::runtime::emit_panels;
use benchfit_core::runtime::series::pad_x;
use benchfit_core::runtime::series::pad_y;

const METRIC: &str = fields::TIME_PER_ARC_PER_ITER;

fn measurements() -> Dataset {
    let mut rows = Vec::new();
    for (class, solver, scale) in [("grid", "a", 1.0), ("grid", "b", 2.0), ("netgen", "b", 3.0)] {
        for x in [1e3, 1e4, 1e5] {
            let y = scale * ModelFamily::PowerLog.evaluate(&[1e-3, 0.3, 0.5], x);
            rows.push(vec![
                Value::text(class),
                Value::text(solver),
                Value::Float(x),
                Value::Int(10),
                Value::Float(y),
            ]);
        }
    }
    let columns = [fields::PROBLEM_CLASS, fields::SOLVER, fields::ARCS, fields::ITERATIONS, METRIC]
        .iter()
        .map(ToString::to_string)
        .collect();
    Dataset::from_rows(columns, rows).unwrap()
}

fn panel_spec() -> PanelSpec {
    PanelSpec {
        panel_keys: vec![fields::PROBLEM_CLASS.to_string()],
        category: fields::SOLVER.to_string(),
        axis: fields::ARCS.to_string(),
        metric: METRIC.to_string(),
        curve_min: 1e3,
        scale: SamplingScale::Geometric,
        samples: 10,
        reference: Some(1.0),
        palette: Palette::default(),
    }
}

fn panels() -> Vec<Panel> {
    let dataset = measurements();
    let spec = FitSpec::new(fields::ARCS, METRIC, ModelFamily::PowerLog)
        .grouped_by(&[fields::PROBLEM_CLASS, fields::SOLVER]);
    let report = fit_groups(&dataset, &spec, &FitOptions::default()).unwrap();
    assert_eq!(report.curves.len(), 3);
    build_panels(&dataset, &panel_spec(), &report.curves).unwrap()
}

/// Sink that keeps every panel it receives.
#[derive(Default)]
struct CollectingSink {
    /// Received panel titles.
    titles: Vec<String>,
}

impl SeriesSink for CollectingSink {
    fn emit_panel(&mut self, panel: &Panel) -> Result<(), SinkError> {
        self.titles.push(panel.title.clone());
        Ok(())
    }
}

/// Sink that rejects every panel.
struct FailingSink;

impl SeriesSink for FailingSink {
    fn emit_panel(&mut self, panel: &Panel) -> Result<(), SinkError> {
        Err(SinkError::Write(format!("cannot draw {}", panel.title)))
    }
}

#[test]
fn one_panel_per_key_with_scatter_curve_and_reference() {
    let panels = panels();
    let titles = panels.iter().map(|panel| panel.title.as_str()).collect::<Vec<_>>();
    assert_eq!(titles, vec!["grid", "netgen"]);

    let kinds = panels[0].series.iter().map(|series| series.kind).collect::<Vec<_>>();
    assert_eq!(
        kinds,
        vec![
            SeriesKind::Scatter,
            SeriesKind::Scatter,
            SeriesKind::Curve,
            SeriesKind::Curve,
            SeriesKind::Reference,
        ]
    );
    assert_eq!(panels[1].series.len(), 3);
    assert_eq!(panels[0].x_label, fields::ARCS);
    assert_eq!(panels[0].y_label, METRIC);
}

#[test]
fn category_keeps_its_color_across_panels() {
    let panels = panels();
    let palette = Palette::default();
    let netgen_scatter = &panels[1].series[0];
    assert_eq!(netgen_scatter.label, "b");
    assert_eq!(netgen_scatter.color, palette.color(1));
    assert_eq!(netgen_scatter.marker.as_deref(), Some(palette.marker(1)));
    let grid_b = panels[0].series.iter().find(|series| series.label == "b").unwrap();
    assert_eq!(grid_b.color, netgen_scatter.color);
}

#[test]
fn curves_span_the_observed_range_and_reference_spans_the_axis() {
    let panels = panels();
    let curve = panels[0].series.iter().find(|series| series.kind == SeriesKind::Curve).unwrap();
    assert_eq!(curve.points.len(), 10);
    assert_eq!(curve.points[0].0, 1e3);
    assert_eq!(curve.points[9].0, 1e5);
    assert!(curve.marker.is_none());

    let x_range = panels[0].x_range.unwrap();
    assert_eq!((x_range.min, x_range.max), (500.0, 4e5));
    let reference = panels[0].series.last().unwrap();
    assert_eq!(reference.points, vec![(500.0, 1.0), (4e5, 1.0)]);
    assert_eq!(reference.color, "black");
}

#[test]
fn axis_padding() {
    let y = pad_y(0.0, 10.0);
    assert_eq!((y.min, y.max), (-2.5, 11.0));
    assert!(pad_x(0.0, 10.0).is_none());
    let x = pad_x(2.0, 2.0).unwrap();
    assert_eq!((x.min, x.max), (1.0, 8.0));
}

#[test]
fn panels_without_curves_hold_scatter_only() {
    let dataset = measurements();
    let mut spec = panel_spec();
    spec.panel_keys.clear();
    spec.reference = None;
    let panels = build_panels(&dataset, &spec, &std::collections::BTreeMap::new()).unwrap();
    assert_eq!(panels.len(), 1);
    assert_eq!(panels[0].title, "all");
    assert!(panels[0].series.iter().all(|series| series.kind == SeriesKind::Scatter));
    assert_eq!(panels[0].series.len(), 2);
}

#[test]
fn unknown_axis_is_reported() {
    let mut spec = panel_spec();
    spec.axis = "nodes".to_string();
    let err = build_panels(&measurements(), &spec, &std::collections::BTreeMap::new()).unwrap_err();
    assert_eq!(err, DatasetError::UnknownColumn("nodes".to_string()));
}

#[test]
fn sinks_receive_panels_in_order_and_stop_on_error() {
    let panels = panels();
    let mut sink = CollectingSink::default();
    emit_panels(&panels, &mut sink).unwrap();
    assert_eq!(sink.titles, vec!["grid".to_string(), "netgen".to_string()]);

    let err = emit_panels(&panels, &mut FailingSink).unwrap_err();
    assert_eq!(err.to_string(), "series sink error: cannot draw grid");
}
