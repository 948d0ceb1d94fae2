// crates/benchfit-core/src/runtime/series.rs
// ============================================================================
// Module: Benchfit Presentation Series
// Description: Labelled point series for scatter plots and fitted curves.
// Purpose: Hand renderers ready-made panels instead of raw datasets.
// Dependencies: crate::{core, interfaces, runtime::fitter}, serde
// ============================================================================

//! ## Overview
//! [`build_panels`] splits a dataset into panels (one per panel key), and
//! inside each panel emits one scatter series per category, one dotted
//! fitted curve per category with a curve, and an optional horizontal
//! reference line. Colors and markers come from a [`Palette`] indexed by the
//! category's position among all categories, so a category keeps its color
//! across panels. Axis ranges are padded the same way for every panel.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::core::CurveKey;
use crate::core::Dataset;
use crate::core::DatasetError;
use crate::core::GroupKey;
use crate::core::Value;
use crate::interfaces::SeriesSink;
use crate::interfaces::SinkError;
use crate::runtime::fitter::FittedCurve;
use crate::runtime::fitter::Sampling;
use crate::runtime::fitter::SamplingScale;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default series colors.
pub const DEFAULT_COLORS: [&str; 6] =
    ["#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b"];

/// Default scatter markers.
pub const DEFAULT_MARKERS: [&str; 6] =
    ["circle", "diamond", "triangle", "square", "inverted_triangle", "hex"];

/// Default number of samples per fitted curve.
pub const DEFAULT_SAMPLE_COUNT: usize = 100;

/// Fraction of the y span added below the data.
const Y_PAD_BELOW: f64 = 0.25;

/// Fraction of the y span added above the data.
const Y_PAD_ABOVE: f64 = 0.1;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Color and marker cycle assigned to categories.
///
/// # Invariants
/// - Both lists are non-empty when used for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    /// Colors, cycled by category index.
    pub colors: Vec<String>,
    /// Markers, cycled by category index.
    pub markers: Vec<String>,
}

impl Palette {
    /// Returns the color of the category at `index`.
    #[must_use]
    pub fn color(&self, index: usize) -> &str {
        cycle(&self.colors, index)
    }

    /// Returns the marker of the category at `index`.
    #[must_use]
    pub fn marker(&self, index: usize) -> &str {
        cycle(&self.markers, index)
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: DEFAULT_COLORS.iter().map(ToString::to_string).collect(),
            markers: DEFAULT_MARKERS.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Picks an entry cyclically; empty lists yield an empty string.
fn cycle(items: &[String], index: usize) -> &str {
    if items.is_empty() { "" } else { &items[index % items.len()] }
}

/// Kind of a point series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesKind {
    /// Measured points.
    Scatter,
    /// Sampled fitted curve, drawn dotted.
    Curve,
    /// Horizontal reference line.
    Reference,
}

impl SeriesKind {
    /// Returns the stable identifier used in exports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scatter => "scatter",
            Self::Curve => "curve",
            Self::Reference => "reference",
        }
    }
}

/// Labelled sequence of points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointSeries {
    /// Legend label.
    pub label: String,
    /// Series kind.
    pub kind: SeriesKind,
    /// Color.
    pub color: String,
    /// Marker; scatter series only.
    pub marker: Option<String>,
    /// Points in drawing order.
    pub points: Vec<(f64, f64)>,
}

/// Closed axis range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    /// Lower edge.
    pub min: f64,
    /// Upper edge.
    pub max: f64,
}

/// One chart panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Panel {
    /// Panel title.
    pub title: String,
    /// Panel key values.
    pub key: GroupKey,
    /// X axis label.
    pub x_label: String,
    /// Y axis label.
    pub y_label: String,
    /// Padded x range; `None` when the panel has no positive x values.
    pub x_range: Option<AxisRange>,
    /// Padded y range; `None` when the panel has no points.
    pub y_range: Option<AxisRange>,
    /// Series in drawing order.
    pub series: Vec<PointSeries>,
}

/// Panel layout request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelSpec {
    /// Columns whose values split the dataset into panels.
    pub panel_keys: Vec<String>,
    /// Column whose values become series within a panel.
    pub category: String,
    /// X column.
    pub axis: String,
    /// Y column.
    pub metric: String,
    /// Lower x bound for curve sampling.
    pub curve_min: f64,
    /// Curve sampling scale.
    pub scale: SamplingScale,
    /// Samples per curve.
    pub samples: usize,
    /// Y value of a horizontal reference line, if any.
    pub reference: Option<f64>,
    /// Category colors and markers.
    pub palette: Palette,
}

// ============================================================================
// SECTION: Axis Padding
// ============================================================================

/// Pads a y span by a quarter below and a tenth above.
#[must_use]
pub fn pad_y(min: f64, max: f64) -> AxisRange {
    let span = max - min;
    AxisRange {
        min: min - span * Y_PAD_BELOW,
        max: max + span * Y_PAD_ABOVE,
    }
}

/// Pads a positive x span geometrically around its midpoint.
///
/// With `gap = sqrt(max / min)` and `mid = sqrt(min * max)` the range is
/// `[mid / (2 gap), mid * 4 gap]`, i.e. `[min / 2, 4 max]`. Returns `None`
/// for a non-positive `min`.
#[must_use]
pub fn pad_x(min: f64, max: f64) -> Option<AxisRange> {
    if !(min > 0.0 && max >= min) {
        return None;
    }
    let gap = (max / min).sqrt();
    let mid = (min * max).sqrt();
    Some(AxisRange {
        min: mid / (gap * 2.0),
        max: mid * (gap * 4.0),
    })
}

// ============================================================================
// SECTION: Panel Building
// ============================================================================

/// Builds one panel per distinct panel key.
///
/// A curve is attached to a category when `curves` holds the key
/// `(metric, panel key values ++ [category value])`, which is what a fit
/// grouped by `panel_keys` then `category` produces.
///
/// # Errors
///
/// Returns [`DatasetError::UnknownColumn`] when a referenced column is absent.
pub fn build_panels(
    dataset: &Dataset,
    spec: &PanelSpec,
    curves: &BTreeMap<CurveKey, FittedCurve>,
) -> Result<Vec<Panel>, DatasetError> {
    let axis_at = dataset.require_column(&spec.axis)?;
    let metric_at = dataset.require_column(&spec.metric)?;
    let category_at = dataset.require_column(&spec.category)?;
    let categories = dataset
        .column(&spec.category)?
        .filter(|value| !value.is_null())
        .cloned()
        .collect::<BTreeSet<Value>>()
        .into_iter()
        .collect::<Vec<_>>();
    let keys = spec.panel_keys.iter().map(String::as_str).collect::<Vec<_>>();

    let mut panels = Vec::new();
    for (key, rows) in dataset.partition(&keys)? {
        let mut by_category: BTreeMap<usize, Vec<(f64, f64)>> = BTreeMap::new();
        for values in rows.row_slices() {
            let (Some(x), Some(y)) = (values[axis_at].as_f64(), values[metric_at].as_f64()) else {
                continue;
            };
            if !(x.is_finite() && y.is_finite()) {
                continue;
            }
            if let Some(index) = categories.iter().position(|value| value == &values[category_at])
            {
                by_category.entry(index).or_default().push((x, y));
            }
        }
        let all = by_category.values().flatten().copied().collect::<Vec<_>>();
        let x_bounds = bounds(all.iter().map(|(x, _)| *x));
        let y_bounds = bounds(all.iter().map(|(_, y)| *y));

        let mut series = Vec::new();
        for (index, points) in &by_category {
            series.push(PointSeries {
                label: categories[*index].to_string(),
                kind: SeriesKind::Scatter,
                color: spec.palette.color(*index).to_string(),
                marker: Some(spec.palette.marker(*index).to_string()),
                points: points.clone(),
            });
        }
        let curve_start = x_bounds.map(|(min, max)| (min.max(spec.curve_min), max));
        if let Some((start, end)) = curve_start.filter(|(start, end)| start <= end) {
            for (index, category) in categories.iter().enumerate() {
                let mut group = key.values().to_vec();
                group.push(category.clone());
                let Some(curve) = curves.get(&CurveKey::new(&spec.metric, GroupKey::new(group)))
                else {
                    continue;
                };
                let sampling = Sampling::new(spec.scale, start, end, spec.samples);
                series.push(PointSeries {
                    label: category.to_string(),
                    kind: SeriesKind::Curve,
                    color: spec.palette.color(index).to_string(),
                    marker: None,
                    points: curve.sample(&sampling),
                });
            }
        }
        let x_range = x_bounds.and_then(|(min, max)| pad_x(min, max));
        if let (Some(level), Some(range)) = (spec.reference, x_range) {
            series.push(PointSeries {
                label: format!("{} = {level}", spec.metric),
                kind: SeriesKind::Reference,
                color: "black".to_string(),
                marker: None,
                points: vec![(range.min, level), (range.max, level)],
            });
        }
        panels.push(Panel {
            title: panel_title(&key),
            key,
            x_label: spec.axis.clone(),
            y_label: spec.metric.clone(),
            x_range,
            y_range: y_bounds.map(|(min, max)| pad_y(min, max)),
            series,
        });
    }
    Ok(panels)
}

/// Returns the smallest and largest value, or `None` for no values.
fn bounds(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, value| match acc {
        None => Some((value, value)),
        Some((min, max)) => Some((f64::min(min, value), f64::max(max, value))),
    })
}

/// Renders a panel key as a title.
fn panel_title(key: &GroupKey) -> String {
    if key.is_empty() {
        return "all".to_string();
    }
    key.values().iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// Sends every panel to a sink in order.
///
/// # Errors
///
/// Returns the first [`SinkError`] reported by the sink.
pub fn emit_panels<S: SeriesSink + ?Sized>(panels: &[Panel], sink: &mut S) -> Result<(), SinkError> {
    panels.iter().try_for_each(|panel| sink.emit_panel(panel))
}
