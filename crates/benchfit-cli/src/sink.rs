// crates/benchfit-cli/src/sink.rs
// ============================================================================
// Module: CSV Series Sink
// Description: Flat CSV export of presentation panels.
// Purpose: Hand panels to external plotting tools as one long table.
// Dependencies: benchfit-core, csv
// ============================================================================

//! ## Overview
//! Each point of each series becomes one row. Reference lines and curves
//! carry an empty marker.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;

use benchfit_core::Panel;
use benchfit_core::SeriesSink;
use benchfit_core::SinkError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Output header.
pub const SERIES_HEADER: [&str; 8] = ["panel", "metric", "series", "kind", "x", "y", "color", "marker"];

// ============================================================================
// SECTION: Sink
// ============================================================================

/// Series sink writing long-form CSV.
pub struct CsvSeriesSink<W: Write> {
    /// Underlying CSV writer.
    writer: csv::Writer<W>,
}

impl<W: Write> CsvSeriesSink<W> {
    /// Creates a sink and writes the header row.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Write`] when the header cannot be written.
    pub fn new(writer: W) -> Result<Self, SinkError> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(SERIES_HEADER).map_err(write_error)?;
        Ok(Self {
            writer,
        })
    }

    /// Flushes buffered rows and returns the inner writer.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Write`] when flushing fails.
    pub fn finish(self) -> Result<W, SinkError> {
        self.writer.into_inner().map_err(|err| SinkError::Write(err.error().to_string()))
    }
}

impl<W: Write> SeriesSink for CsvSeriesSink<W> {
    fn emit_panel(&mut self, panel: &Panel) -> Result<(), SinkError> {
        for series in &panel.series {
            let marker = series.marker.as_deref().unwrap_or_default();
            for (x, y) in &series.points {
                let (x, y) = (x.to_string(), y.to_string());
                self.writer
                    .write_record([
                        panel.title.as_str(),
                        panel.y_label.as_str(),
                        series.label.as_str(),
                        series.kind.as_str(),
                        x.as_str(),
                        y.as_str(),
                        series.color.as_str(),
                        marker,
                    ])
                    .map_err(write_error)?;
            }
        }
        Ok(())
    }
}

/// Maps a CSV failure onto the sink error.
fn write_error(err: csv::Error) -> SinkError {
    SinkError::Write(err.to_string())
}
