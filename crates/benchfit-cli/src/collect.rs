// crates/benchfit-cli/src/collect.rs
// ============================================================================
// Module: Run Log Collection
// Description: Extraction of network-simplex wall times from solver run logs.
// Purpose: Turn a directory of raw `*.min.run` logs into a timing CSV.
// Dependencies: csv, thiserror, tracing
// ============================================================================

//! ## Overview
//! A run log is kept only when it reports a feasible flow. Its timing is the
//! `real:` wall time printed on the network-simplex phase line, carried as the
//! original text so the output repeats what the solver printed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io::Write;
use std::path::Path;

use thiserror::Error;
use tracing::debug;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// File suffix of collected run logs.
pub const RUN_LOG_SUFFIX: &str = ".min.run";

/// Marker of a run that found a feasible flow.
const FEASIBLE_MARKER: &str = "Feasible flow: found";

/// Marker of the network-simplex phase line.
const PHASE_MARKER: &str = "Run NetworkSimplex:";

/// Prefix of the wall time on the phase line.
const WALL_TIME_PREFIX: &str = "real: ";

/// Output header.
const HEADER: [&str; 2] = ["name", "time_s"];

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Run log collection failures.
#[derive(Debug, Error)]
pub enum CollectError {
    /// Directory or file access failed.
    #[error("run log io error: {0}")]
    Io(String),
    /// A feasible run has no network-simplex phase line.
    #[error("run log `{0}` has no `Run NetworkSimplex:` line")]
    MissingPhase(String),
    /// The phase line carries no parseable wall time.
    #[error("run log `{name}` has an unreadable wall time `{raw}`")]
    InvalidTime {
        /// Run name.
        name: String,
        /// Text found after `real: `.
        raw: String,
    },
    /// Writing the timing table failed.
    #[error("timing output error: {0}")]
    Output(String),
}

impl From<csv::Error> for CollectError {
    fn from(err: csv::Error) -> Self {
        Self::Output(err.to_string())
    }
}

// ============================================================================
// SECTION: Types
// ============================================================================

/// Wall time of one feasible run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunTiming {
    /// File name without the run log suffix.
    pub name: String,
    /// Wall time in seconds, as printed.
    pub time_s: String,
}

// ============================================================================
// SECTION: Parsing
// ============================================================================

/// Extracts the network-simplex wall time from one run log.
///
/// Returns `Ok(None)` when the run did not find a feasible flow.
///
/// # Errors
///
/// Returns [`CollectError`] when a feasible run lacks a readable wall time.
pub fn parse_run_log(name: &str, text: &str) -> Result<Option<RunTiming>, CollectError> {
    if !text.contains(FEASIBLE_MARKER) {
        return Ok(None);
    }
    let line = text
        .lines()
        .find(|line| line.contains(PHASE_MARKER))
        .ok_or_else(|| CollectError::MissingPhase(name.to_string()))?;
    let raw = line
        .split_once(WALL_TIME_PREFIX)
        .map(|(_, rest)| rest.split('s').next().unwrap_or_default().trim())
        .unwrap_or_default();
    if !raw.parse::<f64>().is_ok_and(f64::is_finite) {
        return Err(CollectError::InvalidTime {
            name: name.to_string(),
            raw: raw.to_string(),
        });
    }
    Ok(Some(RunTiming {
        name: name.to_string(),
        time_s: raw.to_string(),
    }))
}

/// Returns the run name of a log file, or `None` for other files.
fn run_name(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    file_name.strip_suffix(RUN_LOG_SUFFIX).filter(|name| !name.is_empty()).map(ToString::to_string)
}

// ============================================================================
// SECTION: Collection
// ============================================================================

/// Collects the timings of every feasible run log in `dir`, sorted by name.
///
/// # Errors
///
/// Returns [`CollectError`] when the directory or a log cannot be read, or a
/// feasible log lacks its wall time.
pub fn collect_runs(dir: &Path) -> Result<Vec<RunTiming>, CollectError> {
    let entries =
        fs::read_dir(dir).map_err(|err| CollectError::Io(format!("{}: {err}", dir.display())))?;
    let mut timings = Vec::new();
    let mut skipped = 0_usize;
    for entry in entries {
        let path = entry.map_err(|err| CollectError::Io(err.to_string()))?.path();
        let Some(name) = run_name(&path) else {
            continue;
        };
        if !path.is_file() {
            continue;
        }
        let text = fs::read_to_string(&path)
            .map_err(|err| CollectError::Io(format!("{}: {err}", path.display())))?;
        match parse_run_log(&name, &text)? {
            Some(timing) => timings.push(timing),
            None => skipped += 1,
        }
    }
    timings.sort_by(|left, right| left.name.cmp(&right.name));
    debug!(runs = timings.len(), infeasible = skipped, "collected run logs");
    Ok(timings)
}

/// Writes timings as a `name,time_s` CSV.
///
/// # Errors
///
/// Returns [`CollectError::Output`] when the writer fails.
pub fn write_timings<W: Write>(timings: &[RunTiming], writer: W) -> Result<(), CollectError> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(HEADER)?;
    for timing in timings {
        out.write_record([timing.name.as_str(), timing.time_s.as_str()])?;
    }
    out.flush().map_err(|err| CollectError::Output(err.to_string()))
}
