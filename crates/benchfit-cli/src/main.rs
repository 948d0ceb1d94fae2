// crates/benchfit-cli/src/main.rs
// ============================================================================
// Module: Benchfit CLI Entry Point
// Description: Command dispatcher for benchmark ratio, fit and series tasks.
// Purpose: Run config-driven analyses over a benchmark log from the shell.
// Dependencies: benchfit-config, benchfit-core, clap, thiserror, tracing, tracing-subscriber.
// ============================================================================

//! ## Overview
//! The benchfit CLI loads a benchmark log and an optional TOML configuration,
//! runs one analysis and writes its table as CSV to stdout or a file.
//! Diagnostics go to stderr through `tracing`, so stdout stays a clean data
//! stream. Inputs are untrusted: file reads are size-bounded and config
//! validation fails closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod collect;
mod pipeline;
mod sink;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use benchfit_config::BenchfitConfig;
use benchfit_config::config_toml_example;
use benchfit_core::Dataset;
use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

use crate::collect::collect_runs;
use crate::collect::write_timings;
use crate::pipeline::PipelineError;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum size of a benchmark log read by the CLI.
const MAX_LOG_BYTES: usize = 256 * 1024 * 1024;

/// Log filter used when `RUST_LOG` is unset and no verbosity flag is given.
const DEFAULT_LOG_FILTER: &str = "warn";

/// Output path meaning stdout.
const STDOUT_PATH: &str = "-";

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "benchfit", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Raise log verbosity (-v info, -vv debug, -vvv trace); overrides `RUST_LOG`.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Summarize per-solver ratios against the baseline configuration.
    Ratios(AnalysisCommand),
    /// Summarize raw metrics per group.
    Stats(AnalysisCommand),
    /// Fit scaling-law curves per group and print their parameters.
    Fit(AnalysisCommand),
    /// Export presentation series (scatter, fitted curves, reference lines).
    Series(AnalysisCommand),
    /// Collect network-simplex wall times from solver run logs.
    Collect(CollectCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a benchfit configuration file.
    Validate(ConfigValidateCommand),
    /// Print an example configuration with every default spelled out.
    Example,
}

/// Arguments shared by the analysis commands.
#[derive(Args, Debug)]
struct AnalysisCommand {
    /// Benchmark log CSV.
    #[arg(long, value_name = "PATH")]
    log: PathBuf,
    /// Optional config file path (defaults to benchfit.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Output CSV path; `-` or absent writes to stdout.
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
}

/// Arguments for run log collection.
#[derive(Args, Debug)]
struct CollectCommand {
    /// Directory holding `*.min.run` logs.
    #[arg(long, value_name = "DIR")]
    dir: PathBuf,
    /// Output CSV path; `-` or absent writes to stdout.
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
}

/// Arguments for config validation.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Optional config file path (defaults to benchfit.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

impl From<PipelineError> for CliError {
    fn from(err: PipelineError) -> Self {
        Self::new(err.to_string())
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&format!("benchfit {version}"))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Ratios(command) => command_ratios(&command),
        Commands::Stats(command) => command_stats(&command),
        Commands::Fit(command) => command_fit(&command),
        Commands::Series(command) => command_series(&command),
        Commands::Collect(command) => command_collect(&command),
        Commands::Config {
            command,
        } => command_config(command),
    }
}

/// Returns the log filter directive for a verbosity count.
const fn log_filter(verbose: u8) -> Option<&'static str> {
    match verbose {
        0 => None,
        1 => Some("info"),
        2 => Some("debug"),
        _ => Some("trace"),
    }
}

/// Installs the stderr tracing subscriber.
fn init_tracing(verbose: u8) {
    let filter = log_filter(verbose).map_or_else(
        || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        EnvFilter::new,
    );
    let _ = fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).try_init();
}

/// Emits the top-level help message for the CLI.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line("").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(())
}

// ============================================================================
// SECTION: Analysis Commands
// ============================================================================

/// Loads the config and the prepared log for an analysis command.
fn load_inputs(command: &AnalysisCommand) -> CliResult<(BenchfitConfig, Dataset)> {
    let config = load_config(command.config.as_deref())?;
    let bytes = read_bytes_with_limit(&command.log, MAX_LOG_BYTES)
        .map_err(|err| CliError::new(read_error(&command.log, &err)))?;
    let dataset = Dataset::from_csv_reader(bytes.as_slice()).map_err(|err| {
        CliError::new(format!("failed to load log {}: {err}", command.log.display()))
    })?;
    info!(path = %command.log.display(), rows = dataset.len(), "loaded benchmark log");
    let prepared = pipeline::prepare(&dataset, &config);
    Ok((config, prepared))
}

/// Executes the `ratios` command.
fn command_ratios(command: &AnalysisCommand) -> CliResult<ExitCode> {
    let (config, dataset) = load_inputs(command)?;
    let table = pipeline::ratios_csv(&dataset, &config.ratios)?;
    write_output(&table, command.output.as_deref())?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `stats` command.
fn command_stats(command: &AnalysisCommand) -> CliResult<ExitCode> {
    let (config, dataset) = load_inputs(command)?;
    let table = pipeline::stats_csv(&dataset, &config.stats)?;
    write_output(&table, command.output.as_deref())?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `fit` command.
fn command_fit(command: &AnalysisCommand) -> CliResult<ExitCode> {
    let (config, dataset) = load_inputs(command)?;
    let report = pipeline::fit_report(&dataset, &config.fit)?;
    let table = pipeline::curves_csv(&report, &config.fit)?;
    write_output(&table, command.output.as_deref())?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `series` command.
fn command_series(command: &AnalysisCommand) -> CliResult<ExitCode> {
    let (config, dataset) = load_inputs(command)?;
    let table = pipeline::series_csv(&dataset, &config)?;
    write_output(&table, command.output.as_deref())?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `collect` command.
fn command_collect(command: &CollectCommand) -> CliResult<ExitCode> {
    let timings = collect_runs(&command.dir).map_err(|err| CliError::new(err.to_string()))?;
    let mut table = Vec::new();
    write_timings(&timings, &mut table).map_err(|err| CliError::new(err.to_string()))?;
    write_output(&table, command.output.as_deref())?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(command) => command_config_validate(&command),
        ConfigCommand::Example => command_config_example(),
    }
}

/// Executes the config validation command.
fn command_config_validate(command: &ConfigValidateCommand) -> CliResult<ExitCode> {
    let _config = load_config(command.config.as_deref())?;
    write_stdout_line("config ok").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the config example command.
fn command_config_example() -> CliResult<ExitCode> {
    write_stdout_bytes(config_toml_example().as_bytes())
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Loads and validates the configuration.
fn load_config(path: Option<&Path>) -> CliResult<BenchfitConfig> {
    BenchfitConfig::load(path).map_err(|err| CliError::new(format!("failed to load config: {err}")))
}

// ============================================================================
// SECTION: Input Helpers
// ============================================================================

/// Errors returned by bounded file reads.
#[derive(Debug)]
enum ReadLimitError {
    /// File I/O failure.
    Io(std::io::Error),
    /// File size exceeds the configured limit.
    TooLarge {
        /// Actual size in bytes.
        size: u64,
        /// Allowed limit in bytes.
        limit: usize,
    },
}

/// Reads a file from disk while enforcing a hard size limit.
fn read_bytes_with_limit(path: &Path, max_bytes: usize) -> Result<Vec<u8>, ReadLimitError> {
    let file = File::open(path).map_err(ReadLimitError::Io)?;
    let metadata = file.metadata().map_err(ReadLimitError::Io)?;
    let size = metadata.len();
    let limit = u64::try_from(max_bytes).map_err(|_| ReadLimitError::TooLarge {
        size,
        limit: max_bytes,
    })?;
    if size > limit {
        return Err(ReadLimitError::TooLarge {
            size,
            limit: max_bytes,
        });
    }

    let read_limit = limit.saturating_add(1);
    let mut limited = file.take(read_limit);
    let mut bytes = Vec::new();
    limited.read_to_end(&mut bytes).map_err(ReadLimitError::Io)?;
    if bytes.len() > max_bytes {
        let actual = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
        return Err(ReadLimitError::TooLarge {
            size: actual,
            limit: max_bytes,
        });
    }
    Ok(bytes)
}

/// Formats a bounded read failure.
fn read_error(path: &Path, error: &ReadLimitError) -> String {
    match error {
        ReadLimitError::Io(err) => format!("failed to read {}: {err}", path.display()),
        ReadLimitError::TooLarge {
            size,
            limit,
        } => format!("{} is {size} bytes, above the {limit} byte limit", path.display()),
    }
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Returns the output file, or `None` for stdout.
fn output_target(output: Option<&Path>) -> Option<&Path> {
    output.filter(|path| path.as_os_str() != STDOUT_PATH)
}

/// Writes a finished table to its destination.
fn write_output(bytes: &[u8], output: Option<&Path>) -> CliResult<()> {
    match output_target(output) {
        Some(path) => fs::write(path, bytes).map_err(|err| {
            CliError::new(format!("failed to write {}: {err}", path.display()))
        }),
        None => {
            write_stdout_bytes(bytes).map_err(|err| CliError::new(output_error("stdout", &err)))
        }
    }
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes raw bytes to stdout without adding a newline.
fn write_stdout_bytes(bytes: &[u8]) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    stdout.write_all(bytes)
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
