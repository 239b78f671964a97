//! Churn - cohort churn and retention analysis over user event logs
//!
//! # Usage
//!
//! ```bash
//! # Full analysis over a quarter
//! churn analyze --events events.jsonl --start 2024-01 --end 2024-03
//! churn analyze --config churn.toml --start 2024-01 --end 2024-03 --format json
//!
//! # Single-month views
//! churn metrics --events events.jsonl --month 2024-03
//! churn report --events events.jsonl --month 2024-03
//!
//! # Segments and trends
//! churn segments --events events.jsonl --strategy gender --start 2024-01 --end 2024-03
//! churn trend --events events.jsonl --start 2024-01 --end 2024-06
//! ```

mod cmd;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use churn_config::{Config, LogFormat};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Churn - cohort churn and retention analysis
#[derive(Parser, Debug)]
#[command(name = "churn")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (error if specified but not found)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). Overrides config file.
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the full analysis over a month range
    Analyze(cmd::analyze::AnalyzeArgs),

    /// Churn and retention for one month
    Metrics(cmd::metrics::MetricsArgs),

    /// Month-by-month churn rates over a range
    Trend(cmd::metrics::TrendArgs),

    /// Accumulated churn per segment value
    Segments(cmd::metrics::SegmentsArgs),

    /// Event completeness over a month range
    Quality(cmd::metrics::QualityArgs),

    /// Inactive and reactivated users as of a month
    Inactivity(cmd::metrics::InactivityArgs),

    /// Single-month summary report
    Report(cmd::report::ReportArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    let log_level = resolve_log_level(cli.log_level.as_deref(), &config);
    init_logging(&log_level, config.log.format)?;

    match cli.command {
        Command::Analyze(args) => cmd::analyze::run(args, &config).await,
        Command::Metrics(args) => cmd::metrics::run_metrics(args, &config).await,
        Command::Trend(args) => cmd::metrics::run_trend(args, &config).await,
        Command::Segments(args) => cmd::metrics::run_segments(args, &config).await,
        Command::Quality(args) => cmd::metrics::run_quality(args, &config).await,
        Command::Inactivity(args) => cmd::metrics::run_inactivity(args, &config).await,
        Command::Report(args) => cmd::report::run(args, &config).await,
    }
}

/// Load the config file if one was given, defaults otherwise
fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(Config::default()),
    }
}

/// Resolve log level: CLI flag > config file > default "info"
fn resolve_log_level(cli_level: Option<&str>, config: &Config) -> String {
    config.log.directive(cli_level)
}

/// Initialize the tracing subscriber for logging
///
/// Logs go to stderr; stdout carries only report output.
fn init_logging(level: &str, format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Console => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init(),
    }

    Ok(())
}
