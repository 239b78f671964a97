//! Single-operation commands
//!
//! # Usage
//!
//! ```bash
//! churn metrics --events events.jsonl --month 2024-03 --threshold 2
//! churn trend --events events.jsonl --start 2024-01 --end 2024-06
//! churn segments --events events.jsonl --strategy weekday-pattern --start 2024-01 --end 2024-03
//! churn quality --events events.jsonl --start 2024-01 --end 2024-03
//! churn inactivity --events events.jsonl --month 2024-03 --days 30,60,90
//! ```

use anyhow::{Result, bail};
use churn_analytics::{Month, SegmentStrategy, normalize_inactivity_days};
use churn_config::Config;
use clap::Args;
use serde_json::json;

use super::output::{self, OutputFormat};
use super::{StoreArgs, build_engine};

/// Metrics command arguments
#[derive(Args, Debug)]
pub struct MetricsArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Month to analyze (YYYY-MM)
    #[arg(short, long)]
    pub month: Month,

    /// Minimum events to count as active (default from config)
    #[arg(short, long)]
    pub threshold: Option<u32>,
}

/// Trend command arguments
#[derive(Args, Debug)]
pub struct TrendArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// First month of the range (YYYY-MM)
    #[arg(short, long)]
    pub start: Month,

    /// Last month of the range (YYYY-MM)
    #[arg(long)]
    pub end: Month,

    /// Minimum events to count as active (default from config)
    #[arg(short, long)]
    pub threshold: Option<u32>,
}

/// Segments command arguments
#[derive(Args, Debug)]
pub struct SegmentsArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Segment strategy (gender, age_band, channel, combined,
    /// weekday_pattern, time_pattern, action_type)
    #[arg(long)]
    pub strategy: SegmentStrategy,

    /// First month of the range (YYYY-MM)
    #[arg(short, long)]
    pub start: Month,

    /// Last month of the range (YYYY-MM)
    #[arg(long)]
    pub end: Month,
}

/// Quality command arguments
#[derive(Args, Debug)]
pub struct QualityArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// First month of the range (YYYY-MM)
    #[arg(short, long)]
    pub start: Month,

    /// Last month of the range (YYYY-MM)
    #[arg(long)]
    pub end: Month,
}

/// Inactivity command arguments
#[derive(Args, Debug)]
pub struct InactivityArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Reference month (YYYY-MM)
    #[arg(short, long)]
    pub month: Month,

    /// Inactivity windows in days (default from config)
    #[arg(short, long, value_delimiter = ',')]
    pub days: Vec<u32>,

    /// Reactivation gap in days (default from config)
    #[arg(short, long)]
    pub gap_days: Option<u32>,
}

/// Run the metrics command
pub async fn run_metrics(args: MetricsArgs, config: &Config) -> Result<()> {
    let engine = build_engine(config, &args.store)?;
    let threshold = args.threshold.unwrap_or(config.analysis.threshold);

    let metrics = engine.monthly_metrics(args.month, threshold).await?;
    match args.store.format {
        OutputFormat::Json => output::print_json(&metrics)?,
        OutputFormat::Table => output::print_metrics(&metrics),
    }
    Ok(())
}

/// Run the trend command
pub async fn run_trend(args: TrendArgs, config: &Config) -> Result<()> {
    if args.end <= args.start {
        bail!(
            "trend needs at least two months: {} is not before {}",
            args.start,
            args.end
        );
    }

    let engine = build_engine(config, &args.store)?;
    let threshold = args.threshold.unwrap_or(config.analysis.threshold);
    let months = Month::range(args.start, args.end);

    let trend = engine.churn_trend(&months, threshold).await?;
    match args.store.format {
        OutputFormat::Json => output::print_json(&trend)?,
        OutputFormat::Table => output::print_trend(&trend),
    }
    Ok(())
}

/// Run the segments command
pub async fn run_segments(args: SegmentsArgs, config: &Config) -> Result<()> {
    let engine = build_engine(config, &args.store)?;

    let rows = engine
        .segment_churn(args.strategy, args.start, args.end)
        .await?;
    match args.store.format {
        OutputFormat::Json => output::print_json(&json!({
            "strategy": args.strategy,
            "segments": rows,
        }))?,
        OutputFormat::Table => output::print_segments(args.strategy.as_str(), &rows),
    }
    Ok(())
}

/// Run the quality command
pub async fn run_quality(args: QualityArgs, config: &Config) -> Result<()> {
    let engine = build_engine(config, &args.store)?;

    let report = engine.data_quality(args.start, args.end).await?;
    match args.store.format {
        OutputFormat::Json => output::print_json(&report)?,
        OutputFormat::Table => output::print_quality(&report),
    }
    Ok(())
}

/// Run the inactivity command
pub async fn run_inactivity(args: InactivityArgs, config: &Config) -> Result<()> {
    let engine = build_engine(config, &args.store)?;
    let days = if args.days.is_empty() {
        normalize_inactivity_days(&config.analysis.inactivity_days)
    } else {
        normalize_inactivity_days(&args.days)
    };
    let gap_days = args
        .gap_days
        .unwrap_or(config.analysis.reactivation_gap_days);

    let inactivity = engine.inactivity(args.month, &days).await?;
    let reactivation = engine.reactivation(args.month, gap_days).await?;
    match args.store.format {
        OutputFormat::Json => output::print_json(&json!({
            "month": args.month,
            "inactivity": inactivity,
            "reactivation": reactivation,
        }))?,
        OutputFormat::Table => {
            output::print_inactivity(&inactivity);
            println!();
            output::print_reactivation(&reactivation);
        }
    }
    Ok(())
}
