//! Report command - single-month summary

use anyhow::Result;
use churn_analytics::{Month, MonthlyReport, normalize_inactivity_days};
use churn_config::Config;
use clap::Args;

use super::output::{self, OutputFormat};
use super::{StoreArgs, build_engine};

/// Report command arguments
#[derive(Args, Debug)]
pub struct ReportArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Month to report on (YYYY-MM)
    #[arg(short, long)]
    pub month: Month,

    /// Minimum events to count as active (default from config)
    #[arg(short, long)]
    pub threshold: Option<u32>,

    /// Inactivity windows in days (default from config)
    #[arg(short, long, value_delimiter = ',')]
    pub inactivity_days: Vec<u32>,
}

/// Run the report command
pub async fn run(args: ReportArgs, config: &Config) -> Result<()> {
    let engine = build_engine(config, &args.store)?;
    let threshold = args.threshold.unwrap_or(config.analysis.threshold);
    let days = if args.inactivity_days.is_empty() {
        normalize_inactivity_days(&config.analysis.inactivity_days)
    } else {
        normalize_inactivity_days(&args.inactivity_days)
    };

    let report = engine.monthly_report(args.month, threshold, &days).await?;
    match args.store.format {
        OutputFormat::Json => output::print_json(&report)?,
        OutputFormat::Table => print_report(&report),
    }
    Ok(())
}

fn print_report(report: &MonthlyReport) {
    println!(
        "Churn report for {} (generated {})",
        report.month,
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    output::print_heading("Metrics");
    output::print_metrics(&report.metrics);

    for (strategy, rows) in &report.segments {
        output::print_heading(&format!("Segments: {}", strategy));
        output::print_segments(strategy, rows);
    }

    output::print_heading("Inactivity");
    output::print_inactivity(&report.inactivity);
    output::print_reactivation(&report.reactivation);

    output::print_heading("Data quality");
    output::print_quality(&report.data_quality);
}
