//! Analyze command - full churn analysis over a month range
//!
//! Runs every section in one pass and either prints all of them or fails
//! without partial output.

use anyhow::{Result, anyhow};
use churn_analytics::{
    AnalysisOutcome, AnalysisRequest, AnalysisResult, Month, SegmentConfig, SegmentStrategy,
};
use churn_config::Config;
use clap::Args;

use super::output::{self, OutputFormat};
use super::{StoreArgs, build_engine};

/// Analyze command arguments
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// First month of the range (YYYY-MM)
    #[arg(short, long)]
    pub start: Month,

    /// Last month of the range (YYYY-MM); the headline month
    #[arg(long)]
    pub end: Month,

    /// Minimum events to count as active (default from config)
    #[arg(short, long)]
    pub threshold: Option<u32>,

    /// Segment strategies to run, comma separated (default from config)
    #[arg(long, value_delimiter = ',', conflicts_with = "all_segments")]
    pub segments: Vec<SegmentStrategy>,

    /// Run every segment strategy
    #[arg(long)]
    pub all_segments: bool,

    /// Inactivity windows in days (default from config)
    #[arg(short, long, value_delimiter = ',')]
    pub inactivity_days: Vec<u32>,
}

impl AnalyzeArgs {
    /// Build the request, filling unset options from config
    pub fn request(&self, config: &Config) -> AnalysisRequest {
        let segments = if self.all_segments {
            SegmentConfig::all()
        } else if self.segments.is_empty() {
            config.analysis.segments
        } else {
            SegmentConfig::only(&self.segments)
        };

        let inactivity_days = if self.inactivity_days.is_empty() {
            config.analysis.inactivity_days.clone()
        } else {
            self.inactivity_days.clone()
        };

        AnalysisRequest::new(self.start, self.end)
            .with_threshold(self.threshold.unwrap_or(config.analysis.threshold))
            .with_segments(segments)
            .with_inactivity_days(inactivity_days)
    }
}

/// Run the analyze command
pub async fn run(args: AnalyzeArgs, config: &Config) -> Result<()> {
    let engine = build_engine(config, &args.store)?;
    let request = args.request(config);

    let outcome = engine.run_full_analysis(&request).await;
    if args.store.format == OutputFormat::Json {
        output::print_json(&outcome)?;
    }

    match outcome {
        AnalysisOutcome::Completed(result) => {
            if args.store.format == OutputFormat::Table {
                print_result(&result);
            }
            Ok(())
        }
        AnalysisOutcome::Failed(failure) => Err(anyhow!("analysis failed: {}", failure.error)),
    }
}

fn print_result(result: &AnalysisResult) {
    println!(
        "Analysis {} ({} to {}, threshold {})",
        result.analysis_id,
        result.config.start_month,
        result.config.end_month,
        result.config.threshold
    );

    output::print_heading("Monthly metrics");
    output::print_metrics(&result.metrics);

    output::print_heading("Churn trend");
    output::print_trend(&result.trends);

    for (strategy, rows) in &result.segments {
        output::print_heading(&format!("Segments: {}", strategy));
        output::print_segments(strategy, rows);
    }

    output::print_heading("Inactivity");
    output::print_inactivity(&result.inactivity);
    output::print_reactivation(&result.reactivation);

    output::print_heading("Data quality");
    output::print_quality(&result.data_quality);

    println!();
    println!("Completed in {:.3}s", result.execution_time_seconds);
}
