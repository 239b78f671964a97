//! Table and JSON rendering for command results

use anyhow::Result;
use churn_analytics::{
    ChurnTrend, InactivityReport, MonthlyMetrics, QualityReport, ReactivationReport,
    SegmentResult,
};
use clap::ValueEnum;
use serde::Serialize;

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned plain-text tables
    Table,
    /// Pretty-printed JSON
    Json,
}

/// Print `value` as pretty JSON on stdout
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// Print a section heading
pub fn print_heading(title: &str) {
    println!();
    println!("{}", title);
    println!("{}", "=".repeat(title.len()));
}

pub fn print_metrics(metrics: &MonthlyMetrics) {
    println!("{:<24} {:>12}", "Month", metrics.month);
    println!("{}", "-".repeat(37));
    println!("{:<24} {:>12}", "Active users", metrics.active_users);
    println!(
        "{:<24} {:>12}",
        "Previous active", metrics.previous_active_users
    );
    println!("{:<24} {:>12}", "Churned", metrics.churned_users);
    println!("{:<24} {:>12}", "Retained", metrics.retained_users);
    println!("{:<24} {:>11.1}%", "Churn rate", metrics.churn_rate);
    println!("{:<24} {:>11.1}%", "Retention rate", metrics.retention_rate);
    println!("{:<24} {:>12}", "Reactivated", metrics.reactivated_users);
    println!(
        "{:<24} {:>12}",
        "Long-term inactive", metrics.long_term_inactive
    );
    println!("{}", "-".repeat(37));
    println!(
        "Change vs previous: {:+} active, {:+.1} pts churn",
        metrics.month_over_month.active_users_change,
        metrics.month_over_month.churn_rate_change
    );
}

pub fn print_trend(trend: &ChurnTrend) {
    if trend.is_empty() {
        println!("(no data)");
        return;
    }

    println!(
        "{:<10} {:>12} {:>10} {:>12}",
        "Month", "Churn rate", "Active", "Churned"
    );
    println!("{}", "-".repeat(47));
    for point in &trend.trends {
        println!(
            "{:<10} {:>11.1}% {:>10} {:>12}",
            point.month, point.churn_rate, point.active_users, point.churned_users
        );
    }
}

pub fn print_segments(strategy: &str, rows: &[SegmentResult]) {
    println!("Strategy: {}", strategy);
    if rows.is_empty() {
        println!("(no data)");
        return;
    }

    let width = rows
        .iter()
        .map(|r| r.segment_value.len())
        .max()
        .unwrap_or(0)
        .max("Segment".len());

    println!(
        "{:<width$} {:>10} {:>10} {:>10} {:>10}",
        "Segment",
        "Previous",
        "Current",
        "Churned",
        "Churn",
        width = width
    );
    println!("{}", "-".repeat(width + 44));
    for row in rows {
        let marker = if row.is_uncertain { " *" } else { "" };
        println!(
            "{:<width$} {:>10} {:>10} {:>10} {:>9.1}%{}",
            row.segment_value,
            row.previous_active,
            row.current_active,
            row.churned_users,
            row.churn_rate,
            marker,
            width = width
        );
    }
    if rows.iter().any(|r| r.is_uncertain) {
        println!("* small sample, rate is uncertain");
    }
}

pub fn print_quality(report: &QualityReport) {
    println!("{:<20} {:>12}", "Total events", report.total_events);
    println!("{:<20} {:>12}", "Valid events", report.valid_events);
    println!("{:<20} {:>12}", "Invalid events", report.invalid_events);
    println!("{:<20} {:>12}", "Unknown values", report.unknown_values);
    println!("{:<20} {:>12}", "Unique users", report.unique_users);
    println!("{}", "-".repeat(33));
    println!("{:<20} {:>11.1}%", "Completeness", report.data_completeness);
    println!("{:<20} {:>11.1}%", "Unknown ratio", report.unknown_ratio);
}

pub fn print_inactivity(report: &InactivityReport) {
    if report.is_empty() {
        println!("(no data)");
        return;
    }

    println!("{:<16} {:>12}", "Inactive for", "Users");
    println!("{}", "-".repeat(29));
    for (days, users) in report.iter() {
        println!("{:<16} {:>12}", format!("{}+ days", days), users);
    }
}

pub fn print_reactivation(report: &ReactivationReport) {
    println!(
        "Reactivated after {}+ days away: {}",
        report.gap_days, report.reactivated_users
    );
}
