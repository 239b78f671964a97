//! Churn result types
//!
//! Every numeric result the engine emits. Rates are percentages rounded to
//! one decimal with [`rate`], so repeated queries serialize identically.

use std::collections::BTreeMap;

use churn_query::{Month, QualityCounts};
use serde::{Deserialize, Serialize};

/// Round to one decimal place, exact halves to even
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}

/// `part / whole * 100` rounded to one decimal, 0 when `whole` is 0
pub fn rate(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round1(part as f64 / whole as f64 * 100.0)
}

/// Churn and retention for one month against the month before
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyMetrics {
    pub month: Month,
    /// Users meeting the threshold this month
    pub active_users: u64,
    /// Users meeting the threshold the month before
    pub previous_active_users: u64,
    /// Previous-month users missing this month
    pub churned_users: u64,
    /// Previous-month users still active this month
    pub retained_users: u64,
    pub churn_rate: f64,
    pub retention_rate: f64,
    /// Users returning after a gap of at least the reactivation window
    pub reactivated_users: u64,
    /// Users silent for longer than the long-term inactivity window
    pub long_term_inactive: u64,
    pub month_over_month: MonthOverMonth,
}

/// Change against the previous month's metrics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthOverMonth {
    /// `active_users - previous_active_users`
    pub active_users_change: i64,
    /// This month's churn rate minus the previous month's
    pub churn_rate_change: f64,
}

/// One row of a churn trend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub month: Month,
    pub churn_rate: f64,
    pub active_users: u64,
    pub churned_users: u64,
}

impl From<&MonthlyMetrics> for TrendPoint {
    fn from(metrics: &MonthlyMetrics) -> Self {
        Self {
            month: metrics.month,
            churn_rate: metrics.churn_rate,
            active_users: metrics.active_users,
            churned_users: metrics.churned_users,
        }
    }
}

/// Churn over consecutive month pairs
///
/// The first input month is only a reference, so `months` and `trends`
/// hold one entry fewer than the input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChurnTrend {
    pub months: Vec<Month>,
    pub trends: Vec<TrendPoint>,
}

impl ChurnTrend {
    /// Create an empty trend
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from trend rows
    pub fn from_points(trends: Vec<TrendPoint>) -> Self {
        Self {
            months: trends.iter().map(|t| t.month).collect(),
            trends,
        }
    }

    /// Most recent row
    pub fn latest(&self) -> Option<&TrendPoint> {
        self.trends.last()
    }

    pub fn is_empty(&self) -> bool {
        self.trends.is_empty()
    }

    pub fn len(&self) -> usize {
        self.trends.len()
    }
}

/// Accumulated churn for one segment value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentResult {
    pub segment_value: String,
    pub current_active: u64,
    pub previous_active: u64,
    pub churned_users: u64,
    pub churn_rate: f64,
    /// `previous_active` is below the minimum sample size
    pub is_uncertain: bool,
}

/// Event completeness over a month range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub total_events: u64,
    pub valid_events: u64,
    pub invalid_events: u64,
    pub unknown_values: u64,
    pub unique_users: u64,
    /// `valid / total * 100`
    pub data_completeness: f64,
    /// `unknown / total * 100`
    pub unknown_ratio: f64,
}

impl From<QualityCounts> for QualityReport {
    fn from(counts: QualityCounts) -> Self {
        Self {
            total_events: counts.total_events,
            valid_events: counts.valid_events,
            invalid_events: counts.total_events.saturating_sub(counts.valid_events),
            unknown_values: counts.unknown_events,
            unique_users: counts.unique_users,
            data_completeness: rate(counts.valid_events, counts.total_events),
            unknown_ratio: rate(counts.unknown_events, counts.total_events),
        }
    }
}

/// Users inactive for at least N days, per N
///
/// Serialized as `{"inactive_30d": 12, "inactive_60d": 7, ...}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "BTreeMap<String, u64>", try_from = "BTreeMap<String, u64>")]
pub struct InactivityReport {
    counts: BTreeMap<u32, u64>,
}

impl InactivityReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the count for a day window
    pub fn insert(&mut self, days: u32, users: u64) {
        self.counts.insert(days, users);
    }

    /// Count for a day window
    pub fn get(&self, days: u32) -> Option<u64> {
        self.counts.get(&days).copied()
    }

    /// `(days, users)` pairs, ascending by days
    pub fn iter(&self) -> impl Iterator<Item = (u32, u64)> + '_ {
        self.counts.iter().map(|(d, u)| (*d, *u))
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl From<InactivityReport> for BTreeMap<String, u64> {
    fn from(report: InactivityReport) -> Self {
        report
            .counts
            .into_iter()
            .map(|(days, users)| (format!("inactive_{}d", days), users))
            .collect()
    }
}

impl TryFrom<BTreeMap<String, u64>> for InactivityReport {
    type Error = String;

    fn try_from(map: BTreeMap<String, u64>) -> Result<Self, Self::Error> {
        let mut report = Self::new();
        for (key, users) in map {
            let days = key
                .strip_prefix("inactive_")
                .and_then(|rest| rest.strip_suffix('d'))
                .and_then(|n| n.parse().ok())
                .ok_or_else(|| format!("invalid inactivity key: {}", key))?;
            report.insert(days, users);
        }
        Ok(report)
    }
}

/// Users who came back after a gap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactivationReport {
    pub reactivated_users: u64,
    pub gap_days: u32,
}
