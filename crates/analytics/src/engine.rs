//! Cohort aggregation engine
//!
//! [`ChurnEngine`] computes month-over-month set differences over active
//! user sets read from an [`EventStore`]. Each public operation pins one
//! store snapshot for its whole duration.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Duration;
use churn_query::{EventStore, Month};
use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, Result};
use crate::segment::{self, SegmentStrategy};
use crate::types::{
    ChurnTrend, InactivityReport, MonthOverMonth, MonthlyMetrics, QualityReport,
    ReactivationReport, SegmentResult, TrendPoint, rate, round1,
};

/// Segments with fewer previous-active users are flagged uncertain
pub const MIN_SAMPLE_SIZE: u64 = 50;

/// Day windows used when an inactivity request lists none
pub const DEFAULT_INACTIVITY_DAYS: [u32; 3] = [30, 60, 90];

/// Default reactivation gap in days
pub const DEFAULT_REACTIVATION_GAP_DAYS: u32 = 30;

/// Default long-term inactivity window in days
pub const DEFAULT_LONG_TERM_INACTIVE_DAYS: u32 = 90;

/// Tunables for the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSettings {
    /// Uncertainty cut-off for segment rows
    pub min_sample_size: u64,
    /// Gap used for `reactivated_users` in monthly metrics and full analysis
    pub reactivation_gap_days: u32,
    /// Window used for `long_term_inactive` in monthly metrics
    pub long_term_inactive_days: u32,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            min_sample_size: MIN_SAMPLE_SIZE,
            reactivation_gap_days: DEFAULT_REACTIVATION_GAP_DAYS,
            long_term_inactive_days: DEFAULT_LONG_TERM_INACTIVE_DAYS,
        }
    }
}

/// Deduplicate and sort day windows, falling back to the defaults when empty
pub fn normalize_inactivity_days(days: &[u32]) -> Vec<u32> {
    let days: BTreeSet<u32> = days.iter().copied().collect();
    if days.is_empty() {
        return DEFAULT_INACTIVITY_DAYS.to_vec();
    }
    days.into_iter().collect()
}

/// Churn engine over an injected event store
#[derive(Clone)]
pub struct ChurnEngine {
    store: Arc<dyn EventStore>,
    settings: AnalysisSettings,
}

impl std::fmt::Debug for ChurnEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChurnEngine")
            .field("store", &self.store.name())
            .field("settings", &self.settings)
            .finish()
    }
}

impl ChurnEngine {
    /// Create an engine with default settings
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self::with_settings(store, AnalysisSettings::default())
    }

    /// Create an engine with explicit settings
    pub fn with_settings(store: Arc<dyn EventStore>, settings: AnalysisSettings) -> Self {
        Self { store, settings }
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    /// Name of the underlying store backend
    pub fn store_name(&self) -> &'static str {
        self.store.name()
    }

    /// An engine bound to a frozen view of the store
    pub(crate) fn pinned(&self) -> Pinned {
        Pinned {
            store: self.store.snapshot(),
            settings: self.settings,
        }
    }

    /// Churn and retention for `month` against the month before
    ///
    /// # Errors
    ///
    /// `InvalidThreshold` when `threshold` is 0, `Store` on read failure.
    pub async fn monthly_metrics(&self, month: Month, threshold: u32) -> Result<MonthlyMetrics> {
        self.pinned().monthly_metrics(month, threshold).await
    }

    /// Churn for each consecutive pair of `months`
    ///
    /// Returns one row per pair; fewer than two months give an empty trend.
    ///
    /// # Errors
    ///
    /// `InvalidPeriodRange` unless `months` is strictly ascending.
    pub async fn churn_trend(&self, months: &[Month], threshold: u32) -> Result<ChurnTrend> {
        self.pinned().churn_trend(months, threshold).await
    }

    /// Accumulated churn per segment value over `[start, end]`
    pub async fn segment_churn(
        &self,
        strategy: SegmentStrategy,
        start: Month,
        end: Month,
    ) -> Result<Vec<SegmentResult>> {
        self.pinned().segment_churn(strategy, start, end).await
    }

    /// Event completeness over `[start, end]`
    pub async fn data_quality(&self, start: Month, end: Month) -> Result<QualityReport> {
        self.pinned().data_quality(start, end).await
    }

    /// Users whose last activity is more than N days before `month` starts
    pub async fn inactivity(&self, month: Month, days: &[u32]) -> Result<InactivityReport> {
        self.pinned().inactivity(month, days).await
    }

    /// Users active in `month` whose previous activity predates a gap
    pub async fn reactivation(&self, month: Month, gap_days: u32) -> Result<ReactivationReport> {
        self.pinned().reactivation(month, gap_days).await
    }
}

/// Engine operations over one store snapshot
pub(crate) struct Pinned {
    store: Arc<dyn EventStore>,
    settings: AnalysisSettings,
}

impl Pinned {
    pub(crate) fn reactivation_gap_days(&self) -> u32 {
        self.settings.reactivation_gap_days
    }

    pub(crate) async fn monthly_metrics(
        &self,
        month: Month,
        threshold: u32,
    ) -> Result<MonthlyMetrics> {
        check_threshold(threshold)?;

        let previous = month.previous();
        let current_users = self.store.active_users(month, threshold).await?;
        let previous_users = self.store.active_users(previous, threshold).await?;
        let counts = CohortCounts::between(&previous_users, &current_users);

        let churn_rate = rate(counts.churned, counts.previous_active);

        // Churn of the month before, for the month-over-month delta
        let before_previous = self.store.active_users(previous.previous(), threshold).await?;
        let previous_counts = CohortCounts::between(&before_previous, &previous_users);
        let previous_churn_rate = rate(previous_counts.churned, previous_counts.previous_active);

        let reactivated = self
            .reactivation(month, self.settings.reactivation_gap_days)
            .await?;
        let long_term_inactive = self
            .inactive_since(month, self.settings.long_term_inactive_days)
            .await?;

        tracing::debug!(
            month = %month,
            threshold,
            active = counts.current_active,
            previous = counts.previous_active,
            churned = counts.churned,
            "monthly metrics computed"
        );

        Ok(MonthlyMetrics {
            month,
            active_users: counts.current_active,
            previous_active_users: counts.previous_active,
            churned_users: counts.churned,
            retained_users: counts.retained,
            churn_rate,
            retention_rate: rate(counts.retained, counts.previous_active),
            reactivated_users: reactivated.reactivated_users,
            long_term_inactive,
            month_over_month: MonthOverMonth {
                active_users_change: counts.current_active as i64 - counts.previous_active as i64,
                churn_rate_change: round1(churn_rate - previous_churn_rate),
            },
        })
    }

    pub(crate) async fn churn_trend(&self, months: &[Month], threshold: u32) -> Result<ChurnTrend> {
        check_threshold(threshold)?;

        if let Some(pair) = months.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(AnalyticsError::InvalidPeriodRange(format!(
                "months must be strictly ascending ({} then {})",
                pair[0], pair[1]
            )));
        }

        let mut points = Vec::with_capacity(months.len().saturating_sub(1));
        for month in months.iter().skip(1) {
            let metrics = self.monthly_metrics(*month, threshold).await?;
            points.push(TrendPoint::from(&metrics));
        }

        Ok(ChurnTrend::from_points(points))
    }

    pub(crate) async fn segment_churn(
        &self,
        strategy: SegmentStrategy,
        start: Month,
        end: Month,
    ) -> Result<Vec<SegmentResult>> {
        segment::segment_churn(
            self.store.as_ref(),
            strategy,
            start,
            end,
            self.settings.min_sample_size,
        )
        .await
    }

    pub(crate) async fn data_quality(&self, start: Month, end: Month) -> Result<QualityReport> {
        check_range(start, end)?;
        let counts = self.store.quality_counts(start.start(), end.end()).await?;
        Ok(QualityReport::from(counts))
    }

    pub(crate) async fn inactivity(&self, month: Month, days: &[u32]) -> Result<InactivityReport> {
        let last_seen = self.store.last_activity(None).await?;

        let mut report = InactivityReport::new();
        for window in normalize_inactivity_days(days) {
            let cutoff = month.start() - Duration::days(i64::from(window));
            let inactive = last_seen.values().filter(|ts| **ts < cutoff).count() as u64;
            report.insert(window, inactive);
        }

        Ok(report)
    }

    /// Users whose global last activity is older than `days` before `month`
    async fn inactive_since(&self, month: Month, days: u32) -> Result<u64> {
        let report = self.inactivity(month, &[days]).await?;
        Ok(report.get(days).unwrap_or(0))
    }

    pub(crate) async fn reactivation(
        &self,
        month: Month,
        gap_days: u32,
    ) -> Result<ReactivationReport> {
        let active = self.store.active_users(month, 1).await?;
        let last_before = self.store.last_activity(Some(month.start())).await?;
        let cutoff = month.start() - Duration::days(i64::from(gap_days));

        let reactivated = active
            .iter()
            .filter(|user| last_before.get(*user).is_some_and(|ts| *ts < cutoff))
            .count() as u64;

        Ok(ReactivationReport {
            reactivated_users: reactivated,
            gap_days,
        })
    }
}

/// Set-difference counts between two active sets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CohortCounts {
    previous_active: u64,
    current_active: u64,
    churned: u64,
    retained: u64,
}

impl CohortCounts {
    fn between(previous: &BTreeSet<String>, current: &BTreeSet<String>) -> Self {
        let retained = previous.intersection(current).count() as u64;
        let previous_active = previous.len() as u64;
        Self {
            previous_active,
            current_active: current.len() as u64,
            churned: previous_active - retained,
            retained,
        }
    }
}

fn check_threshold(threshold: u32) -> Result<()> {
    if threshold == 0 {
        return Err(AnalyticsError::InvalidThreshold(threshold));
    }
    Ok(())
}

pub(crate) fn check_range(start: Month, end: Month) -> Result<()> {
    if end < start {
        return Err(AnalyticsError::InvalidPeriodRange(format!(
            "end {} is before start {}",
            end, start
        )));
    }
    Ok(())
}
