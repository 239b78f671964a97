//! Segment strategies
//!
//! A strategy assigns each user a set of labels per month. Attribute
//! strategies take every known value seen in the user's events; behaviour
//! strategies derive exactly one label from the user's event mix.
//!
//! Churn per label is accumulated over every consecutive month pair in the
//! window where the label has members in both months.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use churn_query::{BucketCount, Dimension, EventStore, Month};
use serde::{Deserialize, Serialize};

use crate::engine::check_range;
use crate::error::{AnalyticsError, Result};
use crate::types::{SegmentResult, rate};

/// Label for users without a dominant pattern
pub const MIXED: &str = "mixed";

/// Time-of-day buckets in tie-break priority order
pub const TIME_BUCKETS: &[&str] = &["morning", "afternoon", "evening", "night"];

/// Action vocabulary in tie-break priority order
pub const ACTION_VOCABULARY: &[&str] = &["view", "login", "comment", "like", "post"];

/// How users are partitioned for segment churn
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentStrategy {
    Gender,
    AgeBand,
    Channel,
    /// `gender/age_band/channel`
    Combined,
    /// Weekday versus weekend activity share
    WeekdayPattern,
    /// Dominant time-of-day bucket
    TimePattern,
    /// Dominant action
    ActionType,
}

impl SegmentStrategy {
    /// All strategies in report order
    pub const ALL: [SegmentStrategy; 7] = [
        Self::Gender,
        Self::AgeBand,
        Self::Channel,
        Self::Combined,
        Self::WeekdayPattern,
        Self::TimePattern,
        Self::ActionType,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gender => "gender",
            Self::AgeBand => "age_band",
            Self::Channel => "channel",
            Self::Combined => "combined",
            Self::WeekdayPattern => "weekday_pattern",
            Self::TimePattern => "time_pattern",
            Self::ActionType => "action_type",
        }
    }

    /// Store dimension the strategy reads
    pub fn dimension(&self) -> Dimension {
        match self {
            Self::Gender => Dimension::Gender,
            Self::AgeBand => Dimension::AgeBand,
            Self::Channel => Dimension::Channel,
            Self::Combined => Dimension::Combined,
            Self::WeekdayPattern => Dimension::Weekday,
            Self::TimePattern => Dimension::HourOfDay,
            Self::ActionType => Dimension::Action,
        }
    }

    /// Labels per user for one month of bucket counts
    fn labels(&self, rows: &[BucketCount]) -> BTreeMap<String, BTreeSet<String>> {
        let mut labels: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        match self {
            Self::Gender | Self::AgeBand | Self::Channel | Self::Combined => {
                for row in rows {
                    if let Some(bucket) = &row.bucket {
                        labels
                            .entry(bucket.clone())
                            .or_default()
                            .insert(row.user_id.clone());
                    }
                }
            }
            Self::WeekdayPattern | Self::TimePattern | Self::ActionType => {
                for (user, buckets) in per_user(rows) {
                    let label = match self {
                        Self::WeekdayPattern => weekday_label(
                            buckets.get("weekday").copied().unwrap_or(0),
                            buckets.get("weekend").copied().unwrap_or(0),
                        ),
                        Self::TimePattern => dominant(&buckets, TIME_BUCKETS),
                        _ => dominant(&buckets, ACTION_VOCABULARY),
                    };
                    labels
                        .entry(label.to_string())
                        .or_default()
                        .insert(user.to_string());
                }
            }
        }

        labels
    }
}

impl fmt::Display for SegmentStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SegmentStrategy {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == normalized)
            .ok_or_else(|| AnalyticsError::InvalidStrategy(s.to_string()))
    }
}

/// Which strategies a full analysis runs
///
/// Defaults to the three attribute strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
    pub gender: bool,
    pub age_band: bool,
    pub channel: bool,
    pub combined: bool,
    pub weekday_pattern: bool,
    pub time_pattern: bool,
    pub action_type: bool,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            gender: true,
            age_band: true,
            channel: true,
            combined: false,
            weekday_pattern: false,
            time_pattern: false,
            action_type: false,
        }
    }
}

impl SegmentConfig {
    /// No strategy enabled
    pub fn none() -> Self {
        Self {
            gender: false,
            age_band: false,
            channel: false,
            combined: false,
            weekday_pattern: false,
            time_pattern: false,
            action_type: false,
        }
    }

    /// Every strategy enabled
    pub fn all() -> Self {
        Self {
            gender: true,
            age_band: true,
            channel: true,
            combined: true,
            weekday_pattern: true,
            time_pattern: true,
            action_type: true,
        }
    }

    /// Enable only the given strategies
    pub fn only(strategies: &[SegmentStrategy]) -> Self {
        strategies.iter().fold(Self::none(), |config, strategy| {
            config.with(*strategy, true)
        })
    }

    /// Toggle one strategy
    pub fn with(mut self, strategy: SegmentStrategy, enabled: bool) -> Self {
        let flag = match strategy {
            SegmentStrategy::Gender => &mut self.gender,
            SegmentStrategy::AgeBand => &mut self.age_band,
            SegmentStrategy::Channel => &mut self.channel,
            SegmentStrategy::Combined => &mut self.combined,
            SegmentStrategy::WeekdayPattern => &mut self.weekday_pattern,
            SegmentStrategy::TimePattern => &mut self.time_pattern,
            SegmentStrategy::ActionType => &mut self.action_type,
        };
        *flag = enabled;
        self
    }

    pub fn is_enabled(&self, strategy: SegmentStrategy) -> bool {
        match strategy {
            SegmentStrategy::Gender => self.gender,
            SegmentStrategy::AgeBand => self.age_band,
            SegmentStrategy::Channel => self.channel,
            SegmentStrategy::Combined => self.combined,
            SegmentStrategy::WeekdayPattern => self.weekday_pattern,
            SegmentStrategy::TimePattern => self.time_pattern,
            SegmentStrategy::ActionType => self.action_type,
        }
    }

    /// Enabled strategies in report order
    pub fn enabled(&self) -> Vec<SegmentStrategy> {
        SegmentStrategy::ALL
            .into_iter()
            .filter(|s| self.is_enabled(*s))
            .collect()
    }
}

// =============================================================================
// Labelers
// =============================================================================

/// Bucket totals per user, users in ascending order
fn per_user(rows: &[BucketCount]) -> BTreeMap<&str, BTreeMap<&str, u64>> {
    let mut users: BTreeMap<&str, BTreeMap<&str, u64>> = BTreeMap::new();
    for row in rows {
        let buckets = users.entry(row.user_id.as_str()).or_default();
        if let Some(bucket) = &row.bucket {
            *buckets.entry(bucket.as_str()).or_default() += row.count;
        }
    }
    users
}

/// Weekday dominance label
///
/// At least 70% weekday is `weekday-heavy`, then at least 50% weekend is
/// `weekend-heavy`. A one-sided month meets one of the ratio rules first,
/// so `weekday-only` and `weekend-only` only remain as fallbacks.
pub fn weekday_label(weekday: u64, weekend: u64) -> &'static str {
    let total = weekday + weekend;
    if total == 0 {
        MIXED
    } else if weekday * 10 >= total * 7 {
        "weekday-heavy"
    } else if weekend * 2 >= total {
        "weekend-heavy"
    } else if weekend == 0 {
        "weekday-only"
    } else if weekday == 0 {
        "weekend-only"
    } else {
        MIXED
    }
}

/// Bucket with the highest count; ties go to the earlier entry of
/// `priority`. `mixed` when no bucket of `priority` has events.
pub fn dominant(counts: &BTreeMap<&str, u64>, priority: &[&'static str]) -> &'static str {
    let mut best: Option<(&'static str, u64)> = None;
    for bucket in priority {
        let count = counts.get(bucket).copied().unwrap_or(0);
        if count > 0 && best.is_none_or(|(_, top)| count > top) {
            best = Some((bucket, count));
        }
    }
    best.map_or(MIXED, |(bucket, _)| bucket)
}

// =============================================================================
// Accumulation
// =============================================================================

/// One month's labels and its full active set
struct MonthLabels {
    labels: BTreeMap<String, BTreeSet<String>>,
    active: BTreeSet<String>,
}

#[derive(Default)]
struct Totals {
    previous_active: u64,
    current_active: u64,
    churned: u64,
}

/// Segment churn over `[start, end]`, sorted by churn rate descending
pub(crate) async fn segment_churn(
    store: &dyn EventStore,
    strategy: SegmentStrategy,
    start: Month,
    end: Month,
    min_sample_size: u64,
) -> Result<Vec<SegmentResult>> {
    check_range(start, end)?;

    let mut months = Vec::new();
    for month in Month::range(start, end) {
        let rows = store.bucket_counts(month, strategy.dimension()).await?;
        months.push(MonthLabels {
            labels: strategy.labels(&rows),
            active: rows.into_iter().map(|r| r.user_id).collect(),
        });
    }

    let mut totals: BTreeMap<&str, Totals> = BTreeMap::new();
    for pair in months.windows(2) {
        let (prev, curr) = (&pair[0], &pair[1]);
        for (label, prev_members) in &prev.labels {
            let Some(curr_members) = curr.labels.get(label) else {
                continue;
            };
            let entry = totals.entry(label.as_str()).or_default();
            entry.previous_active += prev_members.len() as u64;
            entry.current_active += curr_members.len() as u64;
            entry.churned += prev_members
                .iter()
                .filter(|user| !curr.active.contains(*user))
                .count() as u64;
        }
    }

    let mut results: Vec<SegmentResult> = totals
        .into_iter()
        .filter(|(_, t)| t.previous_active > 0)
        .map(|(label, t)| SegmentResult {
            segment_value: label.to_string(),
            current_active: t.current_active,
            previous_active: t.previous_active,
            churned_users: t.churned,
            churn_rate: rate(t.churned, t.previous_active),
            is_uncertain: t.previous_active < min_sample_size,
        })
        .collect();

    results.sort_by(|a, b| {
        b.churn_rate
            .total_cmp(&a.churn_rate)
            .then_with(|| a.segment_value.cmp(&b.segment_value))
    });

    tracing::debug!(
        %strategy,
        start = %start,
        end = %end,
        segments = results.len(),
        "segment churn computed"
    );

    Ok(results)
}
