//! Event store backends
//!
//! [`EventStore`] is the single read capability the churn engine depends on.
//! Each backend answers the same questions in its own dialect; callers never
//! see query strings.

pub mod clickhouse;
pub mod memory;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::event::Event;
use crate::month::Month;

/// Read capability over an append-only event log
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Distinct users with at least `threshold` events in `month`
    async fn active_users(&self, month: Month, threshold: u32) -> Result<BTreeSet<String>>;

    /// Number of distinct users with at least `threshold` events in `month`
    async fn count_active_users(&self, month: Month, threshold: u32) -> Result<u64> {
        Ok(self.active_users(month, threshold).await?.len() as u64)
    }

    /// Latest event timestamp per user
    ///
    /// With `before`, only events strictly earlier than it are considered.
    async fn last_activity(
        &self,
        before: Option<DateTime<Utc>>,
    ) -> Result<BTreeMap<String, DateTime<Utc>>>;

    /// Per-user event counts bucketed by `dimension` within `month`
    async fn bucket_counts(&self, month: Month, dimension: Dimension) -> Result<Vec<BucketCount>>;

    /// Event validity counters for events in `[start, end)`
    async fn quality_counts(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<QualityCounts>;

    /// Check that the store is reachable
    async fn health_check(&self) -> Result<()>;

    /// Backend name
    fn name(&self) -> &'static str;

    /// A view of the store that later appends do not affect
    ///
    /// Remote backends return themselves; consistency is then the
    /// database's concern.
    fn snapshot(&self) -> Arc<dyn EventStore>;
}

/// How events are bucketed for segmentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Gender,
    AgeBand,
    Channel,
    /// `gender/age_band/channel`
    Combined,
    /// `weekday` (Mon-Fri) or `weekend`
    Weekday,
    /// `night` 00-05, `morning` 06-11, `afternoon` 12-17, `evening` 18-23
    HourOfDay,
    /// The action label
    Action,
}

impl Dimension {
    /// Bucket an event falls into, `None` for missing or unknown attributes
    pub fn bucket_of(&self, event: &Event) -> Option<String> {
        match self {
            Self::Gender => event.gender().map(str::to_string),
            Self::AgeBand => event.age_band().map(str::to_string),
            Self::Channel => event.channel().map(str::to_string),
            Self::Combined => Some(format!(
                "{}/{}/{}",
                event.gender()?,
                event.age_band()?,
                event.channel()?
            )),
            Self::Weekday => Some(weekday_bucket(event.timestamp).to_string()),
            Self::HourOfDay => Some(hour_bucket(event.timestamp.hour()).to_string()),
            Self::Action => (!event.action.is_empty()).then(|| event.action.clone()),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gender => "gender",
            Self::AgeBand => "age_band",
            Self::Channel => "channel",
            Self::Combined => "combined",
            Self::Weekday => "weekday",
            Self::HourOfDay => "hour_of_day",
            Self::Action => "action",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `weekday` for Monday through Friday, `weekend` otherwise
pub fn weekday_bucket(timestamp: DateTime<Utc>) -> &'static str {
    match timestamp.weekday() {
        Weekday::Sat | Weekday::Sun => "weekend",
        _ => "weekday",
    }
}

/// Time-of-day bucket for an hour (0-23)
pub fn hour_bucket(hour: u32) -> &'static str {
    match hour {
        0..=5 => "night",
        6..=11 => "morning",
        12..=17 => "afternoon",
        _ => "evening",
    }
}

/// Events of one user in one bucket
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BucketCount {
    pub user_id: String,
    /// `None` when the attribute is missing or unknown
    pub bucket: Option<String>,
    pub count: u64,
}

/// Raw validity counters over a time range
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityCounts {
    pub total_events: u64,
    /// Events with user id, timestamp and action present
    pub valid_events: u64,
    /// Events where any categorical attribute is missing or `Unknown`
    pub unknown_events: u64,
    pub unique_users: u64,
}
