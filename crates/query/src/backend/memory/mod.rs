//! In-memory event store
//!
//! Holds events behind a `RwLock<Arc<Vec<Event>>>`. Readers clone the inner
//! `Arc` and work on that snapshot without holding the lock; appends copy
//! the vector only while a snapshot is still alive.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::backend::{BucketCount, Dimension, EventStore, QualityCounts};
use crate::error::Result;
use crate::event::Event;
use crate::month::Month;

/// Event store backed by a vector in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    events: Arc<RwLock<Arc<Vec<Event>>>>,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `events` (normalized on the way in)
    #[must_use]
    pub fn with_events(events: Vec<Event>) -> Self {
        let events = events.into_iter().map(Event::normalized).collect();
        Self {
            events: Arc::new(RwLock::new(Arc::new(events))),
        }
    }

    /// Append one event
    pub fn append(&self, event: Event) {
        let mut guard = self.events.write();
        Arc::make_mut(&mut *guard).push(event.normalized());
    }

    /// Append a batch of events
    pub fn extend(&self, events: impl IntoIterator<Item = Event>) {
        let mut guard = self.events.write();
        Arc::make_mut(&mut *guard).extend(events.into_iter().map(Event::normalized));
    }

    /// Number of stored events
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Whether the store holds no events
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Current events; the lock is released before returning
    fn current(&self) -> Arc<Vec<Event>> {
        Arc::clone(&*self.events.read())
    }
}

/// Events of identified users inside `month`
fn in_month(events: &[Event], month: Month) -> impl Iterator<Item = &Event> {
    let (start, end) = (month.start(), month.end());
    events
        .iter()
        .filter(move |e| !e.user_id.is_empty() && e.timestamp >= start && e.timestamp < end)
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn active_users(&self, month: Month, threshold: u32) -> Result<BTreeSet<String>> {
        let start = Instant::now();
        let events = self.current();

        let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
        for event in in_month(&events, month) {
            *counts.entry(event.user_id.as_str()).or_default() += 1;
        }

        let active: BTreeSet<String> = counts
            .into_iter()
            .filter(|(_, count)| *count >= u64::from(threshold))
            .map(|(user, _)| user.to_string())
            .collect();

        tracing::debug!(
            month = %month,
            threshold,
            users = active.len(),
            time_ms = start.elapsed().as_millis() as u64,
            "memory active_users"
        );

        Ok(active)
    }

    async fn last_activity(
        &self,
        before: Option<DateTime<Utc>>,
    ) -> Result<BTreeMap<String, DateTime<Utc>>> {
        let events = self.current();

        let mut last: BTreeMap<String, DateTime<Utc>> = BTreeMap::new();
        for event in events.iter() {
            if event.user_id.is_empty() || before.is_some_and(|b| event.timestamp >= b) {
                continue;
            }
            last.entry(event.user_id.clone())
                .and_modify(|ts| *ts = (*ts).max(event.timestamp))
                .or_insert(event.timestamp);
        }

        tracing::debug!(users = last.len(), before = ?before, "memory last_activity");

        Ok(last)
    }

    async fn bucket_counts(&self, month: Month, dimension: Dimension) -> Result<Vec<BucketCount>> {
        let events = self.current();

        let mut counts: BTreeMap<(&str, Option<String>), u64> = BTreeMap::new();
        for event in in_month(&events, month) {
            *counts
                .entry((event.user_id.as_str(), dimension.bucket_of(event)))
                .or_default() += 1;
        }

        let rows: Vec<BucketCount> = counts
            .into_iter()
            .map(|((user_id, bucket), count)| BucketCount {
                user_id: user_id.to_string(),
                bucket,
                count,
            })
            .collect();

        tracing::debug!(month = %month, %dimension, rows = rows.len(), "memory bucket_counts");

        Ok(rows)
    }

    async fn quality_counts(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<QualityCounts> {
        let events = self.current();

        let mut counts = QualityCounts::default();
        let mut users: BTreeSet<&str> = BTreeSet::new();
        for event in events
            .iter()
            .filter(|e| e.timestamp >= start && e.timestamp < end)
        {
            counts.total_events += 1;
            if event.is_valid() {
                counts.valid_events += 1;
            }
            if event.has_unknown_attribute() {
                counts.unknown_events += 1;
            }
            if !event.user_id.is_empty() {
                users.insert(event.user_id.as_str());
            }
        }
        counts.unique_users = users.len() as u64;

        Ok(counts)
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }

    fn snapshot(&self) -> Arc<dyn EventStore> {
        Arc::new(Self {
            events: Arc::new(RwLock::new(self.current())),
        })
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod memory_test;
