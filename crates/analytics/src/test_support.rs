//! Shared fixtures for engine tests

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use churn_query::{Event, MemoryStore, Month};

use crate::engine::ChurnEngine;

pub fn month(s: &str) -> Month {
    Month::parse(s).unwrap()
}

pub fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

/// One `view` event per user at the given instant
pub fn visits(users: &[&str], when: DateTime<Utc>) -> Vec<Event> {
    users
        .iter()
        .map(|user| Event::new(*user, when, "view"))
        .collect()
}

/// `count` events for one user inside a month, spread across days
pub fn repeated(user: &str, y: i32, m: u32, count: u32, action: &str) -> Vec<Event> {
    (0..count)
        .map(|i| Event::new(user, at(y, m, 1 + (i % 28), 10), action))
        .collect()
}

pub fn engine(events: Vec<Event>) -> ChurnEngine {
    ChurnEngine::new(Arc::new(MemoryStore::with_events(events)))
}

/// February {A, B, C, D}, March {A, B, E}
pub fn abcd_to_abe() -> Vec<Event> {
    let mut events = visits(&["A", "B", "C", "D"], at(2024, 2, 10, 12));
    events.extend(visits(&["A", "B", "E"], at(2024, 3, 10, 12)));
    events
}
