//! Tests for event records

use chrono::{TimeZone, Utc};

use crate::backend::{Dimension, hour_bucket};
use crate::event::{Event, normalize_age_band, parse_timestamp};

fn ts(y: i32, m: u32, d: u32, h: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

#[test]
fn test_normalize_age_band() {
    assert_eq!(normalize_age_band("30s"), "30s");
    assert_eq!(normalize_age_band("80s"), "Unknown");
    assert_eq!(normalize_age_band(""), "Unknown");
}

#[test]
fn test_unknown_attributes_are_not_known() {
    let event = Event::new("u1", ts(2024, 1, 1, 0), "view")
        .with_gender("Unknown")
        .with_channel("web");
    assert_eq!(event.gender(), None);
    assert_eq!(event.channel(), Some("web"));
    assert_eq!(event.age_band(), None);
    assert!(event.has_unknown_attribute());
}

#[test]
fn test_missing_attributes_are_not_unknown() {
    let event = Event::new("u1", ts(2024, 1, 1, 0), "view");
    assert_eq!(event.gender(), None);
    assert_eq!(event.age_band(), None);
    assert_eq!(event.channel(), None);
    assert!(!event.has_unknown_attribute());

    let event = Event::new("u1", ts(2024, 1, 1, 0), "view").with_age_band("99s");
    assert!(event.has_unknown_attribute());
}

#[test]
fn test_fully_attributed_event() {
    let event = Event::new("u1", ts(2024, 1, 1, 0), "view")
        .with_gender("F")
        .with_age_band("40s")
        .with_channel("app");
    assert!(!event.has_unknown_attribute());
    assert!(event.is_valid());
}

#[test]
fn test_validity() {
    assert!(!Event::new("", ts(2024, 1, 1, 0), "view").is_valid());
    assert!(!Event::new("u1", ts(2024, 1, 1, 0), "").is_valid());
}

#[test]
fn test_normalized_trims() {
    let event = Event::new(" u1 ", ts(2024, 1, 1, 0), " view ").normalized();
    assert_eq!(event.user_id, "u1");
    assert_eq!(event.action, "view");
}

#[test]
fn test_parse_timestamp_formats() {
    let expected = ts(2024, 3, 5, 14);
    assert_eq!(parse_timestamp("2024-03-05T14:00:00Z"), Some(expected));
    assert_eq!(parse_timestamp("2024-03-05T16:00:00+02:00"), Some(expected));
    assert_eq!(parse_timestamp("2024-03-05 14:00:00"), Some(expected));
    assert_eq!(parse_timestamp("2024-03-05T14:00:00"), Some(expected));
    assert_eq!(parse_timestamp("05/03/2024"), None);
}

#[test]
fn test_hour_buckets() {
    assert_eq!(hour_bucket(0), "night");
    assert_eq!(hour_bucket(5), "night");
    assert_eq!(hour_bucket(6), "morning");
    assert_eq!(hour_bucket(12), "afternoon");
    assert_eq!(hour_bucket(18), "evening");
    assert_eq!(hour_bucket(23), "evening");
}

#[test]
fn test_dimension_buckets() {
    // 2024-03-09 is a Saturday
    let event = Event::new("u1", ts(2024, 3, 9, 8), "comment")
        .with_gender("M")
        .with_age_band("30s")
        .with_channel("search");
    assert_eq!(Dimension::Weekday.bucket_of(&event).as_deref(), Some("weekend"));
    assert_eq!(Dimension::HourOfDay.bucket_of(&event).as_deref(), Some("morning"));
    assert_eq!(Dimension::Action.bucket_of(&event).as_deref(), Some("comment"));
    assert_eq!(
        Dimension::Combined.bucket_of(&event).as_deref(),
        Some("M/30s/search")
    );
}
