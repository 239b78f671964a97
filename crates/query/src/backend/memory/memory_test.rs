//! Tests for the in-memory event store

use chrono::TimeZone;

use super::*;

fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

fn month(s: &str) -> Month {
    Month::parse(s).unwrap()
}

fn sample_store() -> MemoryStore {
    MemoryStore::with_events(vec![
        Event::new("alice", at(2024, 1, 3, 9), "view")
            .with_gender("F")
            .with_age_band("20s")
            .with_channel("web"),
        Event::new("alice", at(2024, 1, 6, 20), "post")
            .with_gender("F")
            .with_age_band("20s")
            .with_channel("web"),
        Event::new("bob", at(2024, 1, 10, 3), "login").with_gender("M"),
        Event::new("carol", at(2024, 2, 1, 0), "view")
            .with_gender("F")
            .with_age_band("99s")
            .with_channel("app"),
        Event::new("", at(2024, 1, 15, 12), "view"),
    ])
}

// =============================================================================
// Active users
// =============================================================================

#[tokio::test]
async fn test_active_users_threshold_one() {
    let store = sample_store();
    let users = store.active_users(month("2024-01"), 1).await.unwrap();
    assert_eq!(
        users.into_iter().collect::<Vec<_>>(),
        vec!["alice".to_string(), "bob".to_string()]
    );
}

#[tokio::test]
async fn test_active_users_threshold_two() {
    let store = sample_store();
    let users = store.active_users(month("2024-01"), 2).await.unwrap();
    assert_eq!(users.len(), 1);
    assert!(users.contains("alice"));
}

#[tokio::test]
async fn test_active_users_month_boundary() {
    let store = sample_store();
    // carol's event is exactly at 2024-02-01T00:00:00Z
    let jan = store.active_users(month("2024-01"), 1).await.unwrap();
    let feb = store.active_users(month("2024-02"), 1).await.unwrap();
    assert!(!jan.contains("carol"));
    assert!(feb.contains("carol"));
}

#[tokio::test]
async fn test_count_active_users_default_impl() {
    let store = sample_store();
    assert_eq!(store.count_active_users(month("2024-01"), 1).await.unwrap(), 2);
    assert_eq!(store.count_active_users(month("2023-12"), 1).await.unwrap(), 0);
}

// =============================================================================
// Last activity
// =============================================================================

#[tokio::test]
async fn test_last_activity_global() {
    let store = sample_store();
    let last = store.last_activity(None).await.unwrap();
    assert_eq!(last.len(), 3);
    assert_eq!(last["alice"], at(2024, 1, 6, 20));
    assert_eq!(last["carol"], at(2024, 2, 1, 0));
}

#[tokio::test]
async fn test_last_activity_before_is_exclusive() {
    let store = sample_store();
    let last = store.last_activity(Some(at(2024, 2, 1, 0))).await.unwrap();
    assert!(!last.contains_key("carol"));
    assert_eq!(last["bob"], at(2024, 1, 10, 3));
}

// =============================================================================
// Buckets
// =============================================================================

#[tokio::test]
async fn test_bucket_counts_gender() {
    let store = sample_store();
    let rows = store
        .bucket_counts(month("2024-01"), Dimension::Gender)
        .await
        .unwrap();
    assert_eq!(
        rows,
        vec![
            BucketCount {
                user_id: "alice".into(),
                bucket: Some("F".into()),
                count: 2,
            },
            BucketCount {
                user_id: "bob".into(),
                bucket: Some("M".into()),
                count: 1,
            },
        ]
    );
}

#[tokio::test]
async fn test_bucket_counts_combined_requires_all_attributes() {
    let store = sample_store();
    let rows = store
        .bucket_counts(month("2024-01"), Dimension::Combined)
        .await
        .unwrap();
    let alice = rows.iter().find(|r| r.user_id == "alice").unwrap();
    let bob = rows.iter().find(|r| r.user_id == "bob").unwrap();
    assert_eq!(alice.bucket.as_deref(), Some("F/20s/web"));
    assert_eq!(bob.bucket, None);
}

#[tokio::test]
async fn test_bucket_counts_age_band_normalized() {
    let store = sample_store();
    let rows = store
        .bucket_counts(month("2024-02"), Dimension::AgeBand)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].bucket, None);
}

#[tokio::test]
async fn test_bucket_counts_weekday_and_hour() {
    let store = sample_store();
    // 2024-01-03 is a Wednesday, 2024-01-06 a Saturday
    let weekday = store
        .bucket_counts(month("2024-01"), Dimension::Weekday)
        .await
        .unwrap();
    let alice: Vec<_> = weekday.iter().filter(|r| r.user_id == "alice").collect();
    assert_eq!(alice.len(), 2);
    assert!(alice.iter().any(|r| r.bucket.as_deref() == Some("weekday")));
    assert!(alice.iter().any(|r| r.bucket.as_deref() == Some("weekend")));

    let hours = store
        .bucket_counts(month("2024-01"), Dimension::HourOfDay)
        .await
        .unwrap();
    let bob = hours.iter().find(|r| r.user_id == "bob").unwrap();
    assert_eq!(bob.bucket.as_deref(), Some("night"));
}

// =============================================================================
// Quality
// =============================================================================

#[tokio::test]
async fn test_quality_counts() {
    let store = sample_store();
    let counts = store
        .quality_counts(month("2024-01").start(), month("2024-02").end())
        .await
        .unwrap();
    assert_eq!(counts.total_events, 5);
    assert_eq!(counts.valid_events, 4);
    // only carol's age band normalizes to Unknown; missing attributes do not count
    assert_eq!(counts.unknown_events, 1);
    assert_eq!(counts.unique_users, 3);
}

#[tokio::test]
async fn test_quality_counts_empty_range() {
    let store = sample_store();
    let counts = store
        .quality_counts(month("2020-01").start(), month("2020-01").end())
        .await
        .unwrap();
    assert_eq!(counts, QualityCounts::default());
}

// =============================================================================
// Snapshots
// =============================================================================

#[tokio::test]
async fn test_snapshot_unaffected_by_append() {
    let store = sample_store();
    let snapshot = store.snapshot();

    store.append(Event::new("dave", at(2024, 1, 20, 10), "like"));

    let live = store.active_users(month("2024-01"), 1).await.unwrap();
    let frozen = snapshot.active_users(month("2024-01"), 1).await.unwrap();
    assert!(live.contains("dave"));
    assert!(!frozen.contains("dave"));
    assert_eq!(store.len(), 6);
}

#[tokio::test]
async fn test_extend_and_name() {
    let store = MemoryStore::new();
    assert!(store.is_empty());
    store.extend(vec![
        Event::new("a", at(2024, 3, 1, 1), "view"),
        Event::new("b", at(2024, 3, 2, 1), "view"),
    ]);
    assert_eq!(store.len(), 2);
    assert_eq!(store.name(), "memory");
    assert!(store.health_check().await.is_ok());
}
