//! Tests for the churn engine

use churn_query::{EventStore, MemoryStore};

use crate::error::AnalyticsError;
use crate::test_support::*;

// =============================================================================
// Monthly metrics
// =============================================================================

#[tokio::test]
async fn test_monthly_metrics_worked_example() {
    let engine = engine(abcd_to_abe());
    let metrics = engine.monthly_metrics(month("2024-03"), 1).await.unwrap();

    assert_eq!(metrics.month, month("2024-03"));
    assert_eq!(metrics.active_users, 3);
    assert_eq!(metrics.previous_active_users, 4);
    assert_eq!(metrics.churned_users, 2);
    assert_eq!(metrics.retained_users, 2);
    assert_eq!(metrics.churn_rate, 50.0);
    assert_eq!(metrics.retention_rate, 50.0);
    assert_eq!(metrics.month_over_month.active_users_change, -1);
    // January is empty, so February's churn rate is 0
    assert_eq!(metrics.month_over_month.churn_rate_change, 50.0);
}

#[tokio::test]
async fn test_monthly_metrics_threshold_excludes_light_users() {
    let mut events = repeated("X", 2024, 2, 3, "view");
    events.extend(repeated("X", 2024, 3, 1, "view"));
    events.extend(repeated("Y", 2024, 2, 2, "view"));
    events.extend(repeated("Y", 2024, 3, 2, "view"));
    let engine = engine(events);

    let loose = engine.monthly_metrics(month("2024-03"), 1).await.unwrap();
    assert_eq!(loose.active_users, 2);
    assert_eq!(loose.churned_users, 0);

    let strict = engine.monthly_metrics(month("2024-03"), 2).await.unwrap();
    assert_eq!(strict.active_users, 1);
    assert_eq!(strict.previous_active_users, 2);
    assert_eq!(strict.churned_users, 1);
    assert_eq!(strict.churn_rate, 50.0);
}

#[tokio::test]
async fn test_active_sets_shrink_with_threshold() {
    let mut events = Vec::new();
    for (i, user) in ["u1", "u2", "u3", "u4", "u5"].iter().enumerate() {
        events.extend(repeated(user, 2024, 4, i as u32 + 1, "view"));
    }
    let store = MemoryStore::with_events(events);

    let mut previous = store.active_users(month("2024-04"), 1).await.unwrap();
    for threshold in 2..=6 {
        let current = store.active_users(month("2024-04"), threshold).await.unwrap();
        assert!(current.is_subset(&previous), "threshold {}", threshold);
        previous = current;
    }
    assert!(previous.is_empty());
}

#[tokio::test]
async fn test_retained_plus_churned_is_previous() {
    let mut events = visits(&["a", "b", "c", "d", "e", "f", "g"], at(2024, 5, 3, 9));
    events.extend(visits(&["a", "c", "e", "x", "y"], at(2024, 6, 3, 9)));
    let engine = engine(events);

    let metrics = engine.monthly_metrics(month("2024-06"), 1).await.unwrap();
    assert_eq!(
        metrics.retained_users + metrics.churned_users,
        metrics.previous_active_users
    );
    assert_eq!(metrics.churned_users, 4);
    // 4 / 7 = 57.14..
    assert_eq!(metrics.churn_rate, 57.1);
    assert_eq!(metrics.retention_rate, 42.9);
    assert!((0.0..=100.0).contains(&metrics.churn_rate));
}

#[tokio::test]
async fn test_zero_previous_active_gives_zero_rates() {
    let engine = engine(visits(&["a", "b"], at(2024, 3, 2, 8)));
    let metrics = engine.monthly_metrics(month("2024-03"), 1).await.unwrap();
    assert_eq!(metrics.previous_active_users, 0);
    assert_eq!(metrics.churn_rate, 0.0);
    assert_eq!(metrics.retention_rate, 0.0);
}

#[tokio::test]
async fn test_monthly_metrics_year_rollover() {
    let mut events = visits(&["A", "B"], at(2023, 12, 20, 18));
    events.extend(visits(&["A"], at(2024, 1, 5, 18)));
    let engine = engine(events);

    let metrics = engine.monthly_metrics(month("2024-01"), 1).await.unwrap();
    assert_eq!(metrics.previous_active_users, 2);
    assert_eq!(metrics.churned_users, 1);
}

#[tokio::test]
async fn test_monthly_metrics_rejects_zero_threshold() {
    let engine = engine(abcd_to_abe());
    let err = engine.monthly_metrics(month("2024-03"), 0).await.unwrap_err();
    assert!(matches!(err, AnalyticsError::InvalidThreshold(0)));
}

#[tokio::test]
async fn test_monthly_metrics_long_term_inactive() {
    let mut events = visits(&["old"], at(2023, 11, 1, 0));
    events.extend(visits(&["recent"], at(2024, 2, 20, 0)));
    let engine = engine(events);

    // 2024-03-01 minus 90 days is 2023-12-02
    let metrics = engine.monthly_metrics(month("2024-03"), 1).await.unwrap();
    assert_eq!(metrics.long_term_inactive, 1);
}

// =============================================================================
// Trend
// =============================================================================

#[tokio::test]
async fn test_churn_trend_length() {
    let mut events = visits(&["a", "b", "c"], at(2024, 1, 10, 10));
    events.extend(visits(&["a", "b"], at(2024, 2, 10, 10)));
    events.extend(visits(&["a"], at(2024, 3, 10, 10)));
    events.extend(visits(&["a", "z"], at(2024, 4, 10, 10)));
    let engine = engine(events);

    let months = crate::Month::range(month("2024-01"), month("2024-04"));
    let trend = engine.churn_trend(&months, 1).await.unwrap();

    assert_eq!(trend.len(), 3);
    assert_eq!(
        trend.months,
        vec![month("2024-02"), month("2024-03"), month("2024-04")]
    );
    assert_eq!(trend.trends[0].churned_users, 1);
    assert_eq!(trend.trends[0].churn_rate, 33.3);
    assert_eq!(trend.trends[1].churn_rate, 50.0);
    assert_eq!(trend.trends[2].churn_rate, 0.0);
    assert_eq!(trend.latest().unwrap().active_users, 2);
}

#[tokio::test]
async fn test_churn_trend_short_input() {
    let engine = engine(abcd_to_abe());
    assert!(engine.churn_trend(&[], 1).await.unwrap().is_empty());
    assert!(
        engine
            .churn_trend(&[month("2024-03")], 1)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_churn_trend_rejects_unordered() {
    let engine = engine(abcd_to_abe());
    let err = engine
        .churn_trend(&[month("2024-03"), month("2024-02")], 1)
        .await
        .unwrap_err();
    assert!(matches!(err, AnalyticsError::InvalidPeriodRange(_)));

    let err = engine
        .churn_trend(&[month("2024-03"), month("2024-03")], 1)
        .await
        .unwrap_err();
    assert!(matches!(err, AnalyticsError::InvalidPeriodRange(_)));
}

// =============================================================================
// Inactivity and reactivation
// =============================================================================

#[tokio::test]
async fn test_inactivity_dedupes_and_sorts() {
    let mut events = visits(&["fresh"], at(2024, 5, 20, 0));
    events.extend(visits(&["month_ago"], at(2024, 4, 1, 0)));
    events.extend(visits(&["ancient"], at(2024, 1, 1, 0)));
    let engine = engine(events);

    let report = engine
        .inactivity(month("2024-06"), &[90, 30, 30])
        .await
        .unwrap();

    assert_eq!(report.iter().collect::<Vec<_>>(), vec![(30, 2), (90, 1)]);
}

#[tokio::test]
async fn test_inactivity_default_days() {
    let engine = engine(abcd_to_abe());
    let report = engine.inactivity(month("2024-06"), &[]).await.unwrap();
    let days: Vec<u32> = report.iter().map(|(d, _)| d).collect();
    assert_eq!(days, vec![30, 60, 90]);
}

#[tokio::test]
async fn test_reactivation_gap() {
    let mut events = visits(&["returning"], at(2024, 1, 15, 12));
    events.extend(visits(&["steady"], at(2024, 2, 10, 12)));
    events.extend(visits(&["returning", "steady", "newcomer"], at(2024, 3, 5, 12)));
    let engine = engine(events);

    let report = engine.reactivation(month("2024-03"), 30).await.unwrap();
    assert_eq!(report.gap_days, 30);
    assert_eq!(report.reactivated_users, 1);

    let metrics = engine.monthly_metrics(month("2024-03"), 1).await.unwrap();
    assert_eq!(metrics.reactivated_users, 1);
}

// =============================================================================
// Data quality
// =============================================================================

#[tokio::test]
async fn test_data_quality() {
    let events = vec![
        churn_query::Event::new("a", at(2024, 2, 1, 1), "view")
            .with_gender("F")
            .with_age_band("20s")
            .with_channel("web"),
        churn_query::Event::new("a", at(2024, 2, 2, 1), "view")
            .with_gender("F")
            .with_age_band("20s")
            .with_channel("web"),
        churn_query::Event::new("b", at(2024, 3, 2, 1), "view")
            .with_gender("M")
            .with_channel("Unknown"),
        churn_query::Event::new("", at(2024, 3, 3, 1), "view")
            .with_gender("M")
            .with_age_band("30s")
            .with_channel("app"),
    ];
    let engine = engine(events);

    let report = engine
        .data_quality(month("2024-02"), month("2024-03"))
        .await
        .unwrap();
    assert_eq!(report.total_events, 4);
    assert_eq!(report.valid_events, 3);
    assert_eq!(report.invalid_events, 1);
    assert_eq!(report.unknown_values, 1);
    assert_eq!(report.unique_users, 2);
    assert_eq!(report.data_completeness, 75.0);
    assert_eq!(report.unknown_ratio, 25.0);
}

#[tokio::test]
async fn test_data_quality_missing_attributes_are_not_unknown() {
    let engine = engine(vec![churn_query::Event::new(
        "a",
        at(2024, 3, 5, 10),
        "view",
    )]);

    let report = engine
        .data_quality(month("2024-03"), month("2024-03"))
        .await
        .unwrap();
    assert_eq!(report.total_events, 1);
    assert_eq!(report.unknown_values, 0);
    assert_eq!(report.unknown_ratio, 0.0);
    assert_eq!(report.data_completeness, 100.0);
}

#[tokio::test]
async fn test_data_quality_empty_and_bad_range() {
    let engine = engine(Vec::new());
    let report = engine
        .data_quality(month("2024-01"), month("2024-01"))
        .await
        .unwrap();
    assert_eq!(report.total_events, 0);
    assert_eq!(report.data_completeness, 0.0);
    assert_eq!(report.unknown_ratio, 0.0);

    let err = engine
        .data_quality(month("2024-02"), month("2024-01"))
        .await
        .unwrap_err();
    assert!(matches!(err, AnalyticsError::InvalidPeriodRange(_)));
}

#[tokio::test]
async fn test_engine_reports_store_name() {
    let engine = engine(Vec::new());
    assert_eq!(engine.store_name(), "memory");
    assert_eq!(engine.settings().min_sample_size, 50);
}
