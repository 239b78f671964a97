//! Configuration validation
//!
//! Validates config consistency:
//! - Analysis thresholds and windows are positive
//! - ClickHouse URL uses an HTTP scheme
//! - ClickHouse credentials are given as a pair

use churn_query::StoreBackend;

use crate::Config;
use crate::error::{ConfigError, Result};

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_store(config)?;
    validate_analysis(config)?;
    Ok(())
}

/// Validate the store section
fn validate_store(config: &Config) -> Result<()> {
    let store = &config.store;

    if let Some(ref url) = store.clickhouse_url
        && !(url.starts_with("http://") || url.starts_with("https://"))
    {
        return Err(ConfigError::invalid_value(
            "store",
            "clickhouse_url",
            format!("'{}' must start with http:// or https://", url),
        ));
    }

    match (&store.clickhouse_username, &store.clickhouse_password) {
        (Some(_), None) => return Err(ConfigError::missing_field("store", "clickhouse_password")),
        (None, Some(_)) => return Err(ConfigError::missing_field("store", "clickhouse_username")),
        _ => {}
    }

    if store.backend == StoreBackend::Memory
        && let Some(ref path) = store.events_path
        && path.as_os_str().is_empty()
    {
        return Err(ConfigError::invalid_value(
            "store",
            "events_path",
            "must not be empty",
        ));
    }

    Ok(())
}

/// Validate the analysis section
fn validate_analysis(config: &Config) -> Result<()> {
    let analysis = &config.analysis;

    if analysis.threshold == 0 {
        return Err(ConfigError::invalid_value(
            "analysis",
            "threshold",
            "must be at least 1",
        ));
    }

    if analysis.min_sample_size == 0 {
        return Err(ConfigError::invalid_value(
            "analysis",
            "min_sample_size",
            "must be at least 1",
        ));
    }

    if analysis.reactivation_gap_days == 0 {
        return Err(ConfigError::invalid_value(
            "analysis",
            "reactivation_gap_days",
            "must be at least 1",
        ));
    }

    if analysis.long_term_inactive_days == 0 {
        return Err(ConfigError::invalid_value(
            "analysis",
            "long_term_inactive_days",
            "must be at least 1",
        ));
    }

    if analysis.inactivity_days.contains(&0) {
        return Err(ConfigError::invalid_value(
            "analysis",
            "inactivity_days",
            "windows must be at least 1 day",
        ));
    }

    Ok(())
}
