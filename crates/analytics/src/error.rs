//! Analytics error types

use thiserror::Error;

/// Analytics errors
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Malformed month string
    #[error("invalid period: {0}")]
    InvalidPeriod(#[from] churn_query::ParseMonthError),

    /// Period list or range out of order
    #[error("invalid period range: {0}")]
    InvalidPeriodRange(String),

    /// Activity threshold below 1
    #[error("invalid threshold {0}: must be at least 1")]
    InvalidThreshold(u32),

    /// Unknown segment strategy name
    #[error("invalid segment strategy: {0}")]
    InvalidStrategy(String),

    /// Event store error (from churn-query)
    #[error("store error: {0}")]
    Store(#[from] churn_query::QueryError),
}

/// Result type for analytics operations
pub type Result<T> = std::result::Result<T, AnalyticsError>;
