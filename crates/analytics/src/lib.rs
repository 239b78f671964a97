//! Churn Analytics Engine
//!
//! Cohort and segment churn aggregation over an event store.
//!
//! # Overview
//!
//! This crate provides the aggregation layer, built on top of `churn-query`.
//! It includes:
//!
//! - **Engine**: monthly churn/retention, trends, inactivity, reactivation,
//!   data quality
//! - **Segments**: attribute and behaviour strategies with accumulated churn
//!   and an uncertainty flag
//! - **Analysis**: atomic full analysis and single-month reports
//!
//! # Usage
//!
//! ```ignore
//! use churn_analytics::{AnalysisRequest, ChurnEngine};
//!
//! let engine = ChurnEngine::new(store);
//! let metrics = engine.monthly_metrics("2024-03".parse()?, 1).await?;
//!
//! let request = AnalysisRequest::parse("2024-01", "2024-03")?;
//! let outcome = engine.run_full_analysis(&request).await;
//! ```

pub mod analysis;
pub mod engine;
pub mod error;
pub mod segment;
pub mod types;

#[cfg(test)]
mod engine_test;
#[cfg(test)]
mod test_support;

// Re-exports for convenience
pub use analysis::{
    AnalysisFailure, AnalysisOutcome, AnalysisRequest, AnalysisResult, MonthlyReport,
};
pub use churn_query::Month;
pub use engine::{
    AnalysisSettings, ChurnEngine, DEFAULT_INACTIVITY_DAYS, DEFAULT_LONG_TERM_INACTIVE_DAYS,
    DEFAULT_REACTIVATION_GAP_DAYS, MIN_SAMPLE_SIZE, normalize_inactivity_days,
};
pub use error::{AnalyticsError, Result};
pub use segment::{SegmentConfig, SegmentStrategy};
pub use types::{
    ChurnTrend, InactivityReport, MonthOverMonth, MonthlyMetrics, QualityReport,
    ReactivationReport, SegmentResult, TrendPoint,
};
