//! Full analysis orchestration
//!
//! [`ChurnEngine::run_full_analysis`] composes every engine operation over
//! one store snapshot. The run is atomic: any failure discards the partial
//! sections and reports only the error and elapsed time.

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::{DateTime, Utc};
use churn_query::Month;
use serde::{Deserialize, Serialize};

use crate::engine::{ChurnEngine, Pinned, check_range, normalize_inactivity_days};
use crate::error::{AnalyticsError, Result};
use crate::segment::{SegmentConfig, SegmentStrategy};
use crate::types::{
    ChurnTrend, InactivityReport, MonthlyMetrics, QualityReport, ReactivationReport,
    SegmentResult, TrendPoint,
};

/// Parameters of a full analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub start_month: Month,
    pub end_month: Month,
    #[serde(default)]
    pub segments: SegmentConfig,
    #[serde(default = "default_inactivity_days")]
    pub inactivity_days: Vec<u32>,
    #[serde(default = "default_threshold")]
    pub threshold: u32,
}

fn default_inactivity_days() -> Vec<u32> {
    crate::engine::DEFAULT_INACTIVITY_DAYS.to_vec()
}

fn default_threshold() -> u32 {
    1
}

impl AnalysisRequest {
    /// Request over `[start_month, end_month]` with default options
    pub fn new(start_month: Month, end_month: Month) -> Self {
        Self {
            start_month,
            end_month,
            segments: SegmentConfig::default(),
            inactivity_days: default_inactivity_days(),
            threshold: default_threshold(),
        }
    }

    /// Parse both months from `YYYY-MM` strings
    pub fn parse(start_month: &str, end_month: &str) -> Result<Self> {
        Ok(Self::new(start_month.parse()?, end_month.parse()?))
    }

    pub fn with_segments(mut self, segments: SegmentConfig) -> Self {
        self.segments = segments;
        self
    }

    pub fn with_inactivity_days(mut self, days: Vec<u32>) -> Self {
        self.inactivity_days = days;
        self
    }

    pub fn with_threshold(mut self, threshold: u32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Check month order and threshold
    pub fn validate(&self) -> Result<()> {
        check_range(self.start_month, self.end_month)?;
        if self.threshold == 0 {
            return Err(AnalyticsError::InvalidThreshold(self.threshold));
        }
        Ok(())
    }

    /// Same request with the day list deduplicated, sorted and defaulted
    pub fn normalized(&self) -> Self {
        Self {
            inactivity_days: normalize_inactivity_days(&self.inactivity_days),
            ..self.clone()
        }
    }
}

/// Every section of a completed analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// `analysis_YYYYMMDD_HHMMSS`
    pub analysis_id: String,
    pub timestamp: DateTime<Utc>,
    /// The normalized request
    pub config: AnalysisRequest,
    pub metrics: MonthlyMetrics,
    pub trends: ChurnTrend,
    /// Results per enabled strategy name
    pub segments: BTreeMap<String, Vec<SegmentResult>>,
    pub inactivity: InactivityReport,
    pub reactivation: ReactivationReport,
    pub data_quality: QualityReport,
    pub execution_time_seconds: f64,
}

/// A failed analysis: the error and nothing else
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisFailure {
    pub error: String,
    pub timestamp: DateTime<Utc>,
    pub execution_time_seconds: f64,
}

/// Outcome of [`ChurnEngine::run_full_analysis`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalysisOutcome {
    Completed(Box<AnalysisResult>),
    Failed(AnalysisFailure),
}

impl AnalysisOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// The completed result, if any
    pub fn result(&self) -> Option<&AnalysisResult> {
        match self {
            Self::Completed(result) => Some(result),
            Self::Failed(_) => None,
        }
    }

    /// Convert into a `Result`, keeping the failure message
    pub fn into_result(self) -> std::result::Result<AnalysisResult, AnalysisFailure> {
        match self {
            Self::Completed(result) => Ok(*result),
            Self::Failed(failure) => Err(failure),
        }
    }
}

/// Single-month summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyReport {
    pub month: Month,
    pub generated_at: DateTime<Utc>,
    pub metrics: MonthlyMetrics,
    /// Latest row of `trends`
    pub trend: Option<TrendPoint>,
    pub trends: ChurnTrend,
    pub segments: BTreeMap<String, Vec<SegmentResult>>,
    pub inactivity: InactivityReport,
    pub reactivation: ReactivationReport,
    pub data_quality: QualityReport,
}

/// Sections computed before the result is stamped
struct Sections {
    metrics: MonthlyMetrics,
    trends: ChurnTrend,
    segments: BTreeMap<String, Vec<SegmentResult>>,
    inactivity: InactivityReport,
    reactivation: ReactivationReport,
    data_quality: QualityReport,
}

impl ChurnEngine {
    /// Run every enabled section of an analysis
    ///
    /// Never returns partial sections: the outcome is either the full
    /// result or a failure carrying the error and elapsed time.
    pub async fn run_full_analysis(&self, request: &AnalysisRequest) -> AnalysisOutcome {
        let started = Instant::now();
        let request = request.normalized();

        match self.pinned().analyze(&request).await {
            Ok(sections) => {
                let timestamp = Utc::now();
                let execution_time_seconds = started.elapsed().as_secs_f64();

                tracing::info!(
                    start = %request.start_month,
                    end = %request.end_month,
                    segments = sections.segments.len(),
                    time_ms = started.elapsed().as_millis() as u64,
                    "analysis completed"
                );

                AnalysisOutcome::Completed(Box::new(AnalysisResult {
                    analysis_id: format!("analysis_{}", timestamp.format("%Y%m%d_%H%M%S")),
                    timestamp,
                    config: request,
                    metrics: sections.metrics,
                    trends: sections.trends,
                    segments: sections.segments,
                    inactivity: sections.inactivity,
                    reactivation: sections.reactivation,
                    data_quality: sections.data_quality,
                    execution_time_seconds,
                }))
            }
            Err(e) => {
                tracing::warn!(
                    start = %request.start_month,
                    end = %request.end_month,
                    error = %e,
                    "analysis failed"
                );

                AnalysisOutcome::Failed(AnalysisFailure {
                    error: e.to_string(),
                    timestamp: Utc::now(),
                    execution_time_seconds: started.elapsed().as_secs_f64(),
                })
            }
        }
    }

    /// Summary of one month against the month before
    ///
    /// Attribute segments cover the previous month and `month`; quality
    /// covers `month` only.
    pub async fn monthly_report(
        &self,
        month: Month,
        threshold: u32,
        inactivity_days: &[u32],
    ) -> Result<MonthlyReport> {
        let pinned = self.pinned();
        let previous = month.previous();

        let metrics = pinned.monthly_metrics(month, threshold).await?;
        let trends = pinned.churn_trend(&[previous, month], threshold).await?;

        let mut segments = BTreeMap::new();
        for strategy in [
            SegmentStrategy::Gender,
            SegmentStrategy::AgeBand,
            SegmentStrategy::Channel,
        ] {
            let rows = pinned.segment_churn(strategy, previous, month).await?;
            segments.insert(strategy.as_str().to_string(), rows);
        }

        let inactivity = pinned.inactivity(month, inactivity_days).await?;
        let reactivation = pinned
            .reactivation(month, self.settings().reactivation_gap_days)
            .await?;
        let data_quality = pinned.data_quality(month, month).await?;

        Ok(MonthlyReport {
            month,
            generated_at: Utc::now(),
            trend: trends.latest().cloned(),
            metrics,
            trends,
            segments,
            inactivity,
            reactivation,
            data_quality,
        })
    }
}

impl Pinned {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<Sections> {
        request.validate()?;

        let (start, end) = (request.start_month, request.end_month);

        let metrics = self.monthly_metrics(end, request.threshold).await?;
        let trends = self
            .churn_trend(&Month::range(start, end), request.threshold)
            .await?;

        let mut segments = BTreeMap::new();
        for strategy in request.segments.enabled() {
            let rows = self.segment_churn(strategy, start, end).await?;
            segments.insert(strategy.as_str().to_string(), rows);
        }

        let inactivity = self.inactivity(end, &request.inactivity_days).await?;
        let reactivation = self.reactivation(end, self.reactivation_gap_days()).await?;
        let data_quality = self.data_quality(start, end).await?;

        Ok(Sections {
            metrics,
            trends,
            segments,
            inactivity,
            reactivation,
            data_quality,
        })
    }
}
