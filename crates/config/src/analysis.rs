//! Analysis configuration
//!
//! Defaults for the churn engine and for requests built by the CLI.

use churn_analytics::{
    AnalysisSettings, DEFAULT_INACTIVITY_DAYS, DEFAULT_LONG_TERM_INACTIVE_DAYS,
    DEFAULT_REACTIVATION_GAP_DAYS, MIN_SAMPLE_SIZE, SegmentConfig,
};
use serde::Deserialize;

/// Analysis configuration
///
/// # Example
///
/// ```toml
/// [analysis]
/// threshold = 2
/// inactivity_days = [14, 30, 90]
///
/// [analysis.segments]
/// combined = true
/// weekday_pattern = true
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Minimum events for a user to count as active
    /// Default: 1
    pub threshold: u32,

    /// Segments with fewer previous-active users are flagged uncertain
    /// Default: 50
    pub min_sample_size: u64,

    /// Gap before a returning user counts as reactivated
    /// Default: 30
    pub reactivation_gap_days: u32,

    /// Window for the long-term inactive count in monthly metrics
    /// Default: 90
    pub long_term_inactive_days: u32,

    /// Day windows for the inactivity report
    /// Default: [30, 60, 90]
    pub inactivity_days: Vec<u32>,

    /// Segment strategies run by a full analysis
    /// Default: gender, age_band, channel
    pub segments: SegmentConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            threshold: 1,
            min_sample_size: MIN_SAMPLE_SIZE,
            reactivation_gap_days: DEFAULT_REACTIVATION_GAP_DAYS,
            long_term_inactive_days: DEFAULT_LONG_TERM_INACTIVE_DAYS,
            inactivity_days: DEFAULT_INACTIVITY_DAYS.to_vec(),
            segments: SegmentConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Engine settings from this config
    pub fn settings(&self) -> AnalysisSettings {
        AnalysisSettings {
            min_sample_size: self.min_sample_size,
            reactivation_gap_days: self.reactivation_gap_days,
            long_term_inactive_days: self.long_term_inactive_days,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnalysisConfig::default();
        assert_eq!(config.threshold, 1);
        assert_eq!(config.min_sample_size, 50);
        assert_eq!(config.inactivity_days, vec![30, 60, 90]);
        assert_eq!(config.settings(), AnalysisSettings::default());
    }

    #[test]
    fn test_deserialize_partial() {
        let toml = r#"
threshold = 3
inactivity_days = [7]

[segments]
gender = false
time_pattern = true
"#;
        let config: AnalysisConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.threshold, 3);
        assert_eq!(config.inactivity_days, vec![7]);
        assert_eq!(config.min_sample_size, 50);
        assert!(!config.segments.gender);
        assert!(config.segments.age_band);
        assert!(config.segments.time_pattern);
    }

    #[test]
    fn test_settings_carry_overrides() {
        let config = AnalysisConfig {
            min_sample_size: 10,
            reactivation_gap_days: 45,
            ..Default::default()
        };
        let settings = config.settings();
        assert_eq!(settings.min_sample_size, 10);
        assert_eq!(settings.reactivation_gap_days, 45);
        assert_eq!(settings.long_term_inactive_days, 90);
    }
}
