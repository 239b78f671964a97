//! Churn Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! An empty file is a valid config: the memory store, info logging and
//! the standard analysis windows.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use churn_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[store]\nevents_path = \"events.jsonl\"").unwrap();
//! ```
//!
//! # Example Config
//!
//! ```toml
//! [log]
//! level = "info"
//!
//! [store]
//! backend = "clickhouse"
//! clickhouse_url = "http://localhost:8123"
//! clickhouse_database = "analytics"
//!
//! [analysis]
//! threshold = 1
//! inactivity_days = [30, 60, 90]
//!
//! [analysis.segments]
//! gender = true
//! channel = true
//! ```

mod analysis;
mod error;
mod logging;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use analysis::AnalysisConfig;
pub use churn_query::{StoreBackend, StoreConfig};
pub use error::{ConfigError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel};

use serde::Deserialize;

/// Main configuration structure
///
/// All sections are optional with sensible defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub log: LogConfig,

    /// Event store backend
    pub store: StoreConfig,

    /// Analysis defaults
    pub analysis: AnalysisConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, contains invalid TOML, or fails
    /// validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    ///
    /// Prefer using the `FromStr` trait implementation.
    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config.log, LogConfig::default());
        assert_eq!(config.store, StoreConfig::default());
        assert_eq!(config.analysis, AnalysisConfig::default());
    }

    #[test]
    fn test_minimal_config() {
        let config = Config::from_str("[store]\nevents_path = \"events.jsonl\"").unwrap();
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.store.events_path, Some(PathBuf::from("events.jsonl")));
    }

    #[test]
    fn test_full_config_parse() {
        let toml = r#"
[log]
level = "debug"
format = "json"

[store]
backend = "clickhouse"
clickhouse_url = "http://ch:8123"
clickhouse_database = "analytics"
clickhouse_table = "user_events"

[analysis]
threshold = 2
min_sample_size = 20
reactivation_gap_days = 45
inactivity_days = [14, 30]

[analysis.segments]
combined = true
action_type = true
"#;
        let config = Config::from_str(toml).unwrap();

        assert_eq!(config.log.level, LogLevel::Debug);
        assert_eq!(config.log.format, LogFormat::Json);

        assert_eq!(config.store.backend, StoreBackend::Clickhouse);
        let resolved = config.store.clickhouse_config();
        assert_eq!(resolved.url, "http://ch:8123");
        assert_eq!(resolved.database, "analytics");
        assert_eq!(resolved.table, "user_events");

        assert_eq!(config.analysis.threshold, 2);
        assert_eq!(config.analysis.settings().min_sample_size, 20);
        assert_eq!(config.analysis.settings().reactivation_gap_days, 45);
        assert_eq!(config.analysis.inactivity_days, vec![14, 30]);
        assert!(config.analysis.segments.combined);
        assert!(config.analysis.segments.action_type);
        assert!(config.analysis.segments.gender);
    }

    #[test]
    fn test_invalid_toml() {
        let err = Config::from_str("[store\nbackend = ").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_unknown_backend() {
        let err = Config::from_str("[store]\nbackend = \"postgres\"").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[analysis]\nthreshold = 3").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.analysis.threshold, 3);
    }

    #[test]
    fn test_from_missing_file() {
        let err = Config::from_file("/nonexistent/churn.toml").unwrap_err();
        assert!(matches!(err, ConfigError::IoError { .. }));
        assert!(err.to_string().contains("/nonexistent/churn.toml"));
    }
}
