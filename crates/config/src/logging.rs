//! `[log]` section
//!
//! Diagnostics of the churn CLI go to stderr, so report tables and JSON on
//! stdout stay clean for piping.

use serde::Deserialize;

/// Verbosity of CLI diagnostics
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    /// Per-call store timings and segment counts
    Debug,
    /// Store opened, analysis completed
    #[default]
    Info,
    /// Failed analyses
    Warn,
    Error,
}

impl LogLevel {
    /// Filter directive understood by `tracing_subscriber::EnvFilter`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Diagnostic line format
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Console,
    /// One JSON object per line, for log shippers
    Json,
}

/// Logging configuration
///
/// ```toml
/// [log]
/// level = "debug"
/// format = "json"
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
}

impl LogConfig {
    /// Filter directive to install: a `--log-level` override wins over the
    /// configured level
    ///
    /// The override is passed through untouched, so per-crate directives
    /// such as `churn_query=debug,info` work.
    pub fn directive(&self, cli_override: Option<&str>) -> String {
        match cli_override {
            Some(directive) if !directive.trim().is_empty() => directive.trim().to_string(),
            _ => self.level.as_str().to_string(),
        }
    }
}
