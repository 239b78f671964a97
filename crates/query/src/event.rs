//! User event records
//!
//! An [`Event`] is one immutable user action. Categorical attributes are
//! optional; a missing attribute and the literal `Unknown` sentinel mean the
//! same thing and are excluded from attribute segmentation.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::month::Month;

/// Sentinel value for an unknown categorical attribute
pub const UNKNOWN: &str = "Unknown";

/// Accepted age bands; anything else is normalized to [`UNKNOWN`]
pub const AGE_BANDS: &[&str] = &["10s", "20s", "30s", "40s", "50s", "60s", "70s"];

/// A single user action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Opaque user identifier (empty means missing)
    #[serde(default)]
    pub user_id: String,

    /// When the action happened (UTC)
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,

    /// Action label, e.g. view, login, comment, like, post (empty means missing)
    #[serde(default)]
    pub action: String,

    /// Gender attribute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,

    /// Age band attribute (10s..70s)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_band: Option<String>,

    /// Acquisition channel attribute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

impl Event {
    /// Create an event without categorical attributes
    pub fn new(
        user_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            timestamp,
            action: action.into(),
            gender: None,
            age_band: None,
            channel: None,
        }
    }

    /// Set the gender attribute
    pub fn with_gender(mut self, gender: impl Into<String>) -> Self {
        self.gender = Some(gender.into());
        self
    }

    /// Set the age band attribute (normalized to a known band or `Unknown`)
    pub fn with_age_band(mut self, age_band: impl Into<String>) -> Self {
        self.age_band = Some(normalize_age_band(&age_band.into()).to_string());
        self
    }

    /// Set the channel attribute
    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    /// Trim identifiers and coerce unrecognized age bands to `Unknown`
    pub fn normalized(mut self) -> Self {
        self.user_id = self.user_id.trim().to_string();
        self.action = self.action.trim().to_string();
        self.gender = self.gender.map(|g| g.trim().to_string());
        self.channel = self.channel.map(|c| c.trim().to_string());
        self.age_band = self
            .age_band
            .map(|a| normalize_age_band(a.trim()).to_string());
        self
    }

    /// The month this event falls into
    pub fn month(&self) -> Month {
        Month::of(self.timestamp)
    }

    /// Known gender, `None` when missing or `Unknown`
    pub fn gender(&self) -> Option<&str> {
        known(self.gender.as_deref())
    }

    /// Known age band, `None` when missing or `Unknown`
    pub fn age_band(&self) -> Option<&str> {
        known(self.age_band.as_deref())
    }

    /// Known channel, `None` when missing or `Unknown`
    pub fn channel(&self) -> Option<&str> {
        known(self.channel.as_deref())
    }

    /// Whether user id and action are present
    ///
    /// The timestamp is always present on a decoded event.
    pub fn is_valid(&self) -> bool {
        !self.user_id.is_empty() && !self.action.is_empty()
    }

    /// Whether any categorical attribute is stored as `Unknown`
    ///
    /// A missing attribute is not unknown here, though segmentation skips
    /// both.
    pub fn has_unknown_attribute(&self) -> bool {
        [&self.gender, &self.age_band, &self.channel]
            .into_iter()
            .any(|value| value.as_deref() == Some(UNKNOWN))
    }
}

fn known(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty() && *v != UNKNOWN)
}

/// Map an age band to one of [`AGE_BANDS`] or [`UNKNOWN`]
pub fn normalize_age_band(value: &str) -> &str {
    AGE_BANDS
        .iter()
        .find(|band| **band == value)
        .copied()
        .unwrap_or(UNKNOWN)
}

/// Accept RFC 3339 timestamps as well as naive `YYYY-MM-DD HH:MM:SS`
/// (optionally with a `T` separator), which are read as UTC.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!("invalid timestamp: {}", raw))
    })
}

/// Parse an event timestamp
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}
