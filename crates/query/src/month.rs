//! Calendar month periods
//!
//! A [`Month`] is the unit of churn aggregation. Boundaries are calendar
//! months in UTC, not 30-day windows: `2024-02` covers
//! `[2024-02-01T00:00:00Z, 2024-03-01T00:00:00Z)`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Error returned when a month string is not `YYYY-MM`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid month '{input}' (use YYYY-MM)")]
pub struct ParseMonthError {
    input: String,
}

impl ParseMonthError {
    fn new(input: &str) -> Self {
        Self {
            input: input.to_string(),
        }
    }
}

/// Smallest and largest representable month, as `year * 12 + month - 1`
const MIN_INDEX: i32 = 12;
const MAX_INDEX: i32 = 9999 * 12 + 11;

/// A calendar month identified by `(year, month)`
///
/// Years are limited to `0001..=9999` so every month prints as a
/// four-digit `YYYY-MM` that [`Month::parse`] accepts again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Month {
    // Field order matters: derived Ord compares year first.
    year: i32,
    month: u32,
}

impl Month {
    /// Create a month, returning `None` when `month` is outside 1..=12
    /// or `year` is outside 1..=9999
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if !(1..=9999).contains(&year) || !(1..=12).contains(&month) {
            return None;
        }
        Some(Self { year, month })
    }

    /// The month containing a timestamp
    ///
    /// Timestamps outside years `0001..=9999` land in the nearest
    /// representable month.
    pub fn of(timestamp: DateTime<Utc>) -> Self {
        let index = timestamp.year() * 12 + (timestamp.month() as i32 - 1);
        Self::from_index(index.clamp(MIN_INDEX, MAX_INDEX))
    }

    /// Parse a `YYYY-MM` string
    pub fn parse(s: &str) -> Result<Self, ParseMonthError> {
        let trimmed = s.trim();
        let (year, month) = trimmed
            .split_once('-')
            .ok_or_else(|| ParseMonthError::new(s))?;

        let all_digits = |part: &str, len: usize| {
            part.len() == len && part.bytes().all(|b| b.is_ascii_digit())
        };
        if !all_digits(year, 4) || !all_digits(month, 2) {
            return Err(ParseMonthError::new(s));
        }

        let year: i32 = year.parse().map_err(|_| ParseMonthError::new(s))?;
        let month: u32 = month.parse().map_err(|_| ParseMonthError::new(s))?;

        Self::new(year, month).ok_or_else(|| ParseMonthError::new(s))
    }

    /// Calendar year
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Month number (1-12)
    pub fn month(&self) -> u32 {
        self.month
    }

    /// First instant of the month (inclusive)
    pub fn start(&self) -> DateTime<Utc> {
        first_instant(self.index())
    }

    /// First instant of the following month (exclusive end)
    ///
    /// For `9999-12` this is the start of year 10000.
    pub fn end(&self) -> DateTime<Utc> {
        first_instant(self.index() + 1)
    }

    /// Whether a timestamp falls inside this month
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp >= self.start() && timestamp < self.end()
    }

    /// The previous calendar month (January rolls back to December)
    pub fn previous(&self) -> Self {
        self.shift(-1)
    }

    /// The next calendar month (December rolls over to January)
    pub fn next(&self) -> Self {
        self.shift(1)
    }

    /// Shift by a number of months, positive or negative
    ///
    /// Saturates at `0001-01` and `9999-12`.
    pub fn shift(&self, months: i32) -> Self {
        let index = self
            .index()
            .saturating_add(months)
            .clamp(MIN_INDEX, MAX_INDEX);
        Self::from_index(index)
    }

    /// All months from `start` to `end`, both inclusive, ascending
    ///
    /// Returns an empty list when `end` is before `start`.
    pub fn range(start: Month, end: Month) -> Vec<Month> {
        (start.index()..=end.index())
            .map(Self::from_index)
            .collect()
    }

    fn index(&self) -> i32 {
        self.year * 12 + (self.month as i32 - 1)
    }

    fn from_index(index: i32) -> Self {
        Self {
            year: index.div_euclid(12),
            month: index.rem_euclid(12) as u32 + 1,
        }
    }
}

fn first_instant(index: i32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(index.div_euclid(12), index.rem_euclid(12) as u32 + 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|t| t.and_utc())
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Month {
    type Err = ParseMonthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Month {
    type Error = ParseMonthError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Month> for String {
    fn from(month: Month) -> Self {
        month.to_string()
    }
}
