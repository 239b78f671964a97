//! ClickHouse event store
//!
//! Answers [`EventStore`] questions against an events table using the HTTP
//! interface. Each capability is one SQL statement; rows come back as
//! `JSONEachRow` and are decoded into typed structs.
//!
//! Expected table shape:
//! ```text
//! user_id String, timestamp DateTime, action String,
//! gender String, age_band String, channel String
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::backend::{BucketCount, Dimension, EventStore, QualityCounts};
use crate::error::{QueryError, Result};
use crate::event::UNKNOWN;
use crate::month::Month;

// =============================================================================
// Configuration
// =============================================================================

/// ClickHouse store configuration
#[derive(Debug, Clone)]
pub struct ClickHouseStoreConfig {
    /// ClickHouse HTTP URL (e.g., "http://localhost:8123")
    pub url: String,

    /// Database name
    pub database: String,

    /// Events table name
    pub table: String,

    /// Username for authentication (optional)
    pub username: Option<String>,

    /// Password for authentication (optional)
    pub password: Option<String>,

    /// Max execution time in seconds
    pub max_execution_time: u64,
}

impl Default for ClickHouseStoreConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8123".into(),
            database: "default".into(),
            table: "events".into(),
            username: None,
            password: None,
            max_execution_time: 60,
        }
    }
}

impl ClickHouseStoreConfig {
    /// Create a new config with URL and database
    pub fn new(url: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            database: database.into(),
            ..Default::default()
        }
    }

    /// Set the events table
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Set authentication credentials
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }
}

// =============================================================================
// Store Implementation
// =============================================================================

/// Event store backed by a ClickHouse table
#[derive(Clone)]
pub struct ClickHouseStore {
    client: reqwest::Client,
    config: ClickHouseStoreConfig,
}

impl std::fmt::Debug for ClickHouseStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClickHouseStore")
            .field("url", &self.config.url)
            .field("database", &self.config.database)
            .field("table", &self.config.table)
            .finish()
    }
}

impl ClickHouseStore {
    /// Create a store from config
    ///
    /// Database and table names are interpolated into SQL, so only
    /// `[A-Za-z0-9_]` identifiers are accepted.
    pub fn new(config: &ClickHouseStoreConfig) -> Result<Self> {
        for (field, value) in [("database", &config.database), ("table", &config.table)] {
            if !is_identifier(value) {
                return Err(QueryError::Config(format!(
                    "invalid ClickHouse {} name '{}'",
                    field, value
                )));
            }
        }

        Ok(Self {
            client: reqwest::Client::new(),
            config: config.clone(),
        })
    }

    /// Fully qualified events table
    fn table(&self) -> String {
        format!("{}.{}", self.config.database, self.config.table)
    }

    /// Send a statement and return the raw response body
    async fn execute_query(&self, sql: &str) -> Result<String> {
        let max_execution_time = self.config.max_execution_time.to_string();
        let mut request = self
            .client
            .post(&self.config.url)
            .query(&[
                ("database", self.config.database.as_str()),
                ("max_execution_time", max_execution_time.as_str()),
                ("output_format_json_quote_64bit_integers", "0"),
            ])
            .body(sql.to_string());

        if let (Some(user), Some(pass)) = (&self.config.username, &self.config.password) {
            request = request.basic_auth(user, Some(pass));
        }

        let response = request.send().await.map_err(|e| {
            QueryError::Connection(format!("ClickHouse connection failed: {}", e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(QueryError::Execution(format!(
                "ClickHouse error ({}): {}",
                status, body
            )));
        }

        response
            .text()
            .await
            .map_err(|e| QueryError::Execution(format!("failed to read response: {}", e)))
    }

    /// Run a `JSONEachRow` query and decode every row
    async fn fetch<T: DeserializeOwned>(&self, sql: &str) -> Result<Vec<T>> {
        let start = Instant::now();
        let body = self.execute_query(sql).await?;
        let rows = parse_rows(&body)?;

        tracing::debug!(
            rows = rows.len(),
            time_ms = start.elapsed().as_millis() as u64,
            "ClickHouse query executed"
        );

        Ok(rows)
    }
}

#[async_trait]
impl EventStore for ClickHouseStore {
    async fn active_users(&self, month: Month, threshold: u32) -> Result<BTreeSet<String>> {
        let rows: Vec<UserRow> = self
            .fetch(&active_users_sql(&self.table(), month, threshold))
            .await?;
        Ok(rows.into_iter().map(|r| r.user_id).collect())
    }

    async fn count_active_users(&self, month: Month, threshold: u32) -> Result<u64> {
        let rows: Vec<CountRow> = self
            .fetch(&count_active_users_sql(&self.table(), month, threshold))
            .await?;
        Ok(rows.first().map_or(0, |r| r.count))
    }

    async fn last_activity(
        &self,
        before: Option<DateTime<Utc>>,
    ) -> Result<BTreeMap<String, DateTime<Utc>>> {
        let rows: Vec<LastActivityRow> = self
            .fetch(&last_activity_sql(&self.table(), before))
            .await?;

        rows.into_iter()
            .map(|row| {
                DateTime::from_timestamp(row.last_ts, 0)
                    .map(|ts| (row.user_id, ts))
                    .ok_or_else(|| {
                        QueryError::Serialization(format!(
                            "timestamp out of range: {}",
                            row.last_ts
                        ))
                    })
            })
            .collect()
    }

    async fn bucket_counts(&self, month: Month, dimension: Dimension) -> Result<Vec<BucketCount>> {
        self.fetch(&bucket_counts_sql(&self.table(), month, dimension))
            .await
    }

    async fn quality_counts(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<QualityCounts> {
        let rows: Vec<QualityCounts> = self
            .fetch(&quality_counts_sql(&self.table(), start, end))
            .await?;
        Ok(rows.into_iter().next().unwrap_or_default())
    }

    async fn health_check(&self) -> Result<()> {
        self.execute_query("SELECT 1").await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "clickhouse"
    }

    fn snapshot(&self) -> Arc<dyn EventStore> {
        Arc::new(self.clone())
    }
}

// =============================================================================
// Row Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct UserRow {
    user_id: String,
}

#[derive(Debug, Deserialize)]
struct CountRow {
    count: u64,
}

#[derive(Debug, Deserialize)]
struct LastActivityRow {
    user_id: String,
    last_ts: i64,
}

/// Decode a `JSONEachRow` body
fn parse_rows<T: DeserializeOwned>(body: &str) -> Result<Vec<T>> {
    body.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            serde_json::from_str(line).map_err(|e| {
                QueryError::Serialization(format!("failed to parse JSON row: {}", e))
            })
        })
        .collect()
}

// =============================================================================
// SQL Builders
// =============================================================================

fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// ClickHouse `DateTime` literal in UTC
fn datetime_literal(ts: DateTime<Utc>) -> String {
    format!("toDateTime('{}', 'UTC')", ts.format("%Y-%m-%d %H:%M:%S"))
}

/// Predicate selecting identified users' events inside `month`
fn month_filter(month: Month) -> String {
    format!(
        "user_id != '' AND toStartOfMonth(timestamp, 'UTC') = toDate('{}-01')",
        month
    )
}

fn active_users_sql(table: &str, month: Month, threshold: u32) -> String {
    format!(
        "SELECT user_id FROM {} WHERE {} GROUP BY user_id HAVING count() >= {} \
         ORDER BY user_id FORMAT JSONEachRow",
        table,
        month_filter(month),
        threshold
    )
}

fn count_active_users_sql(table: &str, month: Month, threshold: u32) -> String {
    format!(
        "SELECT count() AS count FROM (SELECT user_id FROM {} WHERE {} \
         GROUP BY user_id HAVING count() >= {}) FORMAT JSONEachRow",
        table,
        month_filter(month),
        threshold
    )
}

fn last_activity_sql(table: &str, before: Option<DateTime<Utc>>) -> String {
    let mut filter = "user_id != ''".to_string();
    if let Some(before) = before {
        filter.push_str(&format!(" AND timestamp < {}", datetime_literal(before)));
    }
    format!(
        "SELECT user_id, toUnixTimestamp(max(timestamp)) AS last_ts FROM {} WHERE {} \
         GROUP BY user_id ORDER BY user_id FORMAT JSONEachRow",
        table, filter
    )
}

/// Expression yielding a dimension's bucket, NULL for unknown attributes
fn bucket_expr(dimension: Dimension) -> String {
    let known = |column: &str| {
        format!(
            "if({c} = '' OR {c} = '{u}', NULL, {c})",
            c = column,
            u = UNKNOWN
        )
    };
    match dimension {
        Dimension::Gender => known("gender"),
        Dimension::AgeBand => known("age_band"),
        Dimension::Channel => known("channel"),
        // concat() propagates NULL, so one unknown part nulls the label
        Dimension::Combined => format!(
            "concat({}, '/', {}, '/', {})",
            known("gender"),
            known("age_band"),
            known("channel")
        ),
        Dimension::Weekday => {
            "if(toDayOfWeek(timestamp, 0, 'UTC') <= 5, 'weekday', 'weekend')".to_string()
        }
        Dimension::HourOfDay => "multiIf(toHour(timestamp, 'UTC') < 6, 'night', \
             toHour(timestamp, 'UTC') < 12, 'morning', \
             toHour(timestamp, 'UTC') < 18, 'afternoon', 'evening')"
            .to_string(),
        Dimension::Action => "nullIf(action, '')".to_string(),
    }
}

fn bucket_counts_sql(table: &str, month: Month, dimension: Dimension) -> String {
    format!(
        "SELECT user_id, {} AS bucket, count() AS count FROM {} WHERE {} \
         GROUP BY user_id, bucket ORDER BY user_id, bucket FORMAT JSONEachRow",
        bucket_expr(dimension),
        table,
        month_filter(month)
    )
}

fn quality_counts_sql(table: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    let unknown = |c: &str| format!("{c} = '{u}'", c = c, u = UNKNOWN);
    format!(
        "SELECT count() AS total_events, \
         countIf(user_id != '' AND action != '') AS valid_events, \
         countIf({} OR {} OR {}) AS unknown_events, \
         uniqExactIf(user_id, user_id != '') AS unique_users \
         FROM {} WHERE timestamp >= {} AND timestamp < {} FORMAT JSONEachRow",
        unknown("gender"),
        unknown("age_band"),
        unknown("channel"),
        table,
        datetime_literal(start),
        datetime_literal(end)
    )
}
