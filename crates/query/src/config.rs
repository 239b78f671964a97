//! Event store configuration types

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::backend::clickhouse::ClickHouseStoreConfig;

/// Event store backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Events loaded into memory from a JSON Lines file
    #[default]
    Memory,
    /// ClickHouse events table over HTTP
    Clickhouse,
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::Clickhouse => write!(f, "clickhouse"),
        }
    }
}

/// Event store configuration
///
/// # Example
///
/// ```toml
/// [store]
/// backend = "clickhouse"
/// clickhouse_url = "http://localhost:8123"
/// clickhouse_database = "analytics"
/// clickhouse_table = "events"
///
/// # Or a local file
/// [store]
/// backend = "memory"
/// events_path = "./events.jsonl"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backend type
    pub backend: StoreBackend,

    /// JSON Lines file for the memory backend
    pub events_path: Option<PathBuf>,

    /// ClickHouse HTTP URL
    /// Default: "http://localhost:8123"
    pub clickhouse_url: Option<String>,

    /// ClickHouse database name
    /// Default: "default"
    pub clickhouse_database: Option<String>,

    /// ClickHouse events table
    /// Default: "events"
    pub clickhouse_table: Option<String>,

    /// ClickHouse username
    pub clickhouse_username: Option<String>,

    /// ClickHouse password
    pub clickhouse_password: Option<String>,
}

impl StoreConfig {
    /// Config for the memory backend reading `path`
    pub fn memory(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: StoreBackend::Memory,
            events_path: Some(path.into()),
            ..Default::default()
        }
    }

    /// Config for the ClickHouse backend
    pub fn clickhouse(url: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            backend: StoreBackend::Clickhouse,
            clickhouse_url: Some(url.into()),
            clickhouse_database: Some(database.into()),
            ..Default::default()
        }
    }

    /// Resolve the ClickHouse connection settings, filling defaults
    pub fn clickhouse_config(&self) -> ClickHouseStoreConfig {
        let defaults = ClickHouseStoreConfig::default();
        let mut config = ClickHouseStoreConfig {
            url: self.clickhouse_url.clone().unwrap_or(defaults.url),
            database: self.clickhouse_database.clone().unwrap_or(defaults.database),
            table: self.clickhouse_table.clone().unwrap_or(defaults.table),
            ..defaults
        };

        if let (Some(user), Some(pass)) = (&self.clickhouse_username, &self.clickhouse_password) {
            config = config.with_credentials(user, pass);
        }

        config
    }
}
