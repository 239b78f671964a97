//! Churn Query - event model and storage backends
//!
//! Provides the [`EventStore`] capability used by the churn engine and its
//! backends:
//! - **Memory**: events held in memory, loaded from JSON Lines files
//! - **ClickHouse**: production events table over the HTTP interface
//!
//! # Usage
//!
//! ```ignore
//! use churn_query::{open_store, StoreConfig};
//!
//! let store = open_store(&StoreConfig::memory("events.jsonl"))?;
//! let active = store.active_users("2024-03".parse()?, 1).await?;
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod event;
pub mod loader;
pub mod month;

// Re-exports
pub use backend::clickhouse::{ClickHouseStore, ClickHouseStoreConfig};
pub use backend::memory::MemoryStore;
pub use backend::{BucketCount, Dimension, EventStore, QualityCounts};
pub use config::{StoreBackend, StoreConfig};
pub use error::{QueryError, Result};
pub use event::{AGE_BANDS, Event, UNKNOWN};
pub use loader::{load_events_jsonl, parse_events_jsonl};
pub use month::{Month, ParseMonthError};

use std::sync::Arc;

/// Open the event store described by `config`
///
/// The memory backend loads `events_path` eagerly; without a path it starts
/// empty. The ClickHouse backend is not contacted until the first query.
pub fn open_store(config: &StoreConfig) -> Result<Arc<dyn EventStore>> {
    match config.backend {
        StoreBackend::Memory => {
            let events = match &config.events_path {
                Some(path) => load_events_jsonl(path)?,
                None => Vec::new(),
            };
            tracing::info!(events = events.len(), "opened memory event store");
            Ok(Arc::new(MemoryStore::with_events(events)))
        }
        StoreBackend::Clickhouse => {
            let ch_config = config.clickhouse_config();
            let store = ClickHouseStore::new(&ch_config)?;
            tracing::info!(
                url = %ch_config.url,
                database = %ch_config.database,
                table = %ch_config.table,
                "opened ClickHouse event store"
            );
            Ok(Arc::new(store))
        }
    }
}

#[cfg(test)]
mod event_test;
