//! Command implementations for the churn CLI

pub mod analyze;
pub mod metrics;
pub mod output;
pub mod report;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use churn_analytics::ChurnEngine;
use churn_config::{Config, StoreBackend};
use clap::Args;

use output::OutputFormat;

/// Store and output arguments shared by every command
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// JSON Lines event file (selects the memory backend, overrides config)
    #[arg(short, long)]
    pub events: Option<PathBuf>,

    /// Output format (table, json)
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Open the configured store and wrap it in an engine
pub fn build_engine(config: &Config, args: &StoreArgs) -> Result<ChurnEngine> {
    let mut store_config = config.store.clone();
    if let Some(ref path) = args.events {
        store_config.backend = StoreBackend::Memory;
        store_config.events_path = Some(path.clone());
    }

    if store_config.backend == StoreBackend::Memory && store_config.events_path.is_none() {
        bail!("no event source: pass --events <file> or set [store] events_path");
    }

    let store = churn_query::open_store(&store_config).context("failed to open event store")?;
    let engine = ChurnEngine::with_settings(store, config.analysis.settings());
    tracing::debug!(store = engine.store_name(), "engine ready");
    Ok(engine)
}
