//! JSON Lines event loader

use std::fs;
use std::path::Path;

use crate::error::{QueryError, Result};
use crate::event::Event;

/// Load events from a JSON Lines file, one object per line
///
/// Blank lines are skipped. Age bands are normalized.
///
/// # Errors
///
/// Returns `Io` when the file cannot be read and `InvalidEvent` with the
/// 1-based line number for the first undecodable line.
pub fn load_events_jsonl(path: impl AsRef<Path>) -> Result<Vec<Event>> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let events = parse_events_jsonl(&contents)?;

    tracing::debug!(path = %path.display(), events = events.len(), "loaded events");

    Ok(events)
}

/// Parse events from JSON Lines text
pub fn parse_events_jsonl(contents: &str) -> Result<Vec<Event>> {
    let mut events = Vec::new();
    for (index, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let event: Event = serde_json::from_str(line)
            .map_err(|e| QueryError::invalid_event(index + 1, e.to_string()))?;
        events.push(event.normalized());
    }
    Ok(events)
}
