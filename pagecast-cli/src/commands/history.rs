//! History command implementation

use crate::paths::Paths;
use anyhow::{Context, Result};
use pagecast_core::history::JsonHistoryStore;

/// List the last chapter read of every series
pub async fn history(paths: &Paths, json: bool) -> Result<()> {
    let store = JsonHistoryStore::new(&paths.history_file);
    let entries = store
        .load()
        .await
        .with_context(|| format!("Failed to load history {}", paths.history_file.display()))?;

    let mut entries: Vec<_> = entries.into_values().collect();
    entries.sort_by(|a, b| b.read_at.cmp(&a.read_at));

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No history");
        return Ok(());
    }

    for entry in entries {
        let series = if entry.series.is_empty() {
            entry.source.as_str()
        } else {
            entry.series.as_str()
        };
        println!(
            "{}  {} - #{} {} ({} pages)",
            entry.read_at.format("%Y-%m-%d %H:%M"),
            series,
            entry.index,
            entry.chapter,
            entry.pages
        );
    }

    Ok(())
}
