//! Writing fetch snapshots and discovered source lists.
//!
//! # Output Structure
//!
//! ```text
//! json_output_dir/
//! └── 2025-05-06/
//!     ├── morning.json
//!     ├── afternoon.json
//!     └── evening.json
//! ```
//!
//! Discovered sources are written as a YAML list that `fetch --sources-file`
//! reads back.

use crate::models::{NewsDigest, NewsItem, NewsSource};
use crate::utils::time_of_day;
use chrono::Local;
use std::error::Error;
use tokio::fs;
use tracing::{error, info, instrument};

/// Stamp `items` with the current local date and edition.
pub fn build_digest(items: Vec<NewsItem>) -> NewsDigest {
    let now = Local::now();
    NewsDigest {
        local_date: now.date_naive().to_string(),
        time_of_day: time_of_day(),
        local_time: now.time().to_string(),
        items,
    }
}

/// Write a [`NewsDigest`] to `{json_output_dir}/{date}/{time_of_day}.json`.
///
/// Returns the path written.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir))]
pub async fn write_digest(digest: &NewsDigest, json_output_dir: &str) -> Result<String, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(digest)?;

    let full_json_dir = format!("{}/{}", json_output_dir.trim_end_matches('/'), digest.local_date);
    info!(%full_json_dir, "Ensuring JSON directory exists");
    if let Err(e) = fs::create_dir_all(&full_json_dir).await {
        error!(%full_json_dir, error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let output_json_filename = format!("{}/{}.json", full_json_dir, digest.time_of_day);
    fs::write(&output_json_filename, json).await?;
    info!(path = %output_json_filename, items = digest.items.len(), "Wrote news digest");

    Ok(output_json_filename)
}

/// Write discovered sources as a YAML source list.
#[instrument(level = "info", skip(sources))]
pub async fn write_sources(sources: &[NewsSource], path: &str) -> Result<(), Box<dyn Error>> {
    let yaml = serde_yaml::to_string(sources)?;
    fs::write(path, yaml).await?;
    info!(count = sources.len(), "Wrote source list");
    Ok(())
}
