//! Batched, isolated fetching of every active source.
//!
//! # Pipeline
//!
//! 1. Keep only `active` sources
//! 2. Split them into batches of [`BatchConfig::batch_size`]
//! 3. Fetch and parse every source in a batch concurrently; wait for all
//! 4. Pause between batches to go easy on the shared proxies
//!
//! A failing source never affects its neighbours. Its slot is filled with
//! placeholder items from [`crate::mock`] unless fallback is disabled, in
//! which case the failure is recorded. The run only fails when nothing at
//! all was produced and at least one failure was recorded.

use crate::error::NewsError;
use crate::fetcher::FetchAsync;
use crate::mock::mock_news_for_source;
use crate::models::{NewsItem, NewsSource};
use crate::parser::parse_feed;
use futures::future::join_all;
use itertools::Itertools;
use rand::Rng;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

pub const BATCH_SIZE: usize = 2;
pub const BATCH_PAUSE: Duration = Duration::from_secs(2);

/// Phrases that mark a story as having global impact.
pub const GLOBAL_IMPACT_TERMS: [&str; 7] = [
    "worldwide",
    "global",
    "breakthrough",
    "revolutionary",
    "major advancement",
    "groundbreaking",
    "first-ever",
];

/// Batching and fallback knobs for [`fetch_all_news`].
#[derive(Debug, Clone, PartialEq)]
pub struct BatchConfig {
    /// Sources fetched concurrently per batch.
    pub batch_size: usize,
    /// Pause between consecutive batches.
    pub pause: Duration,
    /// Replace failed or empty sources with placeholder items.
    pub mock_fallback: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: BATCH_SIZE,
            pause: BATCH_PAUSE,
            mock_fallback: true,
        }
    }
}

/// Case-insensitive keyword scan over title and description.
pub fn detect_global_impact(title: &str, description: &str) -> bool {
    let content = format!("{} {}", title, description).to_lowercase();
    GLOBAL_IMPACT_TERMS.iter().any(|term| content.contains(term))
}

#[instrument(level = "info", skip_all, fields(source = %source.id))]
async fn fetch_news_from_source<F: FetchAsync>(
    fetcher: &F,
    source: &NewsSource,
) -> Result<Vec<NewsItem>, NewsError> {
    let raw = fetcher.fetch(&source.url).await.map_err(|error| NewsError::Source {
        source_name: source.name.clone(),
        error,
    })?;

    let items = parse_feed(&raw, source);
    if items.is_empty() {
        return Err(NewsError::EmptyFeed(source.name.clone()));
    }

    info!(count = items.len(), "Parsed source feed");
    Ok(items
        .into_iter()
        .map(|mut item| {
            item.is_global_impact = detect_global_impact(&item.title, &item.description);
            item
        })
        .collect())
}

/// Fetch every active source in paced, concurrent batches.
///
/// Output order follows input order, batch by batch, regardless of which
/// fetch finishes first.
///
/// # Arguments
///
/// * `fetcher` - Fetches each source URL; usually a [`crate::fetcher::ProxyFetcher`]
/// * `sources` - Candidate sources; inactive ones are never fetched
/// * `config` - Batch size, pause between batches, and whether failed
///   sources are replaced by placeholder items
/// * `rng` - Only drives the placeholder impact flag
///
/// # Returns
///
/// Every item produced, with `is_global_impact` set on real items.
///
/// # Errors
///
/// Returns [`NewsError::AllSourcesFailed`] when no item was produced and at
/// least one source failure was recorded. With fallback enabled failures are
/// never recorded, so this only happens with `mock_fallback: false`.
#[instrument(level = "info", skip_all, fields(sources = sources.len()))]
pub async fn fetch_all_news<F, R>(
    fetcher: &F,
    sources: &[NewsSource],
    config: &BatchConfig,
    rng: &mut R,
) -> Result<Vec<NewsItem>, NewsError>
where
    F: FetchAsync,
    R: Rng,
{
    let t0 = Instant::now();
    let active: Vec<&NewsSource> = sources.iter().filter(|s| s.active).collect();
    let batch_size = config.batch_size.max(1);
    let batch_count = active.len().div_ceil(batch_size);
    info!(active = active.len(), batch_size, batch_count, "Fetching news");

    let mut all_news = Vec::new();
    let mut errors = Vec::new();

    for (n, batch) in active.chunks(batch_size).enumerate() {
        debug!(batch = n, size = batch.len(), "Starting batch");
        let results = join_all(batch.iter().map(|source| fetch_news_from_source(fetcher, source))).await;

        for (source, result) in batch.iter().zip(results) {
            match result {
                Ok(items) => all_news.extend(items),
                Err(e) if config.mock_fallback => {
                    warn!(source = %source.name, error = %e, "Falling back to mock data");
                    all_news.extend(mock_news_for_source(source, rng));
                }
                Err(e) => {
                    error!(source = %source.name, error = %e, "Error fetching source");
                    errors.push(e);
                }
            }
        }

        if n + 1 < batch_count {
            sleep(config.pause).await;
        }
    }

    info!(
        items = all_news.len(),
        failed = errors.len(),
        elapsed_ms = t0.elapsed().as_millis(),
        "Finished fetching news"
    );

    if all_news.is_empty() && !errors.is_empty() {
        return Err(NewsError::AllSourcesFailed(
            errors.iter().map(ToString::to_string).join(", "),
        ));
    }
    Ok(all_news)
}
