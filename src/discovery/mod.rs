//! Finding new candidate sources from search-engine feeds.
//!
//! One [`Discoverer`] runs one of two strategies:
//!
//! | Strategy | Engines | Produces |
//! |----------|---------|----------|
//! | [`DiscoveryStrategy::FeedScan`] | Google News, Bing News, Tech News | one source per new site linked from the results |
//! | [`DiscoveryStrategy::EngineCatalog`] | google, bing, tech | one source per reachable engine feed |
//!
//! Engines are queried one after another because a site found by an earlier
//! engine must not be added again by a later one. A failing engine is logged
//! and skipped; the run only fails when it found nothing and its engines
//! failed.

pub mod classify;
pub mod engines;

use crate::error::NewsError;
use crate::fetcher::FetchAsync;
use crate::models::{NewsSource, SourceType};
use crate::utils::upcase;
use chrono::Utc;
use classify::{ENGINE_RULES, SITE_RULES, basic_selectors, classify_url, format_source_name, generic_selectors};
use engines::{SearchEngine, catalog_engines, extract_sources_from_feed, feed_scan_engines};
use itertools::Itertools;
use std::collections::HashSet;
use tracing::{debug, error, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum DiscoveryStrategy {
    /// Scan result links for new sites.
    FeedScan,
    /// Turn each engine feed into a source.
    EngineCatalog,
}

impl DiscoveryStrategy {
    pub fn default_engines(&self) -> Vec<SearchEngine> {
        match self {
            DiscoveryStrategy::FeedScan => feed_scan_engines(),
            DiscoveryStrategy::EngineCatalog => catalog_engines(),
        }
    }
}

#[derive(Debug)]
pub struct Discoverer<F> {
    fetcher: F,
    engines: Vec<SearchEngine>,
    strategy: DiscoveryStrategy,
}

impl<F> Discoverer<F>
where
    F: FetchAsync,
{
    pub fn new(fetcher: F, strategy: DiscoveryStrategy) -> Self {
        Self::with_engines(fetcher, strategy, strategy.default_engines())
    }

    pub fn with_engines(fetcher: F, strategy: DiscoveryStrategy, engines: Vec<SearchEngine>) -> Self {
        Self {
            fetcher,
            engines,
            strategy,
        }
    }

    /// Run the configured strategy.
    ///
    /// # Returns
    ///
    /// Newly built sources, all active. An empty list is not an error.
    ///
    /// # Errors
    ///
    /// [`NewsError::DiscoveryFailed`] with the joined engine errors; see
    /// [`Self::discover_sources`] and [`Self::discover_news_sources`] for
    /// when each strategy gives up.
    pub async fn discover(&self) -> Result<Vec<NewsSource>, NewsError> {
        match self.strategy {
            DiscoveryStrategy::FeedScan => self.discover_sources().await,
            DiscoveryStrategy::EngineCatalog => self.discover_news_sources().await,
        }
    }

    /// Scan every engine's results for sites not seen yet in this run.
    ///
    /// Engines are fetched one after another. Each valid result link is
    /// reduced to its origin, and an origin becomes a source only the first
    /// time it is seen across all engines.
    ///
    /// # Errors
    ///
    /// Returns [`NewsError::DiscoveryFailed`] only when nothing was found and
    /// every engine failed to fetch or parse.
    #[instrument(level = "info", skip_all, fields(engines = self.engines.len()))]
    pub async fn discover_sources(&self) -> Result<Vec<NewsSource>, NewsError> {
        let mut discovered: HashSet<String> = HashSet::new();
        let mut sources = Vec::new();
        let mut errors: Vec<String> = Vec::new();

        for engine in &self.engines {
            let origins = match self.fetcher.fetch(&engine.url).await {
                Ok(feed) => extract_sources_from_feed(&feed, engine).map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };
            let origins = match origins {
                Ok(origins) => origins,
                Err(e) => {
                    error!(engine = %engine.name, error = %e, "Search engine failed");
                    errors.push(format!("{}: {}", engine.name, e));
                    continue;
                }
            };

            let before = sources.len();
            for url in origins {
                if !discovered.insert(url.clone()) {
                    continue;
                }
                sources.push(NewsSource {
                    id: format!("source-{}-{}", Utc::now().timestamp_millis(), discovered.len()),
                    name: format_source_name(&url),
                    category: classify_url(&url, SITE_RULES),
                    source_type: SourceType::Website,
                    active: true,
                    selectors: generic_selectors(),
                    url,
                });
            }
            info!(engine = %engine.name, new = sources.len() - before, "Scanned search engine");
        }

        if sources.is_empty() && errors.len() == self.engines.len() && !errors.is_empty() {
            return Err(NewsError::DiscoveryFailed(errors.iter().join(", ")));
        }
        debug!(total = sources.len(), "Discovery finished");
        Ok(sources)
    }

    /// Add every reachable engine feed as a source of its own.
    ///
    /// # Errors
    ///
    /// Returns [`NewsError::DiscoveryFailed`] when no engine was reachable.
    #[instrument(level = "info", skip_all, fields(engines = self.engines.len()))]
    pub async fn discover_news_sources(&self) -> Result<Vec<NewsSource>, NewsError> {
        let mut sources = Vec::new();
        let mut errors: Vec<String> = Vec::new();

        for engine in &self.engines {
            match self.fetcher.fetch(&engine.url).await {
                Ok(_) => sources.push(NewsSource {
                    id: format!("discovered-{}-{}", Utc::now().timestamp_millis(), engine.name),
                    name: format!("{} AI News", upcase(&engine.name)),
                    url: engine.url.clone(),
                    source_type: SourceType::Website,
                    category: classify_url(&engine.url, ENGINE_RULES),
                    active: true,
                    selectors: basic_selectors(),
                }),
                Err(e) => {
                    warn!(engine = %engine.name, error = %e, "Engine feed unreachable");
                    errors.push(e.to_string());
                }
            }
        }

        if sources.is_empty() && !errors.is_empty() {
            return Err(NewsError::DiscoveryFailed(errors.iter().join(", ")));
        }
        info!(total = sources.len(), "Engine catalog discovery finished");
        Ok(sources)
    }
}
