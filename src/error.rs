//! Error types for fetching, parsing, and discovering news.
//!
//! Failures are recovered as close to their origin as possible. Only
//! [`NewsError`] ever reaches the caller of a whole pipeline run, and only
//! when that run produced nothing usable.

use thiserror::Error;

/// A single fetch attempt (or a whole exhausted retry budget) failed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request did not complete before the attempt timeout.
    #[error("request timed out")]
    Timeout,

    /// The endpoint answered with something other than `200 OK`.
    #[error("unexpected status {0}")]
    Status(u16),

    /// The body was not usable as text.
    #[error("invalid response data: {0}")]
    NonText(String),

    /// Transport-level failure (DNS, TLS, connection reset, ...).
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// No proxy endpoints were configured.
    #[error("no proxy endpoints configured")]
    NoProxies,

    /// Every attempt allowed by the retry policy failed.
    #[error("all {attempts} attempts failed for {url}: {last}")]
    Exhausted {
        url: String,
        attempts: usize,
        last: Box<FetchError>,
    },
}

/// The raw feed document could not be read as markup.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("malformed feed markup: {0}")]
    Xml(#[from] quick_xml::Error),
}

/// Failures surfaced to the caller of a pipeline run.
#[derive(Debug, Error)]
pub enum NewsError {
    /// Every active source failed and nothing was produced.
    #[error("Failed to fetch news from all sources: {0}")]
    AllSourcesFailed(String),

    /// Discovery produced no sources and its engines failed.
    #[error("Failed to discover new sources: {0}")]
    DiscoveryFailed(String),

    /// A source was fetched and parsed but yielded no items.
    #[error("no items parsed from {0}")]
    EmptyFeed(String),

    /// A per-source fetch failed.
    #[error("{source_name}: {error}")]
    Source {
        source_name: String,
        #[source]
        error: FetchError,
    },

    /// A source list file could not be read or decoded.
    #[error("invalid source list {path}: {reason}")]
    SourceList { path: String, reason: String },
}
