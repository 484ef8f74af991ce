//! Command-line interface definitions.
//!
//! All options can be provided as flags; the ones that are likely to be set
//! per deployment also read from environment variables.

use crate::discovery::DiscoveryStrategy;
use crate::orchestrator::{BATCH_PAUSE, BATCH_SIZE, BatchConfig};
use clap::{Args, Parser, Subcommand};
use std::time::Duration;

/// Fetch AI news from RSS-style sources, or discover new sources.
///
/// # Examples
///
/// ```sh
/// # Fetch from the built-in sources and print JSON
/// ai_news_feed fetch
///
/// # Fetch from a source list and also write a snapshot
/// ai_news_feed fetch --sources-file sources.yaml -j ./json
///
/// # Discover sources and save them for later fetches
/// ai_news_feed discover --strategy feed-scan --output sources.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch news items from every active source
    Fetch(FetchArgs),
    /// Look for new candidate sources in search-engine feeds
    Discover(DiscoverArgs),
}

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// YAML source list; the built-in sources are used when omitted
    #[arg(short, long, env = "NEWS_SOURCES_FILE")]
    pub sources_file: Option<String>,

    /// Sources fetched concurrently per batch
    #[arg(long, default_value_t = BATCH_SIZE)]
    pub batch_size: usize,

    /// Pause between batches, in milliseconds
    #[arg(long, default_value_t = BATCH_PAUSE.as_millis() as u64)]
    pub batch_pause_ms: u64,

    /// Report failing sources instead of filling in placeholder items
    #[arg(long)]
    pub no_mock_fallback: bool,

    /// Also write a snapshot to `{dir}/{date}/{time_of_day}.json`
    #[arg(short, long, env = "NEWS_JSON_OUTPUT_DIR")]
    pub json_output_dir: Option<String>,
}

impl FetchArgs {
    pub fn batch_config(&self) -> BatchConfig {
        BatchConfig {
            batch_size: self.batch_size,
            pause: Duration::from_millis(self.batch_pause_ms),
            mock_fallback: !self.no_mock_fallback,
        }
    }
}

#[derive(Args, Debug)]
pub struct DiscoverArgs {
    /// How search-engine feeds are turned into sources
    #[arg(long, value_enum, default_value_t = DiscoveryStrategy::FeedScan)]
    pub strategy: DiscoveryStrategy,

    /// Write the discovered sources to this YAML file instead of stdout
    #[arg(short, long)]
    pub output: Option<String>,
}
