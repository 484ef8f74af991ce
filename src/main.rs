//! # AI News Feed
//!
//! Fetches AI-related news from a small set of RSS-style sources and
//! normalizes every entry into one renderable item shape. Network trouble is
//! absorbed as close to its origin as possible: requests rotate through CORS
//! proxies, failing sources are replaced by placeholder items, and only a
//! run that produced nothing at all reports an error.
//!
//! ## Usage
//!
//! ```sh
//! ai_news_feed fetch -j ./json
//! ai_news_feed discover --strategy feed-scan -o sources.yaml
//! ```
//!
//! ## Architecture
//!
//! 1. **Discovery**: scan search-engine feeds for candidate sources
//! 2. **Fetching**: fetch active sources in paced batches through rotating proxies
//! 3. **Parsing**: turn each feed into deduplicated, normalized items
//! 4. **Output**: print JSON and optionally write a dated snapshot

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod discovery;
mod error;
mod fetcher;
mod markup;
mod mock;
mod models;
mod orchestrator;
mod output;
mod parser;
mod sources;
mod utils;

use cli::{Cli, Command, DiscoverArgs, FetchArgs};
use discovery::{Discoverer, DiscoveryStrategy};
use fetcher::{HttpTransport, ProxyFetcher};
use orchestrator::fetch_all_news;
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("ai_news_feed starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    match args.command {
        Command::Fetch(fetch_args) => run_fetch(fetch_args).await?,
        Command::Discover(discover_args) => run_discover(discover_args).await?,
    }

    let elapsed = start_time.elapsed();
    info!(?elapsed, secs = elapsed.as_secs(), millis = elapsed.subsec_millis(), "Execution complete");
    Ok(())
}

async fn run_fetch(args: FetchArgs) -> Result<(), Box<dyn Error>> {
    // Fail before any network work if the snapshot can't be written
    if let Some(dir) = &args.json_output_dir {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(path = %dir, error = %e, "JSON output directory is not writable");
            return Err(e);
        }
    }

    let sources = match &args.sources_file {
        Some(path) => sources::load_sources(path).await?,
        None => sources::default_sources(),
    };
    info!(count = sources.len(), "Sources loaded");

    let fetcher = ProxyFetcher::for_sources(HttpTransport::new()?);
    let items = fetch_all_news(&fetcher, &sources, &args.batch_config(), &mut rand::rng()).await?;

    println!("{}", serde_json::to_string_pretty(&items)?);

    if let Some(dir) = &args.json_output_dir {
        let digest = output::build_digest(items);
        if let Err(e) = output::write_digest(&digest, dir).await {
            error!(error = %e, "Failed to write news digest");
        }
    }
    Ok(())
}

async fn run_discover(args: DiscoverArgs) -> Result<(), Box<dyn Error>> {
    let sources = match args.strategy {
        DiscoveryStrategy::FeedScan => {
            let fetcher = ProxyFetcher::for_discovery(HttpTransport::with_browser_headers()?);
            Discoverer::new(fetcher, args.strategy).discover().await?
        }
        DiscoveryStrategy::EngineCatalog => {
            let fetcher = ProxyFetcher::for_sources(HttpTransport::new()?);
            Discoverer::new(fetcher, args.strategy).discover().await?
        }
    };
    info!(count = sources.len(), strategy = ?args.strategy, "Discovered sources");

    match &args.output {
        Some(path) => output::write_sources(&sources, path).await?,
        None => print!("{}", serde_yaml::to_string(&sources)?),
    }
    Ok(())
}
