//! Search-engine feeds that discovery reads from.

use super::classify::{is_valid_news_source, origin_of};
use crate::error::FeedError;
use crate::markup;
use itertools::Itertools;
use tracing::debug;

/// Where result entries, their links, and their headlines live in an
/// engine's feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSelectors {
    pub results: String,
    pub link: String,
    /// Only used to label skipped results in logs.
    pub title: Option<String>,
}

impl EngineSelectors {
    fn rss() -> Self {
        Self {
            results: "item".to_string(),
            link: "link".to_string(),
            title: Some("title".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchEngine {
    pub name: String,
    pub url: String,
    pub selectors: EngineSelectors,
}

impl SearchEngine {
    pub fn rss(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            selectors: EngineSelectors::rss(),
        }
    }
}

/// Engines whose results are scanned for new sites.
pub fn feed_scan_engines() -> Vec<SearchEngine> {
    vec![
        SearchEngine::rss(
            "Google News",
            "https://news.google.com/rss/search?q=artificial+intelligence&hl=en-US&gl=US&ceid=US:en",
        ),
        SearchEngine::rss(
            "Bing News",
            "https://www.bing.com/news/search?q=artificial+intelligence+news+source&format=rss",
        ),
        SearchEngine::rss(
            "Tech News",
            "https://news.google.com/rss/search?q=artificial+intelligence+technology+news&hl=en-US&gl=US&ceid=US:en",
        ),
    ]
}

/// Engines whose feeds become sources themselves.
pub fn catalog_engines() -> Vec<SearchEngine> {
    vec![
        SearchEngine::rss(
            "google",
            "https://news.google.com/rss/search?q=artificial+intelligence&hl=en-US&gl=US&ceid=US:en",
        ),
        SearchEngine::rss(
            "bing",
            "https://www.bing.com/news/search?q=artificial+intelligence&format=rss",
        ),
        SearchEngine::rss("tech", "https://techcrunch.com/tag/artificial-intelligence/feed/"),
    ]
}

/// Origins of every valid news link in an engine's feed, first-seen order,
/// without duplicates.
pub fn extract_sources_from_feed(raw: &str, engine: &SearchEngine) -> Result<Vec<String>, FeedError> {
    let root = markup::parse_xml(raw)?;
    let selectors = &engine.selectors;
    let origins = root
        .find(&selectors.results)
        .into_iter()
        .filter_map(|result| {
            let link = result.first(&selectors.link)?.text();
            if is_valid_news_source(&link) {
                return Some(link);
            }
            let title = selectors
                .title
                .as_deref()
                .and_then(|t| result.first(t))
                .map(|t| t.text())
                .unwrap_or_default();
            debug!(engine = %engine.name, %title, %link, "Skipping result link");
            None
        })
        .filter_map(|link| origin_of(&link))
        .unique()
        .collect();
    Ok(origins)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_sources_from_feed() {
        let raw = r#"<rss><channel>
            <item><title>a</title><link>https://www.wired.com/story/one</link></item>
            <item><title>b</title><link>https://twitter.com/someone</link></item>
            <item><title>c</title><link>https://www.wired.com/story/two</link></item>
            <item><title>d</title><link>https://example.io/post</link></item>
            <item><title>e</title><link>https://bbc.co.uk/news</link></item>
            <item><title>f</title></item>
        </channel></rss>"#;
        let engine = SearchEngine::rss("Test", "https://engine.example.com/rss");
        assert_eq!(
            extract_sources_from_feed(raw, &engine).unwrap(),
            vec!["https://www.wired.com", "https://example.io"]
        );
    }

    #[test]
    fn test_engine_tables() {
        assert_eq!(feed_scan_engines().len(), 3);
        assert!(feed_scan_engines().iter().all(|e| e.selectors.title.as_deref() == Some("title")));
        let names: Vec<_> = catalog_engines().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["google", "bing", "tech"]);
    }
}
