//! Heuristics for judging and describing candidate sources.
//!
//! Everything here works on the URL alone: no page is fetched to decide
//! whether a site is a news source, what it is called, or what it covers.

use crate::models::{Category, Selectors};
use crate::utils::upcase;
use url::Url;

/// Social networks, aggregators and search engines. Matched as a substring
/// of the hostname, so subdomains are excluded too.
pub const EXCLUDED_DOMAINS: [&str; 8] = [
    "facebook.com",
    "twitter.com",
    "instagram.com",
    "youtube.com",
    "linkedin.com",
    "google.com",
    "bing.com",
    "reddit.com",
];

pub const VALID_TLDS: [&str; 6] = [".com", ".org", ".net", ".edu", ".gov", ".io"];

/// Keywords that, found anywhere in the lowercase URL, imply a category.
/// Rules are checked in order; no match means [`Category::Industry`].
pub type KeywordRules = &'static [(Category, &'static [&'static str])];

/// Rules used when scanning search feeds for new sites.
pub const SITE_RULES: KeywordRules = &[
    (Category::Research, &["research", "science", "arxiv"]),
    (Category::Ethics, &["ethics", "policy", "governance"]),
    (Category::Applications, &["application", "implementation", "solution"]),
];

/// Rules used when a search engine feed itself becomes the source.
pub const ENGINE_RULES: KeywordRules = &[
    (Category::Research, &["research", "arxiv"]),
    (Category::Ethics, &["ethics", "policy"]),
    (Category::Applications, &["application", "implementation"]),
];

/// Whether `url` looks like a news site worth adding as a source.
pub fn is_valid_news_source(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let Some(domain) = parsed.host_str().map(str::to_lowercase) else {
        return false;
    };

    if EXCLUDED_DOMAINS.iter().any(|excluded| domain.contains(excluded)) {
        return false;
    }
    VALID_TLDS.iter().any(|tld| domain.ends_with(tld))
}

/// Scheme and host (plus non-default port) of `url`, e.g. `https://example.com`.
pub fn origin_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let origin = parsed.origin();
    origin.is_tuple().then(|| origin.ascii_serialization())
}

pub fn classify_url(url: &str, rules: KeywordRules) -> Category {
    let content = url.to_lowercase();
    rules
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| content.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::Industry)
}

/// Display name derived from the hostname: `https://www.ai-weekly.com`
/// becomes `Ai Weekly AI News`.
pub fn format_source_name(url: &str) -> String {
    let Some(host) = Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_string)) else {
        return "AI News Source".to_string();
    };
    let host = host.strip_prefix("www.").unwrap_or(&host);
    let label = host.split('.').next().unwrap_or_default();
    let words = label.split('-').map(upcase).collect::<Vec<_>>().join(" ");
    format!("{} AI News", words)
}

fn selector_map(fields: [(&str, &[&str]); 4]) -> Selectors {
    fields
        .into_iter()
        .map(|(field, sels)| (field.to_string(), sels.iter().map(|s| s.to_string()).collect()))
        .collect()
}

/// Site-agnostic selectors covering the usual article page layouts.
pub fn generic_selectors() -> Selectors {
    selector_map([
        (
            "title",
            &[
                "h1.article-title",
                "h1.entry-title",
                "h1.post-title",
                "article h1",
                ".article-header h1",
                ".post-header h1",
            ],
        ),
        (
            "description",
            &[
                ".article-content p:first-of-type",
                ".entry-content p:first-of-type",
                ".post-content p:first-of-type",
                "article p:first-of-type",
                ".article-description",
                ".article-summary",
            ],
        ),
        (
            "date",
            &[
                "time",
                ".article-date",
                ".post-date",
                ".entry-date",
                "meta[property=\"article:published_time\"]",
                ".published-date",
            ],
        ),
        (
            "image",
            &[
                ".article-image img",
                ".post-image img",
                ".featured-image img",
                "article img:first-of-type",
                "meta[property=\"og:image\"]",
                ".entry-content img:first-of-type",
            ],
        ),
    ])
}

/// Minimal selectors attached to engine-catalog sources.
pub fn basic_selectors() -> Selectors {
    selector_map([
        ("title", &["h2", "h3", ".title"]),
        ("description", &["p", ".description", ".content"]),
        ("date", &["time", ".date", ".published"]),
        ("image", &["img", ".image", ".thumbnail"]),
    ])
}
