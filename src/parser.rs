//! RSS-style feed parsing into [`NewsItem`]s.
//!
//! Every `<item>` is read in document order. Titles are deduplicated by exact
//! match within one document (first one wins), so two different stories
//! sharing a headline collapse into one item. Images come from the first
//! link in this chain that yields something:
//!
//! 1. `media:content` / `media:thumbnail` `url` attribute
//! 2. `enclosure` whose `type` starts with `image`
//! 3. first `<img src>` inside the description markup
//! 4. [`FALLBACK_IMAGES`] picked by item index

use crate::error::FeedError;
use crate::markup::{self, Element};
use crate::models::{NewsItem, NewsSource};
use crate::utils::{clean_text, format_url, parse_date, strip_html, truncate_chars, truncate_for_log};
use std::collections::HashSet;
use tracing::{debug, error, instrument};

/// Maximum description length in characters, before the ellipsis.
pub const DESCRIPTION_LIMIT: usize = 300;

/// AI-themed images used when an item carries none of its own.
pub const FALLBACK_IMAGES: [&str; 8] = [
    "https://images.unsplash.com/photo-1677442136019-21780ecad995",
    "https://images.unsplash.com/photo-1620712943543-bcc4688e7485",
    "https://images.unsplash.com/photo-1584036561566-baf8f5f1b144",
    "https://images.unsplash.com/photo-1526628953301-3e589a6a8b74",
    "https://images.unsplash.com/photo-1591453089816-0fbb971b454c",
    "https://images.unsplash.com/photo-1589254065878-42c9da997008",
    "https://images.unsplash.com/photo-1677442136019-21780ecad995",
    "https://images.unsplash.com/photo-1488229297570-58520851e868",
];

/// Fallback image for the item at `index`.
pub fn fallback_image(index: usize) -> &'static str {
    FALLBACK_IMAGES[index % FALLBACK_IMAGES.len()]
}

/// Parse one raw feed document fetched from `source`.
///
/// # Arguments
///
/// * `raw` - The feed body as returned by the fetcher
/// * `source` - The source it came from; supplies the item id prefix, display
///   name, category, and the base URL for relative links and images
///
/// # Returns
///
/// Items in document order, one per `<item>` with a new non-empty title, a
/// description, and a link.
///
/// Never fails: a document that cannot be read is logged and yields no items.
#[instrument(level = "debug", skip_all, fields(source = %source.id))]
pub fn parse_feed(raw: &str, source: &NewsSource) -> Vec<NewsItem> {
    match try_parse_feed(raw, source) {
        Ok(items) => {
            debug!(count = items.len(), "Parsed feed");
            items
        }
        Err(e) => {
            error!(
                error = %e,
                preview = %truncate_for_log(raw, 200),
                "Parsing error; dropping feed"
            );
            Vec::new()
        }
    }
}

fn try_parse_feed(raw: &str, source: &NewsSource) -> Result<Vec<NewsItem>, FeedError> {
    let root = markup::parse_xml(raw)?;
    let mut seen = HashSet::new();
    let mut items = Vec::new();

    for (i, entry) in root.find("item").into_iter().enumerate() {
        let title = child_text(entry, "title");
        if title.is_empty() || !seen.insert(title.clone()) {
            continue;
        }

        let description = child_text(entry, "description");
        let date_text = child_text(entry, "pubDate");
        let link = entry_link(entry);
        let image = extract_image(entry, &description).unwrap_or_else(|| fallback_image(i).to_string());

        if description.is_empty() || link.is_empty() {
            continue;
        }

        let description = clean_text(&strip_html(&description));
        items.push(NewsItem {
            id: format!("{}-{}", source.id, i),
            title: clean_text(&title),
            description: format!("{}...", truncate_chars(&description, DESCRIPTION_LIMIT)),
            source: source.name.clone(),
            date: parse_date(&date_text),
            image_url: format_url(Some(&image), &source.url),
            url: format_url(Some(&link), &source.url),
            category: source.category,
            is_global_impact: false,
        });
    }

    Ok(items)
}

fn child_text(entry: &Element, name: &str) -> String {
    entry.first(name).map(Element::text).unwrap_or_default()
}

/// RSS puts the link in the element text; Atom-style feeds use `href`.
fn entry_link(entry: &Element) -> String {
    match entry.first("link") {
        Some(link) => {
            let text = link.text();
            if text.is_empty() {
                link.attr("href").unwrap_or_default().trim().to_string()
            } else {
                text
            }
        }
        None => String::new(),
    }
}

fn extract_image(entry: &Element, description: &str) -> Option<String> {
    let media = entry
        .find_any(&["media:content", "media:thumbnail"])
        .into_iter()
        .next()
        .and_then(|m| m.attr("url"))
        .filter(|u| !u.is_empty());
    let enclosure = || {
        entry
            .find("enclosure")
            .into_iter()
            .find(|e| e.attr("type").is_some_and(|t| t.starts_with("image")))
            .and_then(|e| e.attr("url"))
            .filter(|u| !u.is_empty())
    };

    media
        .or_else(enclosure)
        .map(str::to_string)
        .or_else(|| markup::first_img_src(description))
        .filter(|u| !u.is_empty())
}
