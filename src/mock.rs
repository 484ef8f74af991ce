//! Placeholder items used when a source cannot be fetched or parses empty.
//!
//! The title table is a total match over [`Category`], so every source gets
//! exactly three items. Only `is_global_impact` is random, drawn from the
//! caller's [`Rng`] so tests can pin it.

use crate::models::{Category, NewsItem, NewsSource};
use chrono::{SecondsFormat, Utc};
use rand::Rng;

/// Probability that a placeholder item is flagged as global impact.
pub const MOCK_IMPACT_PROBABILITY: f64 = 0.3;

fn mock_titles(category: Category) -> [&'static str; 3] {
    match category {
        Category::Research => [
            "New breakthrough in machine learning efficiency",
            "Advanced neural network architecture discovered",
            "Quantum computing milestone in AI processing",
        ],
        Category::Industry => [
            "Tech giant unveils new AI platform",
            "Startup revolutionizes AI-driven automation",
            "Major investment in AI infrastructure announced",
        ],
        Category::Ethics => [
            "New AI ethics guidelines proposed",
            "Study reveals AI bias concerns",
            "Framework for responsible AI development",
        ],
        Category::Applications => [
            "AI solution transforms healthcare diagnostics",
            "Smart cities embrace AI technology",
            "AI-powered education platform launches",
        ],
    }
}

/// Three canned items for `source`.
pub fn mock_news_for_source<R: Rng>(source: &NewsSource, rng: &mut R) -> Vec<NewsItem> {
    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    let description = format!(
        "Latest developments in {} showcase promising advancements in artificial intelligence technology...",
        source.category.as_str().to_lowercase()
    );

    mock_titles(source.category)
        .iter()
        .enumerate()
        .map(|(index, title)| NewsItem {
            id: format!("{}-mock-{}", source.id, index),
            title: title.to_string(),
            description: description.clone(),
            source: source.name.clone(),
            date: now.clone(),
            image_url: format!(
                "https://source.unsplash.com/800x600/?artificial-intelligence&sig={}-{}",
                source.id, index
            ),
            url: source.url.clone(),
            category: source.category,
            is_global_impact: rng.random_bool(MOCK_IMPACT_PROBABILITY),
        })
        .collect()
}
