//! Data models for news sources and the items fetched from them.
//!
//! - [`NewsSource`]: a configured or discovered feed origin
//! - [`NewsItem`]: one normalized news entry, always renderable
//! - [`NewsDigest`]: the snapshot written by the `fetch` command
//!
//! Field names serialize in camelCase so the output can be consumed directly
//! by a web front end.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Logical field name (`title`, `description`, `date`, `image`) mapped to
/// one or more markup selectors. Hints only; the feed parser does not use them.
pub type Selectors = BTreeMap<String, Vec<String>>;

/// The closed set of topics a source or item can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Research,
    Industry,
    Ethics,
    Applications,
}

impl Category {
    #[cfg(test)]
    pub const ALL: [Category; 4] = [
        Category::Research,
        Category::Industry,
        Category::Ethics,
        Category::Applications,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Research => "Research",
            Category::Industry => "Industry",
            Category::Ethics => "Ethics",
            Category::Applications => "Applications",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of origin. Only plain websites exist today.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    #[default]
    Website,
}

/// A feed origin, either from the seed list or found by discovery.
///
/// Treated as an immutable value: nothing in the pipeline mutates a source
/// after it is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsSource {
    /// Unique within one working set.
    pub id: String,
    /// Display name, copied onto every item fetched from this source.
    pub name: String,
    /// Absolute feed endpoint.
    pub url: String,
    #[serde(rename = "type", default)]
    pub source_type: SourceType,
    pub category: Category,
    /// Inactive sources are skipped by the batch orchestrator.
    pub active: bool,
    #[serde(default)]
    pub selectors: Selectors,
}

/// One normalized news entry.
///
/// `date`, `image_url` and `url` are always populated: missing values fall
/// back to "now", a curated image and the source URL respectively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    /// `"{source id}-{index}"`; unique within one parse only.
    pub id: String,
    pub title: String,
    pub description: String,
    /// Display name of the originating source.
    pub source: String,
    /// ISO-8601 timestamp.
    pub date: String,
    pub image_url: String,
    pub url: String,
    pub category: Category,
    pub is_global_impact: bool,
}

/// Items from one `fetch` run, stamped with the edition they belong to.
#[derive(Debug, Serialize, Deserialize)]
pub struct NewsDigest {
    /// The date of the run in `YYYY-MM-DD` format.
    pub local_date: String,
    /// "morning", "afternoon", or "evening".
    pub time_of_day: String,
    pub local_time: String,
    pub items: Vec<NewsItem>,
}
