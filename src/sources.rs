//! Built-in seed sources and YAML source lists.
//!
//! A source list file is a YAML sequence of [`NewsSource`] values, the same
//! shape `discover --output` writes, so discovered sources can be reviewed
//! and fed back into `fetch --sources-file`.

use crate::error::NewsError;
use crate::models::{Category, NewsSource, Selectors, SourceType};
use std::collections::HashSet;
use tokio::fs;
use tracing::{info, instrument};

fn selectors(title: &str, description: &str, date: &str, image: &str) -> Selectors {
    [
        ("title", title),
        ("description", description),
        ("date", date),
        ("image", image),
    ]
    .into_iter()
    .map(|(field, sel)| (field.to_string(), vec![sel.to_string()]))
    .collect()
}

/// The sources used when no list is supplied.
pub fn default_sources() -> Vec<NewsSource> {
    vec![
        NewsSource {
            id: "ai-news".to_string(),
            name: "AI News Daily".to_string(),
            url: "https://news.google.com/rss/search?q=artificial+intelligence+when:7d&hl=en-US&gl=US&ceid=US:en".to_string(),
            source_type: SourceType::Website,
            category: Category::Industry,
            active: true,
            selectors: selectors("h3.article-title", ".article-description", ".article-date", ".article-image"),
        },
        NewsSource {
            id: "ai-research".to_string(),
            name: "AI Research Updates".to_string(),
            url: "https://arxiv.org/list/cs.AI/recent".to_string(),
            source_type: SourceType::Website,
            category: Category::Research,
            active: true,
            selectors: selectors(".list-title", ".abstract", ".list-date", ".paper-image"),
        },
        NewsSource {
            id: "ai-ethics".to_string(),
            name: "AI Ethics Forum".to_string(),
            url: "https://news.google.com/rss/search?q=artificial+intelligence+ethics+when:7d&hl=en-US&gl=US&ceid=US:en".to_string(),
            source_type: SourceType::Website,
            category: Category::Ethics,
            active: true,
            selectors: selectors(".title", ".description", ".date", ".image"),
        },
    ]
}

/// Decode a YAML source list, rejecting duplicate ids and relative URLs.
pub fn parse_source_list(yaml: &str, path: &str) -> Result<Vec<NewsSource>, NewsError> {
    let invalid = |reason: String| NewsError::SourceList {
        path: path.to_string(),
        reason,
    };
    let sources: Vec<NewsSource> = serde_yaml::from_str(yaml).map_err(|e| invalid(e.to_string()))?;

    let mut ids = HashSet::new();
    for source in &sources {
        if !ids.insert(source.id.as_str()) {
            return Err(invalid(format!("duplicate source id {}", source.id)));
        }
        if url::Url::parse(&source.url).is_err() {
            return Err(invalid(format!("source {} has a non-absolute url", source.id)));
        }
    }
    Ok(sources)
}

/// Read a YAML source list from disk.
#[instrument(level = "info")]
pub async fn load_sources(path: &str) -> Result<Vec<NewsSource>, NewsError> {
    let yaml = fs::read_to_string(path).await.map_err(|e| NewsError::SourceList {
        path: path.to_string(),
        reason: e.to_string(),
    })?;
    let sources = parse_source_list(&yaml, path)?;
    info!(count = sources.len(), "Loaded source list");
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sources_are_unique_and_active() {
        let sources = default_sources();
        assert_eq!(sources.len(), 3);
        let ids: HashSet<_> = sources.iter().map(|s| s.id.clone()).collect();
        assert_eq!(ids.len(), 3);
        assert!(sources.iter().all(|s| s.active));
        assert!(sources.iter().all(|s| s.selectors.len() == 4));
    }

    #[test]
    fn test_source_list_round_trips_through_yaml() {
        let yaml = serde_yaml::to_string(&default_sources()).unwrap();
        let parsed = parse_source_list(&yaml, "inline").unwrap();
        assert_eq!(parsed, default_sources());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let yaml = r#"
- id: a
  name: A
  url: https://a.com/rss
  category: Industry
  active: true
- id: a
  name: A again
  url: https://b.com/rss
  category: Research
  active: true
"#;
        let err = parse_source_list(yaml, "dup.yaml").unwrap_err();
        assert!(err.to_string().contains("duplicate source id a"));
    }

    #[test]
    fn test_relative_url_rejected() {
        let yaml = "- id: a\n  name: A\n  url: /rss\n  category: Industry\n  active: true\n";
        assert!(parse_source_list(yaml, "rel.yaml").is_err());
    }

    #[tokio::test]
    async fn test_load_sources_missing_file() {
        let err = load_sources("/nonexistent/sources.yaml").await.unwrap_err();
        assert!(matches!(err, NewsError::SourceList { .. }));
    }
}
