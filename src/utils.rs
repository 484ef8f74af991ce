//! Text, date, and URL normalization plus small helpers.
//!
//! The normalizers are pure and total: every function returns a usable value
//! for any input, so a half-broken feed still yields renderable items.
//! - [`clean_text`] / [`strip_html`] for titles and descriptions
//! - [`parse_date`] for arbitrary publish-date strings
//! - [`format_url`] for relative links and image paths

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};
use url::Url;

static CONTROL_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\n\r\t]+").unwrap());
static WS_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
];

const NAIVE_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%B %d, %Y", "%b %d, %Y", "%d %b %Y"];

/// Collapse whitespace runs and decode the handful of entities feeds use.
///
/// Entities are decoded after whitespace is collapsed, so `&nbsp;` next to a
/// space leaves two spaces.
pub fn clean_text(text: &str) -> String {
    let text = CONTROL_WS.replace_all(text, " ");
    let text = WS_RUN.replace_all(&text, " ");
    text.replace("&nbsp;", " ")
        .replace("&#39;", "'")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .trim()
        .to_string()
}

/// Remove every `<...>` span and collapse the whitespace left behind.
///
/// Not an HTML parser: fine for feed descriptions, not for hostile input.
pub fn strip_html(html: &str) -> String {
    let text = TAG.replace_all(html, " ");
    WS_RUN.replace_all(&text, " ").trim().to_string()
}

/// Coerce a publish-date string to an ISO-8601 UTC timestamp.
///
/// Unparseable or empty input yields the current instant.
pub fn parse_date(text: &str) -> String {
    parse_timestamp(text)
        .unwrap_or_else(Utc::now)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt.and_utc());
        }
    }
    for fmt in NAIVE_DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(text, fmt) {
            return d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }
    None
}

/// Make `url` absolute against `base`.
///
/// Missing or empty input, and anything that fails to resolve, returns
/// `base` unchanged. Input already starting with `http` is passed through.
pub fn format_url(url: Option<&str>, base: &str) -> String {
    let url = match url.map(str::trim) {
        Some(u) if !u.is_empty() => u,
        _ => return base.to_string(),
    };
    if url.starts_with("http") {
        return url.to_string();
    }
    Url::parse(base)
        .and_then(|b| b.join(url))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| base.to_string())
}

/// First `max` characters of `s`.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Classify current time into morning, afternoon, or evening.
///
/// Used to name the snapshot file written by the `fetch` command:
/// - **Morning**: 00:00 - 08:00
/// - **Afternoon**: 08:00 - 16:00
/// - **Evening**: 16:00 - 24:00
#[instrument]
pub fn time_of_day() -> String {
    classify_time(Local::now().time()).to_string()
}

fn classify_time(tod: NaiveTime) -> &'static str {
    let eight = NaiveTime::from_hms_opt(8, 0, 0).unwrap_or_default();
    let sixteen = NaiveTime::from_hms_opt(16, 0, 0).unwrap_or_default();
    let which = if tod < eight {
        "morning"
    } else if tod < sixteen {
        "afternoon"
    } else {
        "evening"
    };
    tracing::debug!(%tod, %which, "Computed time_of_day");
    which
}

/// Truncate a string for logging purposes.
///
/// Long strings keep their first `max` characters followed by an ellipsis
/// and the number of bytes dropped.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    let head = truncate_chars(s, max);
    if head.len() == s.len() {
        s.to_string()
    } else {
        format!("{}…(+{} bytes)", head, s.len() - head.len())
    }
}

/// Capitalize the first character of a string.
///
/// ```ignore
/// assert_eq!(upcase("hello"), "Hello");
/// assert_eq!(upcase(""), "");
/// ```
pub fn upcase(s: &str) -> String {
    let mut c = s.chars();
    match c.next() {
        None => String::new(),
        Some(f) => f.to_uppercase().collect::<String>() + c.as_str(),
    }
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then writes and removes a probe file.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_collapses_and_decodes() {
        assert_eq!(
            clean_text("  Tom &amp; Jerry\n\n\tsay &quot;hi&quot; &#39;now&#39; "),
            "Tom & Jerry say \"hi\" 'now'"
        );
        assert_eq!(clean_text("a &lt;b&gt; c"), "a <b> c");
        assert_eq!(clean_text(""), "");
    }

    #[test]
    fn test_clean_text_nbsp_after_collapse() {
        assert_eq!(clean_text("a&nbsp;b"), "a b");
        assert_eq!(clean_text("&nbsp;lead"), "lead");
    }

    #[test]
    fn test_strip_html() {
        assert_eq!(
            strip_html("<p>Hello <b>world</b></p>\n<img src=\"x.png\"/>"),
            "Hello world"
        );
        assert_eq!(strip_html("a <broken"), "a <broken");
        assert_eq!(strip_html("<<x>>"), ">");
    }

    #[test]
    fn test_parse_date_rfc2822() {
        assert_eq!(
            parse_date("Tue, 06 May 2025 14:30:00 GMT"),
            "2025-05-06T14:30:00.000Z"
        );
        assert_eq!(
            parse_date("Tue, 06 May 2025 16:30:00 +0200"),
            "2025-05-06T14:30:00.000Z"
        );
    }

    #[test]
    fn test_parse_date_rfc3339_and_naive() {
        assert_eq!(parse_date("2025-05-06T14:30:00Z"), "2025-05-06T14:30:00.000Z");
        assert_eq!(parse_date("2025-05-06 14:30:00"), "2025-05-06T14:30:00.000Z");
        assert_eq!(parse_date("2025-05-06"), "2025-05-06T00:00:00.000Z");
    }

    #[test]
    fn test_parse_date_falls_back_to_now() {
        let before = Utc::now() - chrono::Duration::seconds(1);
        let parsed = parse_date("not a date");
        let ts = DateTime::parse_from_rfc3339(&parsed).unwrap();
        assert!(ts.with_timezone(&Utc) >= before);
        assert!(parse_date("").ends_with('Z'));
    }

    #[test]
    fn test_format_url_relative() {
        assert_eq!(
            format_url(Some("relative/path"), "https://example.com/base/"),
            "https://example.com/base/relative/path"
        );
        assert_eq!(
            format_url(Some("/img/a.png"), "https://example.com/feed/rss"),
            "https://example.com/img/a.png"
        );
    }

    #[test]
    fn test_format_url_absent_or_absolute() {
        assert_eq!(format_url(None, "https://example.com"), "https://example.com");
        assert_eq!(format_url(Some(""), "https://example.com"), "https://example.com");
        assert_eq!(
            format_url(Some("https://other.org/a"), "https://example.com"),
            "https://other.org/a"
        );
    }

    #[test]
    fn test_format_url_bad_base() {
        assert_eq!(format_url(Some("a/b"), "not a base"), "not a base");
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 10), "hi");
    }

    #[test]
    fn test_truncate_for_log() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");
        let result = truncate_for_log(&"a".repeat(500), 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_upcase() {
        assert_eq!(upcase("hello"), "Hello");
        assert_eq!(upcase(""), "");
        assert_eq!(upcase("a"), "A");
    }

    #[test]
    fn test_classify_time() {
        let at = |h| NaiveTime::from_hms_opt(h, 0, 0).unwrap();
        assert_eq!(classify_time(at(6)), "morning");
        assert_eq!(classify_time(at(8)), "afternoon");
        assert_eq!(classify_time(at(15)), "afternoon");
        assert_eq!(classify_time(at(20)), "evening");
    }
}
