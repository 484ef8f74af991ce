//! Small queryable markup tree for feed documents.
//!
//! Feeds are read in XML mode with `quick-xml` into an [`Element`] tree that
//! supports the lookups the parser needs: descendants by tag name, first
//! match, attribute values, and trimmed text content. Reading is permissive:
//! bare `&` outside CDATA is escaped before reading, end-tag names are not
//! checked, stray end tags are ignored, and elements still open at EOF are
//! closed. Entities XML does not define (`&nbsp;` and friends) are kept
//! verbatim in text so later cleaning can decode them.
//!
//! HTML embedded in descriptions is queried in lenient mode with `scraper`.

use crate::error::FeedError;
use once_cell::sync::Lazy;
use quick_xml::Reader;
use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::{BytesRef, BytesStart, Event};
use regex::{Captures, Regex};
use scraper::{Html, Selector};
use std::borrow::Cow;

const ROOT: &str = "#document";

/// A CDATA section (left alone) or an ampersand with its optional reference.
static AMPERSAND: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!\[CDATA\[.*?\]\]>|&(#?\w+;)?").unwrap());

/// An element and everything nested inside it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub name: String,
    attrs: Vec<(String, String)>,
    children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Element(Element),
    Text(String),
}

impl Element {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    fn from_start(start: &BytesStart<'_>) -> Self {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let attrs = start
            .attributes()
            .with_checks(false)
            .flatten()
            .map(|a| {
                let value = match a.unescape_value() {
                    Ok(v) => v.into_owned(),
                    // unknown entities: decode what HTML knows, keep the rest
                    Err(_) => html_escape::decode_html_entities(&String::from_utf8_lossy(&a.value)).into_owned(),
                };
                (String::from_utf8_lossy(a.key.as_ref()).into_owned(), value)
            })
            .collect();
        Self {
            name,
            attrs,
            children: Vec::new(),
        }
    }

    /// All descendants named `name`, in document order.
    pub fn find(&self, name: &str) -> Vec<&Element> {
        self.find_any(&[name])
    }

    /// All descendants whose name is any of `names`, in document order.
    pub fn find_any(&self, names: &[&str]) -> Vec<&Element> {
        let mut out = Vec::new();
        self.collect(names, &mut out);
        out
    }

    fn collect<'a>(&'a self, names: &[&str], out: &mut Vec<&'a Element>) {
        for child in &self.children {
            if let Node::Element(el) = child {
                if names.contains(&el.name.as_str()) {
                    out.push(el);
                }
                el.collect(names, out);
            }
        }
    }

    /// First descendant named `name`.
    pub fn first(&self, name: &str) -> Option<&Element> {
        self.find(name).into_iter().next()
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Concatenated text of this element and its descendants, trimmed.
    pub fn text(&self) -> String {
        let mut buf = String::new();
        self.push_text(&mut buf);
        buf.trim().to_string()
    }

    fn push_text(&self, buf: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(t) => buf.push_str(t),
                Node::Element(el) => el.push_text(buf),
            }
        }
    }

    fn push_str(&mut self, text: &str) {
        if let Some(Node::Text(last)) = self.children.last_mut() {
            last.push_str(text);
        } else {
            self.children.push(Node::Text(text.to_string()));
        }
    }
}

/// Parse a feed document in XML mode. The returned root wraps the whole
/// document, so `root.find("item")` yields every item.
pub fn parse_xml(raw: &str) -> Result<Element, FeedError> {
    let escaped = escape_bare_ampersands(raw);
    let mut reader = Reader::from_str(&escaped);
    let config = reader.config_mut();
    config.check_end_names = false;
    config.allow_unmatched_ends = true;

    let mut stack = vec![Element::named(ROOT)];
    loop {
        match reader.read_event()? {
            Event::Start(e) => stack.push(Element::from_start(&e)),
            Event::Empty(e) => {
                let el = Element::from_start(&e);
                if let Some(top) = stack.last_mut() {
                    top.children.push(Node::Element(el));
                }
            }
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                // stray end tags with no open counterpart are ignored
                if let Some(pos) = stack.iter().rposition(|el| el.name == name) {
                    while pos > 0 && stack.len() > pos {
                        close_top(&mut stack);
                    }
                }
            }
            Event::Text(t) => push_text(&mut stack, &String::from_utf8_lossy(&t)),
            Event::CData(c) => push_text(&mut stack, &String::from_utf8_lossy(&c)),
            Event::GeneralRef(r) => push_text(&mut stack, &resolve_reference(&r)),
            Event::Eof => break,
            _ => {}
        }
    }
    while stack.len() > 1 {
        close_top(&mut stack);
    }
    Ok(stack.pop().unwrap_or_else(|| Element::named(ROOT)))
}

fn close_top(stack: &mut Vec<Element>) {
    if let Some(done) = stack.pop() {
        if let Some(parent) = stack.last_mut() {
            parent.children.push(Node::Element(done));
        }
    }
}

fn push_text(stack: &mut [Element], text: &str) {
    if let Some(top) = stack.last_mut() {
        top.push_str(text);
    }
}

/// Turn every `&` that does not start a reference into `&amp;`, outside CDATA.
fn escape_bare_ampersands(raw: &str) -> Cow<'_, str> {
    AMPERSAND.replace_all(raw, |caps: &Captures| {
        let whole = &caps[0];
        if whole == "&" {
            "&amp;".to_string()
        } else {
            whole.to_string()
        }
    })
}

/// Text for an `&...;` reference. Unknown names are kept verbatim.
fn resolve_reference(r: &BytesRef<'_>) -> String {
    if let Ok(Some(c)) = r.resolve_char_ref() {
        return c.to_string();
    }
    let name = String::from_utf8_lossy(r);
    match resolve_xml_entity(&name) {
        Some(resolved) => resolved.to_string(),
        None => format!("&{name};"),
    }
}

/// `src` of the first `<img>` in an HTML fragment, read leniently.
pub fn first_img_src(fragment: &str) -> Option<String> {
    let selector = Selector::parse("img").ok()?;
    let doc = Html::parse_fragment(fragment);
    doc.select(&selector)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0"?>
<rss xmlns:media="http://search.yahoo.com/mrss/">
  <channel>
    <title>Feed</title>
    <item>
      <title>First &amp; best</title>
      <media:content url="https://img.example.com/a.png?x=1&amp;y=2" />
      <description><![CDATA[<p>Hello <img src="/b.png"></p>]]></description>
    </item>
    <item><title>Second</title></item>
  </channel>
</rss>"#;

    #[test]
    fn test_find_items_in_order() {
        let root = parse_xml(FEED).unwrap();
        let items = root.find("item");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].first("title").unwrap().text(), "First & best");
        assert_eq!(items[1].first("title").unwrap().text(), "Second");
    }

    #[test]
    fn test_attr_and_cdata() {
        let root = parse_xml(FEED).unwrap();
        let item = root.first("item").unwrap();
        let media = item.find_any(&["media:content", "media:thumbnail"]);
        assert_eq!(media[0].attr("url"), Some("https://img.example.com/a.png?x=1&y=2"));
        assert_eq!(
            item.first("description").unwrap().text(),
            r#"<p>Hello <img src="/b.png"></p>"#
        );
    }

    #[test]
    fn test_stray_end_tags_are_tolerated() {
        let root = parse_xml("<rss><item><title>A</title></bogus></item><item><title>B</title></item></rss></rss>")
            .unwrap();
        let titles: Vec<String> = root
            .find("title")
            .into_iter()
            .map(Element::text)
            .collect();
        assert_eq!(titles, vec!["A", "B"]);
    }

    #[test]
    fn test_references_in_text() {
        let root = parse_xml("<t>a&nbsp;b &amp; &#39;c&#x27; &bogus;</t>").unwrap();
        assert_eq!(root.first("t").unwrap().text(), "a&nbsp;b & 'c' &bogus;");
    }

    #[test]
    fn test_attribute_with_unknown_entity() {
        let root = parse_xml(r#"<a href="x?a=1&amp;b=2&bogus;"/>"#).unwrap();
        assert_eq!(root.first("a").unwrap().attr("href"), Some("x?a=1&b=2&bogus;"));
    }

    #[test]
    fn test_bare_ampersands_are_tolerated() {
        let root = parse_xml(
            "<rss><item><title>AT&T invests</title><link>https://a.com/?a=1&b=2</link></item><item><title>B &amp; C</title></item></rss>",
        )
        .unwrap();
        let titles: Vec<String> = root.find("title").into_iter().map(Element::text).collect();
        assert_eq!(titles, vec!["AT&T invests", "B & C"]);
        assert_eq!(root.first("link").unwrap().text(), "https://a.com/?a=1&b=2");
    }

    #[test]
    fn test_cdata_ampersands_untouched() {
        let root = parse_xml("<d><![CDATA[Q&A &amp; more]]></d>").unwrap();
        assert_eq!(root.first("d").unwrap().text(), "Q&A &amp; more");
    }

    #[test]
    fn test_first_img_src() {
        assert_eq!(
            first_img_src(r#"<div><img src="one.png"><img src="two.png"></div>"#),
            Some("one.png".to_string())
        );
        assert_eq!(first_img_src("no images here"), None);
        assert_eq!(first_img_src("<img alt=x>"), None);
    }
}
