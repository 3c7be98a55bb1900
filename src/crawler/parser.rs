//! HTML inspector for extracting anchors, links and the page title
//!
//! This module handles parsing HTML content to extract:
//! - Fragment identifiers the page defines (`id` attributes, `<a name>`)
//! - Raw `<a href>` values, for anchor checks
//! - Resource URLs to crawl
//! - The page title
//!
//! Links inside `<pre>`, `<code>` and `<svg>` are example text or drawing markup,
//! not navigation, and are skipped.

use crate::audit::{DocumentInspector, PageDocument};
use crate::url::resolve_href;
use scraper::{ElementRef, Html, Selector};
use std::collections::{BTreeSet, HashSet};
use url::Url;

/// Elements whose descendants never contribute links
const SKIPPED_CONTAINERS: &[&str] = &["pre", "code", "svg"];

/// Attribute selectors whose values are crawled as resources
const RESOURCE_SELECTORS: &[(&str, &str)] = &[
    ("a[href]", "href"),
    ("area[href]", "href"),
    ("link[href]", "href"),
    ("img[src]", "src"),
    ("script[src]", "src"),
    ("iframe[src]", "src"),
    ("source[src]", "src"),
    ("embed[src]", "src"),
];

/// [`DocumentInspector`] backed by scraper
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlInspector;

impl HtmlInspector {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentInspector for HtmlInspector {
    fn inspect(&self, body: &[u8], page_url: &Url) -> PageDocument {
        let html = String::from_utf8_lossy(body);
        parse_document(&html, page_url)
    }
}

/// Parses HTML content and extracts everything the audit needs
///
/// # Example
///
/// ```
/// use spider_audit::crawler::parse_document;
/// use url::Url;
///
/// let html = r##"<html><head><title>Test</title></head>
///     <body><h2 id="intro">Intro</h2><a href="/page#setup">Setup</a></body></html>"##;
/// let page = Url::parse("https://example.com/").unwrap();
/// let document = parse_document(html, &page);
///
/// assert_eq!(document.title, Some("Test".to_string()));
/// assert!(document.anchor_ids.contains("intro"));
/// assert_eq!(document.hrefs, vec!["/page#setup"]);
/// assert_eq!(document.resources, vec!["https://example.com/page"]);
/// ```
pub fn parse_document(html: &str, page_url: &Url) -> PageDocument {
    let document = Html::parse_document(html);

    PageDocument {
        anchor_ids: extract_anchor_ids(&document),
        hrefs: extract_hrefs(&document),
        title: extract_title(&document),
        resources: extract_resources(&document, page_url),
    }
}

/// Extracts the text of the first `<title>` outside `<svg>`
///
/// An empty title is still a title: it is returned as an empty string.
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .find(|element| !has_ancestor(element, &["svg"]))
        .map(|element| element.text().collect::<String>().trim().to_string())
}

/// Collects every `id` value and every `<a name>` value
fn extract_anchor_ids(document: &Html) -> BTreeSet<String> {
    let mut ids = BTreeSet::new();

    if let Ok(selector) = Selector::parse("[id], a[name]") {
        for element in document.select(&selector) {
            let value = element.value();
            if let Some(id) = value.attr("id").filter(|id| !id.is_empty()) {
                ids.insert(id.to_string());
            }
            if value.name() == "a" {
                if let Some(name) = value.attr("name").filter(|name| !name.is_empty()) {
                    ids.insert(name.to_string());
                }
            }
        }
    }

    ids
}

/// Collects raw `<a href>` values in document order
fn extract_hrefs(document: &Html) -> Vec<String> {
    let mut hrefs = Vec::new();

    if let Ok(selector) = Selector::parse("a[href]") {
        for element in document.select(&selector) {
            if has_ancestor(&element, SKIPPED_CONTAINERS) {
                continue;
            }
            if let Some(href) = element.value().attr("href") {
                hrefs.push(href.to_string());
            }
        }
    }

    hrefs
}

/// Collects absolute, fragment-free resource URLs, deduplicated in document order
fn extract_resources(document: &Html, page_url: &Url) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut resources = Vec::new();

    for (selector, attr) in RESOURCE_SELECTORS {
        let Ok(selector) = Selector::parse(selector) else {
            continue;
        };

        for element in document.select(&selector) {
            if has_ancestor(&element, SKIPPED_CONTAINERS) {
                continue;
            }

            let resolved = element
                .value()
                .attr(attr)
                .and_then(|value| resolve_href(value, page_url));
            if let Some(url) = resolved {
                let url = url.to_string();
                if seen.insert(url.clone()) {
                    resources.push(url);
                }
            }
        }
    }

    resources
}

/// Returns true if any ancestor of `element` is one of `names`
fn has_ancestor(element: &ElementRef, names: &[&str]) -> bool {
    element.ancestors().any(|node| {
        node.value()
            .as_element()
            .is_some_and(|ancestor| names.contains(&ancestor.name()))
    })
}
