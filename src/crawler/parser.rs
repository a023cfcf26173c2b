//! HTML parsing: outbound links and main-content extraction
//!
//! `scraper::Html` is not `Send`, so every function here parses and drops the
//! document synchronously. Callers never hold a parsed tree across an await.

use crate::url::normalize_for_links;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use thiserror::Error;
use url::Url;

/// Article content isolated from a page
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedArticle {
    pub title: String,
    /// Whitespace-collapsed plain text
    pub text: String,
    /// Cleaned HTML of the main-content region
    pub html: String,
    pub excerpt: String,
}

/// Why extraction failed
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("no main-content region found")]
    NoMainContent,
}

/// Turns raw HTML into an [`ExtractedArticle`]
pub trait Extractor: Send + Sync {
    fn extract(&self, raw_html: &str, page_url: &str) -> Result<ExtractedArticle, ExtractError>;
}

/// Extracts outbound links from a page
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` anchors, resolved against `base_url`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only links
/// - Anything that is not HTTP(S) after resolution
///
/// Links are normalized with [`normalize_for_links`] and deduplicated,
/// keeping first-seen order.
pub fn extract_links(html: &str, base_url: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(a_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut links = Vec::new();
    for element in document.select(&a_selector) {
        if element.value().attr("download").is_some() {
            continue;
        }

        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some(absolute) = resolve_link(href, base_url) else {
            continue;
        };

        let normalized = normalize_for_links(&absolute).into_string();
        if seen.insert(normalized.clone()) {
            links.push(normalized);
        }
    }

    links
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    match absolute.scheme() {
        "http" | "https" => Some(absolute.to_string()),
        _ => None,
    }
}

const CONTENT_SELECTORS: &[&str] = &[
    "article",
    "main",
    "[role='main']",
    "#mw-content-text",
    "#content",
    ".content",
    ".post-content",
    ".entry-content",
];

const NOISE_TAGS: &[&str] = &[
    "script", "style", "noscript", "nav", "aside", "footer", "figure", "form", "iframe", "button",
];

const NOISE_CLASSES: &[&str] = &["mw-editsection", "navbox", "reflist"];

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Default [`Extractor`] built on scraper
///
/// Picks the first matching main-content region, drops noise elements and
/// serializes what remains.
#[derive(Debug)]
pub struct MainContentExtractor {
    regions: Vec<Selector>,
    excerpt_chars: usize,
}

impl MainContentExtractor {
    pub fn new() -> Self {
        let regions = CONTENT_SELECTORS
            .iter()
            .filter_map(|s| Selector::parse(s).ok())
            .collect();
        Self {
            regions,
            excerpt_chars: 200,
        }
    }

    fn find_region<'a>(&self, document: &'a Html) -> Option<ElementRef<'a>> {
        self.regions
            .iter()
            .find_map(|selector| document.select(selector).next())
    }
}

impl Default for MainContentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor for MainContentExtractor {
    fn extract(&self, raw_html: &str, page_url: &str) -> Result<ExtractedArticle, ExtractError> {
        if raw_html.trim().is_empty() {
            return Err(ExtractError::Parse("empty document".to_string()));
        }
        Url::parse(page_url).map_err(|e| ExtractError::Parse(format!("{}: {}", page_url, e)))?;

        let document = Html::parse_document(raw_html);
        let region = self.find_region(&document).ok_or(ExtractError::NoMainContent)?;

        let mut html = String::new();
        let mut raw_text = String::new();
        serialize_clean(region, &mut html, &mut raw_text);

        let text = collapse_whitespace(&raw_text);
        if text.is_empty() {
            return Err(ExtractError::NoMainContent);
        }

        let title = meta_content(&document, "meta[property='og:title']")
            .or_else(|| first_text(&document, "h1"))
            .or_else(|| first_text(&document, "title"))
            .unwrap_or_default();

        let excerpt = meta_content(&document, "meta[name='description']")
            .unwrap_or_else(|| text.chars().take(self.excerpt_chars).collect());

        Ok(ExtractedArticle {
            title,
            text,
            html: html.trim().to_string(),
            excerpt,
        })
    }
}

fn is_noise(element: &ElementRef<'_>) -> bool {
    let value = element.value();
    NOISE_TAGS.contains(&value.name()) || value.classes().any(|c| NOISE_CLASSES.contains(&c))
}

/// Writes the region without noise elements into `html` and `text`
fn serialize_clean(element: ElementRef<'_>, html: &mut String, text: &mut String) {
    let value = element.value();
    let name = value.name();

    html.push('<');
    html.push_str(name);
    for (attr, attr_value) in value.attrs() {
        html.push(' ');
        html.push_str(attr);
        html.push_str("=\"");
        html.push_str(&escape(attr_value, true));
        html.push('"');
    }
    html.push('>');

    if VOID_TAGS.contains(&name) {
        return;
    }

    for child in element.children() {
        match child.value() {
            Node::Text(t) => {
                html.push_str(&escape(t, false));
                text.push_str(t);
            }
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    if is_noise(&child_element) {
                        continue;
                    }
                    serialize_clean(child_element, html, text);
                    text.push(' ');
                }
            }
            _ => {}
        }
    }

    html.push_str("</");
    html.push_str(name);
    html.push('>');
}

fn escape(raw: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn meta_content(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .filter_map(|e| e.value().attr("content"))
        .map(collapse_whitespace)
        .find(|s| !s.is_empty())
}

fn first_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .map(|e| collapse_whitespace(&e.text().collect::<String>()))
        .find(|s| !s.is_empty())
}
