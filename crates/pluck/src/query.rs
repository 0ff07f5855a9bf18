// ABOUTME: HTML query engine: document parsing, selector resolution, and text extraction.
// ABOUTME: Caches compiled CSS selectors and normalizes whitespace in extracted text.

//! HTML parsing and selector resolution.
//!
//! Key behaviors:
//! - Parsing is lenient (html5ever error recovery), but empty or binary
//!   content is rejected as a parse failure rather than silently yielding an
//!   empty document.
//! - Selectors in a [`FieldRule`] are tried in order; the first selector
//!   yielding a non-empty match wins.
//! - Within one selector, nodes are visited in document order and the first
//!   non-empty value is taken.
//! - Text extraction joins inner text with spaces and collapses whitespace
//!   runs; attribute extraction trims the value. Empty strings are treated as
//!   no match.
//! - Invalid CSS selectors never panic; they simply match nothing.

use std::collections::HashMap;
use std::sync::RwLock;

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use crate::error::ExtractError;
use crate::selector::{FieldRule, SelectorSpec};

/// Thread-safe cache of compiled CSS selectors.
///
/// Selector parsing is expensive relative to the actual matching, and rules
/// re-run the same selectors for every page. Reads take a shared lock; a
/// cache miss compiles under the exclusive lock. Invalid selectors are cached
/// as `None` so they are not re-parsed either.
static SELECTOR_CACHE: Lazy<RwLock<HashMap<String, Option<Selector>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Gets or compiles a CSS selector, caching the result.
pub(crate) fn cached_selector(css: &str) -> Option<Selector> {
    {
        let cache = SELECTOR_CACHE.read().unwrap();
        if let Some(cached) = cache.get(css) {
            return cached.clone();
        }
    }

    let compiled = Selector::parse(css).ok();
    let mut cache = SELECTOR_CACHE.write().unwrap();
    // Another thread may have inserted while we compiled.
    if let Some(cached) = cache.get(css) {
        return cached.clone();
    }
    cache.insert(css.to_string(), compiled.clone());
    compiled
}

/// Normalizes whitespace in a string by collapsing runs into single spaces.
fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Visible text of an element, whitespace-normalized.
fn element_text(el: &ElementRef) -> String {
    let text: String = el.text().collect::<Vec<_>>().join(" ");
    normalize_whitespace(&text)
}

/// Builds a queryable document from decoded page text.
///
/// html5ever recovers from almost any malformed markup, so "unparseable" here
/// means content that cannot be a document at all: empty input, or binary
/// content (NUL bytes) such as an image served where HTML was expected.
pub fn parse_document(text: &str, url: &str) -> Result<Html, ExtractError> {
    if text.trim().is_empty() {
        return Err(ExtractError::parse(
            url,
            "Parse",
            Some(anyhow::anyhow!("empty document")),
        ));
    }
    if text.contains('\0') {
        return Err(ExtractError::parse(
            url,
            "Parse",
            Some(anyhow::anyhow!("binary content is not HTML")),
        ));
    }
    Ok(Html::parse_document(text))
}

/// Resolves a single selector spec against a document.
///
/// Returns the first non-empty value in document order, or `None`.
pub fn query_selector(doc: &Html, spec: &SelectorSpec) -> Option<String> {
    match spec {
        SelectorSpec::Id { value } => query_id(doc, value),
        SelectorSpec::Css { value } => query_css_text(doc, value),
        SelectorSpec::Attr { selector, attr } => query_css_attr(doc, selector, attr),
    }
}

/// Resolves a fallback chain: first selector yielding a match wins.
pub fn resolve_rule(doc: &Html, rule: &FieldRule) -> Option<String> {
    for spec in &rule.selectors {
        if let Some(value) = query_selector(doc, spec) {
            return Some(value);
        }
    }
    None
}

/// Extracts text from the first element with the given id.
fn query_id(doc: &Html, id: &str) -> Option<String> {
    let sel = cached_selector("[id]")?;
    doc.select(&sel)
        .filter(|el| el.value().id() == Some(id))
        .map(|el| element_text(&el))
        .find(|text| !text.is_empty())
}

/// Extracts inner text from elements matching a CSS selector.
fn query_css_text(doc: &Html, css: &str) -> Option<String> {
    let sel = cached_selector(css)?;
    doc.select(&sel)
        .map(|el| element_text(&el))
        .find(|text| !text.is_empty())
}

/// Extracts an attribute value from elements matching a CSS selector.
fn query_css_attr(doc: &Html, css: &str, attr: &str) -> Option<String> {
    let sel = cached_selector(css)?;
    doc.select(&sel)
        .filter_map(|el| el.value().attr(attr))
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}
