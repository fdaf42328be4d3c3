//! Source fetchers for the two encyclopedias being compared.
//!
//! # Supported Sources
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | Grokipedia | [`grokipedia`] | HTML scraping | Returns 200 for missing pages; detected by sentinel text |
//! | Wikipedia | [`wikipedia`] | MediaWiki query API | Plain-text extract of the exact title |
//!
//! Both implement [`SourceFetcher`]. Each makes exactly one request per call
//! and never retries; failures surface as [`CompareError`] variants.

pub mod grokipedia;
pub mod wikipedia;

use crate::error::{CompareError, Result};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

pub use grokipedia::GrokipediaFetcher;
pub use wikipedia::WikipediaFetcher;

/// Characters `encodeURIComponent` leaves as they are.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Fetch one source's content for a topic.
pub trait SourceFetcher {
    /// Human-readable source name used in logs and error messages.
    fn source_name(&self) -> &'static str;

    /// Retrieve the source's content for `topic`.
    async fn fetch(&self, topic: &str) -> Result<String>;
}

/// Trim a topic and reject it when nothing is left.
pub fn require_topic(topic: &str) -> Result<&str> {
    let trimmed = topic.trim();
    if trimmed.is_empty() {
        return Err(CompareError::Validation(
            "Term parameter is required".to_string(),
        ));
    }
    Ok(trimmed)
}

/// Format a topic as a wiki-style path segment.
///
/// The trimmed topic is percent-encoded as a URI component and encoded spaces
/// become underscores, so `"Rust (programming language)"` becomes
/// `"Rust_(programming_language)"`. Characters that are already valid in a path
/// segment pass through, so feeding such a slug back in yields the same slug.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(topic_slug("  Ada Lovelace "), "Ada_Lovelace");
/// assert_eq!(topic_slug("AC/DC"), "AC%2FDC");
/// ```
pub fn topic_slug(topic: &str) -> String {
    utf8_percent_encode(topic.trim(), COMPONENT)
        .to_string()
        .replace("%20", "_")
}
