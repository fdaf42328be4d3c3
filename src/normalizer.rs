//! Content extraction for scraped Grokipedia pages.
//!
//! A Grokipedia page keeps its article body inside a single `<article>`
//! element. Everything outside it (navigation, scripts, footers) is dropped,
//! and root-relative links and images inside it are rewritten against the
//! Grokipedia origin so the fragment stays usable once detached from the page.

use crate::document::{ScraperDocument, StructuredDocument};
use crate::error::{CompareError, Result};
use tracing::{debug, error, instrument};

/// Origin used to absolutize root-relative references.
pub const GROKIPEDIA_ORIGIN: &str = "https://grokipedia.com";

/// Selector for the primary content container.
pub const CONTENT_SELECTOR: &str = "article";

/// Extract the article body from a raw Grokipedia page.
///
/// Returns the inner markup of the `<article>` element with every `href`/`src`
/// beginning with `/` prefixed by [`GROKIPEDIA_ORIGIN`].
///
/// # Errors
///
/// [`CompareError::StructuralMismatch`] when the page has no `<article>`.
#[instrument(level = "debug", skip_all, fields(bytes = raw_html.len()))]
pub fn normalize_content(raw_html: &str) -> Result<String> {
    let mut document = ScraperDocument::parse_document(raw_html);
    normalize_document(&mut document, GROKIPEDIA_ORIGIN)
}

/// Normalize any [`StructuredDocument`] against `origin`.
pub fn normalize_document<D: StructuredDocument>(document: &mut D, origin: &str) -> Result<String> {
    let Some(container) = document.select_one(CONTENT_SELECTOR)? else {
        error!(
            selector = CONTENT_SELECTOR,
            "Content container missing; the Grokipedia page structure may have changed"
        );
        return Err(CompareError::StructuralMismatch(
            "Could not find the main <article> element in the Grokipedia source. The page structure may have changed."
                .to_string(),
        ));
    };

    let mut rewritten = 0usize;
    for (selector, attr) in [("a", "href"), ("img", "src")] {
        for node in document.select_all(container, selector)? {
            if let Some(value) = document.attribute(node, attr) {
                if value.starts_with('/') {
                    document.set_attribute(node, attr, &format!("{origin}{value}"));
                    rewritten += 1;
                }
            }
        }
    }

    let markup = document.inner_markup(container);
    debug!(rewritten, bytes = markup.len(), "Normalized article content");
    Ok(markup)
}

/// Reduce a markup fragment to its visible text, discarding every tag.
pub fn strip_markup(fragment: &str) -> String {
    let document = ScraperDocument::parse_fragment(fragment);
    document.text_content(document.root())
}
