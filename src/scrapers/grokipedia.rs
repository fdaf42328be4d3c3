//! Grokipedia page scraper.
//!
//! Grokipedia has no public API, so the raw article page is downloaded and
//! handed to the normalizer. Missing topics come back as `200 OK` with a
//! placeholder page, which is detected by its sentinel phrase.
//!
//! # URL Pattern
//!
//! `https://grokipedia.com/page/{slug}` where the slug is produced by
//! [`topic_slug`](super::topic_slug).

use super::{SourceFetcher, require_topic, topic_slug};
use crate::error::{CompareError, Result};
use reqwest::Client;
use std::time::Instant;
use tracing::{info, instrument, warn};

/// Text Grokipedia renders on its placeholder page for unknown topics.
pub const MISSING_PAGE_SENTINEL: &str = "This page does not exist yet";

#[derive(Debug, Clone)]
pub struct GrokipediaFetcher {
    client: Client,
    base_url: String,
}

impl GrokipediaFetcher {
    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Public URL of the article for `topic`.
    pub fn page_url(&self, topic: &str) -> String {
        format!("{}/page/{}", self.base_url, topic_slug(topic))
    }
}

impl SourceFetcher for GrokipediaFetcher {
    fn source_name(&self) -> &'static str {
        "Grokipedia"
    }

    #[instrument(level = "info", skip(self))]
    async fn fetch(&self, topic: &str) -> Result<String> {
        let topic = require_topic(topic)?;
        let url = self.page_url(topic);
        let t0 = Instant::now();

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(%url, status = status.as_u16(), "Grokipedia returned an error status");
            return Err(CompareError::UpstreamStatus {
                source_name: self.source_name(),
                status: status.as_u16(),
            });
        }

        let html = response.text().await?;
        if html.is_empty() || html.contains(MISSING_PAGE_SENTINEL) {
            warn!(%url, "Grokipedia served its placeholder page");
            return Err(CompareError::NotFound(format!(
                "The Grokipedia page for \"{topic}\" does not exist."
            )));
        }

        info!(
            %url,
            bytes = html.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched Grokipedia page"
        );
        Ok(html)
    }
}
