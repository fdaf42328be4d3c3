//! Wikipedia plain-text extract via the MediaWiki query API.
//!
//! A single `action=query&prop=extracts&explaintext` request is made for the
//! exact title. The response maps page ids to page data; there is at most one
//! entry since only one title is queried.

use super::{SourceFetcher, require_topic};
use crate::error::{CompareError, Result};
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{info, instrument, warn};

pub const WIKIPEDIA_ORIGIN: &str = "https://en.wikipedia.org";

/// Page id MediaWiki reports for a title that does not exist.
pub const MISSING_PAGE_ID: &str = "-1";

#[derive(Debug, Deserialize)]
struct QueryResponse {
    query: Option<QueryBody>,
}

#[derive(Debug, Deserialize)]
struct QueryBody {
    #[serde(default)]
    pages: BTreeMap<String, PageData>,
}

#[derive(Debug, Deserialize)]
struct PageData {
    extract: Option<String>,
}

#[derive(Debug, Clone)]
pub struct WikipediaFetcher {
    client: Client,
    base_url: String,
}

impl WikipediaFetcher {
    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn api_url(&self) -> String {
        format!("{}/w/api.php", self.base_url)
    }
}

/// Pull the single extract out of a query response.
fn extract_from_response(topic: &str, response: QueryResponse) -> Result<String> {
    let page = response
        .query
        .and_then(|q| q.pages.into_iter().next());

    let Some((page_id, page)) = page else {
        return Err(CompareError::NotFound(format!(
            "The Wikipedia page for \"{topic}\" does not exist."
        )));
    };
    if page_id == MISSING_PAGE_ID {
        return Err(CompareError::NotFound(format!(
            "The Wikipedia page for \"{topic}\" does not exist."
        )));
    }

    match page.extract {
        Some(extract) if !extract.is_empty() => Ok(extract),
        _ => Err(CompareError::NoContent(format!(
            "No summary extract found on Wikipedia for \"{topic}\"."
        ))),
    }
}

impl SourceFetcher for WikipediaFetcher {
    fn source_name(&self) -> &'static str {
        "Wikipedia"
    }

    #[instrument(level = "info", skip(self))]
    async fn fetch(&self, topic: &str) -> Result<String> {
        let topic = require_topic(topic)?;
        let t0 = Instant::now();

        let response = self
            .client
            .get(self.api_url())
            .query(&[
                ("action", "query"),
                ("prop", "extracts"),
                ("explaintext", "1"),
                ("titles", topic),
                ("format", "json"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Wikipedia API returned an error status");
            return Err(CompareError::UpstreamStatus {
                source_name: self.source_name(),
                status: status.as_u16(),
            });
        }

        let body: QueryResponse = response.json().await?;
        let extract = extract_from_response(topic, body).inspect_err(|e| {
            warn!(error = %e, "Wikipedia has no usable extract");
        })?;

        info!(
            bytes = extract.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched Wikipedia extract"
        );
        Ok(extract)
    }
}
