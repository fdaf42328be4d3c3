//! Coordinates fetching, normalization, analysis and persistence.
//!
//! Two operations are exposed:
//!
//! - [`ComparisonOrchestrator::search`]: fetch both sources concurrently and
//!   normalize the Grokipedia page.
//! - [`ComparisonOrchestrator::compare`]: strip the normalized markup to text,
//!   ask the engine for an analysis, then save the record.
//!
//! Search results and the comparison outcome are tracked separately: a failed
//! search clears the previous results, a failed comparison leaves them alone.

use crate::api::AnalyzeAsync;
use crate::error::{CompareError, ErrorKind, Result};
use crate::models::SearchResults;
use crate::normalizer::{normalize_content, strip_markup};
use crate::prompts::PromptConfiguration;
use crate::scrapers::{SourceFetcher, require_topic};
use crate::store::ComparisonStore;
use std::time::Instant;
use tracing::{error, info, instrument, warn};

/// Fetch both sources for `topic` concurrently and normalize the scraped page.
///
/// Shared by the orchestrator and the HTTP backend. Any failure fails the whole
/// search; when both fetches fail the scraped source's error wins.
///
/// # Errors
///
/// Validation for a blank topic, otherwise whatever either fetcher or the
/// normalizer returns.
pub async fn search_sources<G, W>(scraped: &G, structured: &W, topic: &str) -> Result<SearchResults>
where
    G: SourceFetcher,
    W: SourceFetcher,
{
    let topic = require_topic(topic)?;
    let t0 = Instant::now();

    let (raw_html, extract) = futures::join!(scraped.fetch(topic), structured.fetch(topic));
    let grokipedia_html = normalize_content(&raw_html?)?;
    let wikipedia_text = extract?;

    info!(
        grokipedia_bytes = grokipedia_html.len(),
        wikipedia_bytes = wikipedia_text.len(),
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "Search complete"
    );
    Ok(SearchResults {
        term: topic.to_string(),
        grokipedia_html,
        wikipedia_text,
    })
}

/// Where the orchestrator is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Fetching,
    Comparing,
    Success,
    Error,
}

/// Result of a successful comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonOutcome {
    /// Id of the saved record.
    pub id: i64,
    pub analysis: String,
}

pub struct ComparisonOrchestrator<G, W, E> {
    scraped: G,
    structured: W,
    engine: E,
    store: ComparisonStore,
    stage: Stage,
    results: Option<SearchResults>,
    analysis: Option<String>,
    last_error: Option<String>,
}

impl<G, W, E> ComparisonOrchestrator<G, W, E>
where
    G: SourceFetcher,
    W: SourceFetcher,
    E: AnalyzeAsync,
{
    pub fn new(scraped: G, structured: W, engine: E, store: ComparisonStore) -> Self {
        Self {
            scraped,
            structured,
            engine,
            store,
            stage: Stage::Idle,
            results: None,
            analysis: None,
            last_error: None,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// True while a search or comparison is running; callers must not start another.
    pub fn is_busy(&self) -> bool {
        matches!(self.stage, Stage::Fetching | Stage::Comparing)
    }

    pub fn results(&self) -> Option<&SearchResults> {
        self.results.as_ref()
    }

    /// Analysis from the latest comparison, kept even if saving it failed.
    pub fn analysis(&self) -> Option<&str> {
        self.analysis.as_deref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    #[cfg(test)]
    pub fn store(&self) -> &ComparisonStore {
        &self.store
    }

    fn fail(&mut self, err: &CompareError) {
        match err.kind() {
            ErrorKind::StructuralMismatch => {
                error!(error = %err, "Upstream layout changed; content container not found")
            }
            ErrorKind::NotFound | ErrorKind::Validation => warn!(error = %err, "Stage failed"),
            _ => error!(error = %err, kind = ?err.kind(), "Stage failed"),
        }
        self.last_error = Some(err.to_string());
        self.stage = Stage::Error;
    }

    /// Fetch and normalize both sources for `topic`.
    ///
    /// Any failure fails the whole search and clears earlier results.
    #[instrument(level = "info", skip(self))]
    pub async fn search(&mut self, topic: &str) -> Result<SearchResults> {
        if self.is_busy() {
            return Err(CompareError::Busy);
        }
        self.stage = Stage::Fetching;
        self.last_error = None;
        self.results = None;
        self.analysis = None;

        match search_sources(&self.scraped, &self.structured, topic).await {
            Ok(results) => {
                self.results = Some(results.clone());
                self.stage = Stage::Success;
                Ok(results)
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// Analyze a fetched pair and save it.
    ///
    /// The record stores `grokipedia_html` as given; the engine only sees its
    /// text. Markup without visible text, or a blank extract, is rejected before
    /// the engine is called. A failure while saving is returned even though the analysis is
    /// available through [`Self::analysis`]. Nothing is retried.
    #[instrument(level = "info", skip_all, fields(%topic))]
    pub async fn compare(
        &mut self,
        prompts: &PromptConfiguration,
        topic: &str,
        grokipedia_html: &str,
        wikipedia_text: &str,
    ) -> Result<ComparisonOutcome> {
        if self.is_busy() {
            return Err(CompareError::Busy);
        }
        self.stage = Stage::Comparing;
        self.last_error = None;
        self.analysis = None;

        let grokipedia_text = strip_markup(grokipedia_html);
        let missing: Vec<&str> = [
            ("grokipediaText", grokipedia_text.as_str()),
            ("wikipediaText", wikipedia_text),
        ]
        .into_iter()
        .filter(|(_, text)| text.trim().is_empty())
        .map(|(name, _)| name)
        .collect();
        if !missing.is_empty() {
            let err = CompareError::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            ));
            self.fail(&err);
            return Err(err);
        }

        let analysis = match self
            .engine
            .analyze(prompts, &grokipedia_text, wikipedia_text)
            .await
        {
            Ok(analysis) => analysis,
            Err(e) => {
                self.fail(&e);
                return Err(e);
            }
        };
        self.analysis = Some(analysis.clone());

        match self
            .store
            .create(topic, grokipedia_html, wikipedia_text, &analysis)
        {
            Ok(id) => {
                self.stage = Stage::Success;
                info!(id, "Comparison saved");
                Ok(ComparisonOutcome { id, analysis })
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// Compare the results of the most recent successful search.
    pub async fn compare_current(&mut self, prompts: &PromptConfiguration) -> Result<ComparisonOutcome> {
        let Some(results) = self.results.clone() else {
            let err = CompareError::Validation("Search for a topic before comparing".to_string());
            self.fail(&err);
            return Err(err);
        };
        self.compare(
            prompts,
            &results.term,
            &results.grokipedia_html,
            &results.wikipedia_text,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::GeminiClient;
    use crate::scrapers::{GrokipediaFetcher, WikipediaFetcher};
    use mockito::{Matcher, Mock, Server, ServerGuard};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    const ADA_PAGE: &str = r#"<html><body><nav><a href="/page/Home">Home</a></nav><article><h1>Ada Lovelace</h1><p>Worked with <a href="/page/Charles_Babbage">Babbage</a>.</p></article></body></html>"#;

    struct StaticFetcher(std::result::Result<&'static str, &'static str>);

    impl SourceFetcher for StaticFetcher {
        fn source_name(&self) -> &'static str {
            "Static"
        }

        async fn fetch(&self, _topic: &str) -> Result<String> {
            self.0
                .map(str::to_string)
                .map_err(|m| CompareError::NotFound(m.to_string()))
        }
    }

    #[derive(Clone, Default)]
    struct CountingEngine {
        calls: Arc<AtomicUsize>,
        reply: &'static str,
        seen_first: Arc<std::sync::Mutex<String>>,
    }

    impl AnalyzeAsync for CountingEngine {
        async fn analyze(
            &self,
            _prompts: &PromptConfiguration,
            first_text: &str,
            _second_text: &str,
        ) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.seen_first.lock().unwrap() = first_text.to_string();
            Ok(self.reply.to_string())
        }
    }

    fn temp_store() -> (TempDir, ComparisonStore) {
        let dir = TempDir::new().unwrap();
        let store = ComparisonStore::open(dir.path().join("comparisons.db")).unwrap();
        (dir, store)
    }

    async fn mock_sources(server: &mut ServerGuard) -> Vec<Mock> {
        let page = server
            .mock("GET", "/page/Ada_Lovelace")
            .with_status(200)
            .with_body(ADA_PAGE)
            .create_async()
            .await;
        let extract = server
            .mock("GET", "/w/api.php")
            .match_query(Matcher::UrlEncoded("titles".into(), "Ada Lovelace".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"query":{"pages":{"7":{"extract":"Augusta Ada King, Countess of Lovelace."}}}}"#)
            .create_async()
            .await;
        vec![page, extract]
    }

    #[tokio::test]
    async fn test_search_then_compare_saves_one_record() {
        let mut server = Server::new_async().await;
        let _sources = mock_sources(&mut server).await;
        let gemini = server
            .mock("POST", "/v1beta/models/gemini-2.0-flash-exp:generateContent")
            .with_status(200)
            .with_body(r###"{"candidates":[{"content":{"parts":[{"text":"## Tone and Bias\nSimilar."}]}}]}"###)
            .expect(1)
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let (_dir, store) = temp_store();
        let mut orchestrator = ComparisonOrchestrator::new(
            GrokipediaFetcher::with_base_url(client.clone(), server.url()),
            WikipediaFetcher::with_base_url(client.clone(), server.url()),
            GeminiClient::new(client, Some("key".to_string())).with_base_url(server.url()),
            store,
        );

        let results = orchestrator.search("Ada Lovelace").await.unwrap();
        assert_eq!(orchestrator.stage(), Stage::Success);
        assert!(!results.grokipedia_html.is_empty());
        assert!(!results.wikipedia_text.is_empty());
        assert!(results.grokipedia_html.contains("https://grokipedia.com/page/Charles_Babbage"));
        assert!(!results.grokipedia_html.contains("/page/Home"));

        let outcome = orchestrator
            .compare_current(&PromptConfiguration::default())
            .await
            .unwrap();
        assert_eq!(orchestrator.stage(), Stage::Success);
        gemini.assert_async().await;

        let records = orchestrator.store().list_all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, outcome.id);
        assert_eq!(records[0].term, "Ada Lovelace");
        assert_eq!(records[0].grokipedia_html, results.grokipedia_html);
        assert_eq!(records[0].analysis, "## Tone and Bias\nSimilar.");
    }

    #[tokio::test]
    async fn test_placeholder_page_fails_search_without_engine_call() {
        let mut server = Server::new_async().await;
        let _page = server
            .mock("GET", "/page/Nowhere")
            .with_status(200)
            .with_body("<html><body>This page does not exist yet</body></html>")
            .create_async()
            .await;
        let _extract = server
            .mock("GET", "/w/api.php")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"query":{"pages":{"5":{"extract":"Somewhere"}}}}"#)
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let engine = CountingEngine {
            reply: "analysis",
            ..Default::default()
        };
        let calls = engine.calls.clone();
        let (_dir, store) = temp_store();
        let mut orchestrator = ComparisonOrchestrator::new(
            GrokipediaFetcher::with_base_url(client.clone(), server.url()),
            WikipediaFetcher::with_base_url(client, server.url()),
            engine,
            store,
        );

        let err = orchestrator.search("Nowhere").await.unwrap_err();
        assert!(matches!(err, CompareError::NotFound(_)));
        assert_eq!(orchestrator.stage(), Stage::Error);
        assert!(orchestrator.results().is_none());

        assert!(orchestrator
            .compare_current(&PromptConfiguration::default())
            .await
            .is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(orchestrator.store().list_all().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_credential_keeps_search_results() {
        let mut server = Server::new_async().await;
        let _sources = mock_sources(&mut server).await;
        let gemini = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let (_dir, store) = temp_store();
        let mut orchestrator = ComparisonOrchestrator::new(
            GrokipediaFetcher::with_base_url(client.clone(), server.url()),
            WikipediaFetcher::with_base_url(client.clone(), server.url()),
            GeminiClient::new(client, None).with_base_url(server.url()),
            store,
        );

        let results = orchestrator.search("Ada Lovelace").await.unwrap();
        let err = orchestrator
            .compare_current(&PromptConfiguration::default())
            .await
            .unwrap_err();

        assert!(matches!(err, CompareError::Configuration(_)));
        assert_eq!(orchestrator.stage(), Stage::Error);
        assert_eq!(orchestrator.results(), Some(&results));
        assert!(orchestrator.store().list_all().unwrap().is_empty());
        gemini.assert_async().await;
    }

    #[tokio::test]
    async fn test_failed_search_clears_previous_results() {
        let (_dir, store) = temp_store();
        let mut orchestrator = ComparisonOrchestrator::new(
            StaticFetcher(Ok("<article><p>first</p></article>")),
            StaticFetcher(Ok("text")),
            CountingEngine::default(),
            store,
        );
        orchestrator.search("Topic").await.unwrap();
        assert!(orchestrator.results().is_some());

        orchestrator.structured = StaticFetcher(Err("The Wikipedia page for \"Other\" does not exist."));
        let err = orchestrator.search("Other").await.unwrap_err();
        assert_eq!(err.to_string(), "The Wikipedia page for \"Other\" does not exist.");
        assert!(orchestrator.results().is_none());
        assert_eq!(
            orchestrator.last_error(),
            Some("The Wikipedia page for \"Other\" does not exist.")
        );
    }

    #[tokio::test]
    async fn test_layout_change_is_structural_mismatch() {
        let (_dir, store) = temp_store();
        let mut orchestrator = ComparisonOrchestrator::new(
            StaticFetcher(Ok("<html><body><div>redesigned</div></body></html>")),
            StaticFetcher(Ok("text")),
            CountingEngine::default(),
            store,
        );
        let err = orchestrator.search("Topic").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StructuralMismatch);
    }

    #[tokio::test]
    async fn test_empty_topic_is_rejected() {
        let (_dir, store) = temp_store();
        let mut orchestrator = ComparisonOrchestrator::new(
            StaticFetcher(Ok("<article></article>")),
            StaticFetcher(Ok("text")),
            CountingEngine::default(),
            store,
        );
        let err = orchestrator.search("   ").await.unwrap_err();
        assert!(matches!(err, CompareError::Validation(_)));
    }

    #[tokio::test]
    async fn test_compare_sends_stripped_text_and_saves_markup() {
        let (_dir, store) = temp_store();
        let engine = CountingEngine {
            reply: "# Result",
            ..Default::default()
        };
        let seen = engine.seen_first.clone();
        let mut orchestrator = ComparisonOrchestrator::new(
            StaticFetcher(Ok("")),
            StaticFetcher(Ok("")),
            engine,
            store,
        );

        let html = "<h1>Ada</h1><p>Born <b>1815</b></p>";
        let outcome = orchestrator
            .compare(&PromptConfiguration::default(), "Ada", html, "Wiki text")
            .await
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), "AdaBorn 1815");
        let record = orchestrator.store().get_by_id(outcome.id).unwrap().unwrap();
        assert_eq!(record.grokipedia_html, html);
    }

    #[tokio::test]
    async fn test_save_failure_is_surfaced_but_analysis_kept() {
        let (_dir, store) = temp_store();
        let mut orchestrator = ComparisonOrchestrator::new(
            StaticFetcher(Ok("<article><p>a</p></article>")),
            StaticFetcher(Ok("text")),
            CountingEngine {
                reply: "",
                ..Default::default()
            },
            store,
        );
        let results = orchestrator.search("Topic").await.unwrap();

        let err = orchestrator
            .compare_current(&PromptConfiguration::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CompareError::Validation(_)));
        assert_eq!(orchestrator.analysis(), Some(""));
        assert_eq!(orchestrator.results(), Some(&results));
        assert!(orchestrator.store().list_all().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_compare_without_visible_text_skips_engine() {
        let (_dir, store) = temp_store();
        let engine = CountingEngine {
            reply: "analysis",
            ..Default::default()
        };
        let calls = engine.calls.clone();
        let mut orchestrator = ComparisonOrchestrator::new(
            StaticFetcher(Ok("")),
            StaticFetcher(Ok("")),
            engine,
            store,
        );

        let err = orchestrator
            .compare(
                &PromptConfiguration::default(),
                "Ada",
                "<img src=\"https://grokipedia.com/x.png\">",
                "Wiki",
            )
            .await
            .unwrap_err();
        match err {
            CompareError::Validation(msg) => assert!(msg.contains("grokipediaText")),
            other => panic!("unexpected error: {other:?}"),
        }

        let err = orchestrator
            .compare(&PromptConfiguration::default(), "Ada", "<p>Ada</p>", "  ")
            .await
            .unwrap_err();
        assert!(matches!(err, CompareError::Validation(_)));

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(orchestrator.stage(), Stage::Error);
        assert!(orchestrator.store().list_all().unwrap().is_empty());
    }
}
