//! Comparative analysis through the Gemini `generateContent` API.
//!
//! # Architecture
//!
//! - [`AnalyzeAsync`]: the seam the orchestrator depends on
//! - [`GeminiClient`]: the production implementation over `reqwest`
//! - [`build_request_body`]: lays out the task and both source texts
//!
//! The system instruction travels in Gemini's separate `systemInstruction`
//! channel; the task and the two labeled texts form the single user turn.
//! Exactly one request is made per call. There is no retry and no timeout.

use crate::error::{CompareError, Result};
use crate::prompts::PromptConfiguration;
use crate::utils::truncate_for_log;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, error, info, instrument};

pub const GEMINI_ORIGIN: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";

/// Label preceding the Grokipedia text. The task instruction refers to it as the first source.
pub const FIRST_SOURCE_LABEL: &str = "--- GROKIPEDIA TEXT ---";
/// Label preceding the Wikipedia text.
pub const SECOND_SOURCE_LABEL: &str = "--- WIKIPEDIA TEXT ---";

/// Trait for async comparative analysis.
///
/// Implementors turn a prompt pair and two plain-text bodies into one
/// analysis. Test doubles implement this to observe or fail the call.
pub trait AnalyzeAsync {
    async fn analyze(
        &self,
        prompts: &PromptConfiguration,
        first_text: &str,
        second_text: &str,
    ) -> Result<String>;
}

/// Combine the task instruction and both texts into the user turn.
///
/// The order is always task, first source, second source. Body content is
/// inserted verbatim, so texts containing the labels cannot reorder sections.
pub fn build_request_body(task_instruction: &str, first_text: &str, second_text: &str) -> String {
    format!(
        "{task_instruction}\n\n{FIRST_SOURCE_LABEL}\n{first_text}\n\n{SECOND_SOURCE_LABEL}\n{second_text}\n"
    )
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    system_instruction: Content,
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl GenerateResponse {
    /// Text of the first candidate; empty when the model returned nothing.
    fn text(self) -> String {
        self.candidates
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

/// Gemini client with an explicitly injected credential.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("has_api_key", &self.api_key.is_some())
            .finish()
    }
}

impl GeminiClient {
    /// A blank key counts as missing.
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: DEFAULT_MODEL.to_string(),
            base_url: GEMINI_ORIGIN.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }
}

impl AnalyzeAsync for GeminiClient {
    #[instrument(level = "info", skip_all, fields(model = %self.model))]
    async fn analyze(
        &self,
        prompts: &PromptConfiguration,
        first_text: &str,
        second_text: &str,
    ) -> Result<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            error!("GEMINI_API_KEY is not set; refusing to call Gemini");
            return Err(CompareError::Configuration(
                "GEMINI_API_KEY is not set. Please set it in your .env file or environment."
                    .to_string(),
            ));
        };

        let body = build_request_body(&prompts.task_instruction, first_text, second_text);
        let request = GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: Some(prompts.system_instruction.clone()),
                }],
            },
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part { text: Some(body) }],
            }],
        };

        let t0 = Instant::now();
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| CompareError::Service(e.to_string()))?;

        let status = response.status();
        let raw = response
            .text()
            .await
            .map_err(|e| CompareError::Service(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&raw)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("status {}", status.as_u16()));
            error!(
                status = status.as_u16(),
                body = %truncate_for_log(&raw, 300),
                "Gemini returned an error"
            );
            return Err(CompareError::Service(message));
        }

        let parsed: GenerateResponse =
            serde_json::from_str(&raw).map_err(|e| CompareError::Service(e.to_string()))?;
        let text = parsed.text();

        if text.is_empty() {
            debug!("Gemini returned no candidate text");
        }
        info!(
            bytes = text.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Gemini analysis complete"
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    #[test]
    fn test_build_request_body_order() {
        let body = build_request_body("TASK", "alpha", "beta");
        assert_eq!(
            body,
            "TASK\n\n--- GROKIPEDIA TEXT ---\nalpha\n\n--- WIKIPEDIA TEXT ---\nbeta\n"
        );
    }

    #[test]
    fn test_build_request_body_with_label_strings_in_bodies() {
        let first = format!("before {SECOND_SOURCE_LABEL} after");
        let second = format!("{FIRST_SOURCE_LABEL} in second");
        let body = build_request_body("TASK", &first, &second);

        assert!(body.starts_with("TASK\n\n--- GROKIPEDIA TEXT ---\n"));
        let first_at = body.find(&first).unwrap();
        let second_label_at = first_at + first.len() + 2;
        assert_eq!(
            &body[second_label_at..second_label_at + SECOND_SOURCE_LABEL.len()],
            SECOND_SOURCE_LABEL
        );
        assert!(body.ends_with(&format!("{second}\n")));
    }

    #[test]
    fn test_response_text_joins_first_candidate_parts() {
        let resp: GenerateResponse = serde_json::from_value(json!({
            "candidates": [
                {"content": {"role": "model", "parts": [{"text": "# Title\n"}, {"text": "body"}]}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ]
        }))
        .unwrap();
        assert_eq!(resp.text(), "# Title\nbody");
    }

    #[test]
    fn test_response_without_candidates_is_empty() {
        let resp: GenerateResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(resp.text(), "");
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_network() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let client = GeminiClient::new(Client::new(), Some("   ".to_string()))
            .with_base_url(server.url());
        let err = client
            .analyze(&PromptConfiguration::default(), "a", "b")
            .await
            .unwrap_err();

        assert!(matches!(err, CompareError::Configuration(_)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_analyze_sends_system_instruction_separately() {
        let mut server = Server::new_async().await;
        let prompts = PromptConfiguration {
            system_instruction: "PERSONA".to_string(),
            task_instruction: "TASK".to_string(),
        };
        let mock = server
            .mock("POST", "/v1beta/models/test-model:generateContent")
            .match_header("x-goog-api-key", "secret")
            .match_body(Matcher::PartialJson(json!({
                "systemInstruction": {"parts": [{"text": "PERSONA"}]},
                "contents": [{"role": "user", "parts": [{"text": build_request_body("TASK", "a", "b")}]}]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r###"{"candidates":[{"content":{"parts":[{"text":"## Differences"}]}}]}"###)
            .create_async()
            .await;

        let client = GeminiClient::new(Client::new(), Some("secret".to_string()))
            .with_model("test-model")
            .with_base_url(server.url());
        let text = client.analyze(&prompts, "a", "b").await.unwrap();

        assert_eq!(text, "## Differences");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_service_error_message_is_surfaced() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", Matcher::Any)
            .with_status(429)
            .with_body(r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#)
            .create_async()
            .await;

        let client = GeminiClient::new(Client::new(), Some("k".to_string()))
            .with_base_url(server.url());
        let err = client
            .analyze(&PromptConfiguration::default(), "a", "b")
            .await
            .unwrap_err();

        assert!(matches!(err, CompareError::Service(ref m) if m == "Quota exceeded"));
        assert_eq!(err.to_string(), "Gemini API request failed: Quota exceeded");
    }

    #[tokio::test]
    async fn test_empty_response_is_returned_as_is() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", Matcher::Any)
            .with_status(200)
            .with_body(r#"{"candidates":[]}"#)
            .create_async()
            .await;

        let client = GeminiClient::new(Client::new(), Some("k".to_string()))
            .with_base_url(server.url());
        let text = client
            .analyze(&PromptConfiguration::default(), "a", "b")
            .await
            .unwrap();
        assert_eq!(text, "");
    }
}
