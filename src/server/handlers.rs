//! HTTP handlers for the JSON API.
//!
//! Every failure is returned as `{ "error": message }` with a status derived
//! from the error's kind.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, warn};

use super::AppState;
use crate::api::AnalyzeAsync;
use crate::error::{CompareError, ErrorKind};
use crate::models::SearchResults;
use crate::orchestrator::search_sources;
use crate::prompts::PromptConfiguration;
use crate::scrapers::SourceFetcher;
use crate::store::ComparisonStore;
use std::sync::Arc;

/// Wrapper that turns a [`CompareError`] into a JSON error response.
pub struct ApiError(CompareError);

impl From<CompareError> for ApiError {
    fn from(err: CompareError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            CompareError::UpstreamStatus { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            CompareError::Transport(_) => StatusCode::BAD_GATEWAY,
            err => match err.kind() {
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Validation => StatusCode::BAD_REQUEST,
                ErrorKind::Busy => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, kind = ?self.0.kind(), "Request failed");
        } else {
            warn!(error = %self.0, status = status.as_u16(), "Request rejected");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Run a store operation on the blocking pool; rusqlite calls never run on the
/// async executor.
async fn with_store<T, F>(state: &AppState, op: F) -> Result<T, CompareError>
where
    F: FnOnce(&ComparisonStore) -> Result<T, CompareError> + Send + 'static,
    T: Send + 'static,
{
    let store = Arc::clone(&state.store);
    tokio::task::spawn_blocking(move || op(&store)).await?
}

#[derive(Debug, Serialize)]
pub struct HtmlResponse {
    html: String,
}

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    extract: String,
}

/// Raw Grokipedia page for `term`.
pub async fn grokipedia_source(
    State(state): State<AppState>,
    Path(term): Path<String>,
) -> ApiResult<HtmlResponse> {
    let html = state.grokipedia.fetch(&term).await?;
    Ok(Json(HtmlResponse { html }))
}

/// Wikipedia plain-text extract for `term`.
pub async fn wikipedia_extract(
    State(state): State<AppState>,
    Path(term): Path<String>,
) -> ApiResult<ExtractResponse> {
    let extract = state.wikipedia.fetch(&term).await?;
    Ok(Json(ExtractResponse { extract }))
}

/// Both sources fetched concurrently, Grokipedia normalized.
pub async fn search(
    State(state): State<AppState>,
    Path(term): Path<String>,
) -> ApiResult<SearchResults> {
    let results = search_sources(state.grokipedia.as_ref(), state.wikipedia.as_ref(), &term).await?;
    Ok(Json(results))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompareRequest {
    system_prompt: String,
    user_prompt: String,
    grokipedia_text: String,
    wikipedia_text: String,
}

#[derive(Debug, Serialize)]
pub struct CompareResponse {
    comparison: String,
}

/// Gemini analysis of two already-stripped texts. Nothing is saved.
pub async fn compare(
    State(state): State<AppState>,
    Json(req): Json<CompareRequest>,
) -> ApiResult<CompareResponse> {
    if [
        &req.system_prompt,
        &req.user_prompt,
        &req.grokipedia_text,
        &req.wikipedia_text,
    ]
    .iter()
    .any(|f| f.trim().is_empty())
    {
        return Err(CompareError::Validation(
            "Missing required fields: systemPrompt, userPrompt, grokipediaText, wikipediaText"
                .to_string(),
        )
        .into());
    }

    let prompts = PromptConfiguration {
        system_instruction: req.system_prompt,
        task_instruction: req.user_prompt,
    };
    let comparison = state
        .engine
        .analyze(&prompts, &req.grokipedia_text, &req.wikipedia_text)
        .await?;
    Ok(Json(CompareResponse { comparison }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SaveRequest {
    term: String,
    grokipedia_html: String,
    wikipedia_text: String,
    gemini_comparison: String,
}

/// Persist a comparison and return its id.
pub async fn save_comparison(
    State(state): State<AppState>,
    Json(req): Json<SaveRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = with_store(&state, move |store| {
        store.create(
            &req.term,
            &req.grokipedia_html,
            &req.wikipedia_text,
            &req.gemini_comparison,
        )
    })
    .await?;
    Ok(Json(json!({ "id": id })))
}

pub async fn list_comparisons(State(state): State<AppState>) -> Response {
    match with_store(&state, |store| store.list_all()).await {
        Ok(records) => Json(records).into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

pub async fn get_comparison(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match with_store(&state, move |store| store.get_by_id(id)).await {
        Ok(Some(record)) => Json(record).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Comparison not found" })),
        )
            .into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

pub async fn delete_comparison(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match with_store(&state, move |store| store.delete_by_id(id)).await {
        Ok(true) => Json(json!({ "success": true })).into_response(),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Comparison not found" })),
        )
            .into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}
