//! Router configuration for the web server.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;

use super::AppState;
use super::handlers;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Source proxies
        .route("/api/grokipedia/:term", get(handlers::grokipedia_source))
        .route("/api/wikipedia/:term", get(handlers::wikipedia_extract))
        .route("/api/search/:term", get(handlers::search))
        // Analysis
        .route("/api/compare", post(handlers::compare))
        // Saved comparisons
        .route(
            "/api/comparisons",
            get(handlers::list_comparisons).post(handlers::save_comparison),
        )
        .route(
            "/api/comparisons/:id",
            get(handlers::get_comparison).delete(handlers::delete_comparison),
        )
        // Requests carry whole articles.
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
