//! Same-origin JSON backend.
//!
//! Browsers cannot fetch Grokipedia pages directly, so the server fetches on
//! their behalf and exposes the rest of the pipeline over the same origin:
//!
//! | Method | Path | Purpose |
//! |--------|------|---------|
//! | GET | `/api/grokipedia/:term` | Raw Grokipedia page |
//! | GET | `/api/wikipedia/:term` | Wikipedia extract |
//! | GET | `/api/search/:term` | Both sources, normalized |
//! | POST | `/api/compare` | Gemini analysis of two texts |
//! | POST | `/api/comparisons` | Save a comparison |
//! | GET | `/api/comparisons` | All comparisons, newest first |
//! | GET | `/api/comparisons/:id` | One comparison |
//! | DELETE | `/api/comparisons/:id` | Delete a comparison |

mod handlers;
mod routes;

pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use crate::api::GeminiClient;
use crate::scrapers::{GrokipediaFetcher, WikipediaFetcher};
use crate::store::ComparisonStore;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub grokipedia: Arc<GrokipediaFetcher>,
    pub wikipedia: Arc<WikipediaFetcher>,
    pub engine: Arc<GeminiClient>,
    pub store: Arc<ComparisonStore>,
}

impl AppState {
    pub fn new(
        grokipedia: GrokipediaFetcher,
        wikipedia: WikipediaFetcher,
        engine: GeminiClient,
        store: ComparisonStore,
    ) -> Self {
        Self {
            grokipedia: Arc::new(grokipedia),
            wikipedia: Arc::new(wikipedia),
            engine: Arc::new(engine),
            store: Arc::new(store),
        }
    }
}

/// Bind `addr` and serve until the process is interrupted.
pub async fn serve(state: AppState, addr: SocketAddr) -> std::io::Result<()> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await
}
