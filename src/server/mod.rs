//! HTTP server exposing the generation services.
//!
//! Routes:
//! - `GET  /healthz`
//! - `POST /api/descriptions`
//! - `POST /api/feedback/summary`
//! - `POST /api/feedback/sentiment`
//! - `POST /api/feedback/reply`
//! - `POST /api/creatives` (multipart)
//! - `POST /api/videos` (multipart)

mod handlers;
mod state;

pub use state::{AppState, ServerConfig};

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::client::Client;
use crate::error::Result;

const UPLOAD_LIMIT: usize = 25 * 1024 * 1024;

/// Build the application router.
#[must_use]
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(handlers::health))
        .route("/api/descriptions", post(handlers::descriptions))
        .route("/api/feedback/summary", post(handlers::feedback_summary))
        .route(
            "/api/feedback/sentiment",
            post(handlers::feedback_sentiment),
        )
        .route("/api/feedback/reply", post(handlers::feedback_reply))
        .route(
            "/api/creatives",
            post(handlers::creatives).layer(DefaultBodyLimit::max(UPLOAD_LIMIT)),
        )
        .route(
            "/api/videos",
            post(handlers::promo_videos).layer(DefaultBodyLimit::max(UPLOAD_LIMIT)),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Resolve credentials from the environment and serve until shutdown.
///
/// # Errors
/// Fails when credential resolution or binding the listen address fails.
pub async fn serve(config: ServerConfig) -> Result<()> {
    let (client, mode) = Client::resolve_from_env().await?;
    tracing::info!(?mode, "credentials resolved");

    let state = Arc::new(AppState::new(client, mode));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
