//! HTTP routes for the conversation API.

use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit, http::HeaderValue, routing::get, routing::post, Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::warn;

use super::handlers::{chat, health, submit_contact, upload_resume, AppState};

/// Builds the API router with the standard middleware stack.
///
/// The body limit sits above the configured upload ceiling so the multipart
/// machinery can read a full oversized file and reject it with a JSON error
/// instead of a connection reset.
pub fn api_router(
    state: AppState,
    request_timeout: Duration,
    cors_origins: &[String],
) -> Router {
    let body_limit = state.max_upload_bytes + 64 * 1024;

    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/upload-resume", post(upload_resume))
        .route("/api/submit-contact", post(submit_contact))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Restricts CORS to the configured origins; an empty list allows any
/// origin (development default). Unparseable origins are skipped with a
/// warning rather than failing startup.
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(parsed))
        .allow_methods(Any)
        .allow_headers(Any)
}
