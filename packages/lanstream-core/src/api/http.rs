//! HTTP route table and REST handlers.
//!
//! All handlers are thin - they delegate to services for business logic.

use axum::{
    extract::State,
    http::{header, Method},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};

use crate::api::stream::{missing_id, stream_art, stream_song};
use crate::api::AppState;
use crate::protocol_constants::SERVICE_ID;

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

/// Creates the Axum router with all routes.
///
/// GET routes answer HEAD as well (headers only).
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/song/{id}", get(stream_song))
        .route("/song", get(missing_id))
        .route("/song/", get(missing_id))
        .route("/art/{id}", get(stream_art))
        .route("/art", get(missing_id))
        .route("/art/", get(missing_id))
        .layer(cors_layer())
        .with_state(state)
}

/// Lets browser players on the LAN issue range requests and read the
/// range headers of the response.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::HEAD])
        .allow_headers([header::RANGE])
        .expose_headers([
            header::CONTENT_RANGE,
            header::ACCEPT_RANGES,
            header::CONTENT_LENGTH,
            header::CONTENT_TYPE,
        ])
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Liveness probe: "Is the process running?"
///
/// Always returns 200 OK if the server is responding.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": SERVICE_ID,
        "address": state.server_state.bound_address(),
        "activeStreams": state.streamer.active_streams(),
    }))
}
