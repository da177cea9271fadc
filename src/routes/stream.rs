//! Streaming WebSocket route configuration

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::stream::stream_handler;
use crate::state::AppState;
use std::sync::Arc;

/// Create the streaming WebSocket router
///
/// # Endpoint
///
/// `GET /stream?session=<id>` - WebSocket upgrade for live transcription
///
/// # Protocol
///
/// The `session` parameter must name a session minted by `POST /session`
/// that is not closed and has no other live connection.
///
/// After upgrade, clients send binary frames, one opaque audio chunk each.
/// The server responds with one JSON text frame per chunk, in strict
/// submission order:
///
/// ```json
/// {"text": "transcribed words", "timestamp": 1724232291731}
/// {"text": "", "timestamp": 1724232292105, "error": "request timed out after 30s"}
/// ```
///
/// Connection-level failures close the socket; they are never reported as
/// result frames.
pub fn create_stream_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/stream", get(stream_handler))
        .layer(TraceLayer::new_for_http())
}
