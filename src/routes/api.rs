//! REST API route configuration
//!
//! Routes that require authentication when it is enabled. The health check
//! is deliberately not here — it stays public so load balancers can poll it.

use axum::{Router, routing::post};
use tower_http::trace::TraceLayer;

use crate::handlers::api::bootstrap_session;
use crate::state::AppState;
use std::sync::Arc;

/// Create the protected API router
///
/// # Endpoints
///
/// `POST /session` - mint a session for a call source.
/// Request: `{"callUrl": "https://..."}`; response: `{"sessionId": "..."}`.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/session", post(bootstrap_session))
        .layer(TraceLayer::new_for_http())
}
