//! REST API handlers: health check and session bootstrap.

use std::sync::Arc;

use axum::{Extension, Json, extract::State};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;

use crate::auth::Auth;
use crate::errors::api_error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::utils::validate_call_url;

/// Liveness probe. Unauthenticated by design so load balancers can poll it.
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "scribe-relay",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Bootstrap request: the call-source URL this session will transcribe.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapRequest {
    pub call_url: Option<String>,
}

/// Bootstrap response: the opaque session identifier to present on the
/// streaming connection.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapResponse {
    pub session_id: String,
}

/// Mint a session for a call source.
///
/// Rejects before creating any state when `callUrl` is absent, empty, or not
/// a well-formed http(s) URL. The URL is recorded for correlation only; the
/// relay never fetches it.
pub async fn bootstrap_session(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<Auth>,
    Json(request): Json<BootstrapRequest>,
) -> ApiResult<Json<BootstrapResponse>> {
    let call_url = request
        .call_url
        .as_deref()
        .filter(|url| !url.is_empty())
        .ok_or(ApiError::MissingCallUrl)?;
    let call_url = validate_call_url(call_url)?;

    let session = state.sessions.create();
    info!(
        session_id = %session.id,
        call_url = %call_url,
        auth_id = ?auth.id,
        "session minted"
    );

    Ok(Json(BootstrapResponse {
        session_id: session.id,
    }))
}
