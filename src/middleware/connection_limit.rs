//! Connection limit middleware for WebSocket connections
//!
//! Enforces a global maximum on concurrent WebSocket connections plus a
//! per-IP cap, so one misbehaving client cannot exhaust server capacity.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use crate::state::{AppState, ConnectionLimitError};

/// Extension type carrying the client IP through to the handler so the
/// handler can release the connection slot when the socket closes.
#[derive(Clone, Debug)]
pub struct ClientIp(pub IpAddr);

/// Middleware that enforces connection limits for WebSocket upgrades.
///
/// Returns 503 Service Unavailable when the global limit is exhausted and
/// 429 Too Many Requests when the per-IP limit is exceeded. Non-upgrade
/// requests pass through without a limit check. On success a [`ClientIp`]
/// extension is injected; the WebSocket handler owns releasing the slot.
///
/// Must be layered inside any middleware that can reject the request (auth):
/// once a slot is acquired, only the handler releases it, so nothing may
/// short-circuit between this layer and the handler.
pub async fn connection_limit_middleware(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let is_ws_upgrade = request
        .headers()
        .get("upgrade")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.eq_ignore_ascii_case("websocket"))
        .unwrap_or(false);

    if !is_ws_upgrade {
        return next.run(request).await;
    }

    let client_ip = addr.ip();

    match state.try_acquire_connection(client_ip) {
        Ok(()) => {
            request.extensions_mut().insert(ClientIp(client_ip));
            next.run(request).await
        }
        Err(ConnectionLimitError::GlobalLimitReached) => {
            tracing::warn!(ip = %client_ip, "rejecting connection: global limit reached");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "Server at capacity. Please try again later.",
            )
                .into_response()
        }
        Err(ConnectionLimitError::PerIpLimitReached) => {
            tracing::warn!(ip = %client_ip, "rejecting connection: per-IP limit reached");
            (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many connections from your IP address.",
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_limit_error_variants() {
        assert_eq!(
            format!("{:?}", ConnectionLimitError::GlobalLimitReached),
            "GlobalLimitReached"
        );
        assert_eq!(
            format!("{:?}", ConnectionLimitError::PerIpLimitReached),
            "PerIpLimitReached"
        );
    }

    // Slot accounting (acquire/release/limits) is covered by the AppState
    // unit tests; the 503/429 mapping is covered end-to-end in
    // tests/server_startup.rs.
}
