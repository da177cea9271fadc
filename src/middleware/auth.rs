//! Authentication middleware
//!
//! Validates the service credential on every request when authentication is
//! enabled. Only API-secret bearer auth is supported; the relay trusts
//! whatever identity infrastructure sits in front of it for anything richer.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::auth::{Auth, match_api_secret_id};
use crate::errors::auth_error::AuthError;
use crate::state::AppState;

/// Extract the authentication token from a request.
///
/// Supports two sources for browser/WebSocket compatibility:
/// 1. Authorization header: `Authorization: Bearer <token>` (preferred)
/// 2. Query parameter: `?token=<token>` — browsers cannot set headers on a
///    WebSocket upgrade request
fn extract_token(request: &Request) -> Result<String, AuthError> {
    if let Some(auth_header) = request.headers().get("authorization") {
        let auth_str = auth_header
            .to_str()
            .map_err(|_| AuthError::InvalidAuthHeader)?;

        if let Some(token) = auth_str.strip_prefix("Bearer ") {
            return Ok(token.to_string());
        }
        return Err(AuthError::InvalidAuthHeader);
    }

    if let Some(query) = request.uri().query() {
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            if key == "token" {
                tracing::debug!("token extracted from query parameter");
                return Ok(value.to_string());
            }
        }
    }

    Err(AuthError::MissingAuthHeader)
}

/// Middleware validating the bearer token against configured API secrets.
///
/// When `auth_required` is off an empty [`Auth`] context is inserted so
/// handlers that read `Extension<Auth>` keep working. On success the matched
/// secret's identifier is attached; on failure the request is rejected with
/// 401 before reaching any handler.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    if !state.config.auth_required {
        request.extensions_mut().insert(Auth::empty());
        return Ok(next.run(request).await);
    }

    if !state.config.has_api_secret_auth() {
        return Err(AuthError::ConfigError(
            "authentication required but no API secrets configured".to_string(),
        ));
    }

    let path = request.uri().path().to_string();
    let token = extract_token(&request)?;

    match match_api_secret_id(&token, &state.config.auth_api_secrets) {
        Some(secret_id) => {
            tracing::debug!(path = %path, auth_id = %secret_id, "API secret authentication successful");
            request.extensions_mut().insert(Auth::new(secret_id.to_string()));
            Ok(next.run(request).await)
        }
        None => {
            tracing::warn!(path = %path, "API secret authentication failed: token mismatch");
            Err(AuthError::Unauthorized("invalid API secret".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Method;

    fn request_with_header(value: &str) -> Request {
        Request::builder()
            .method(Method::POST)
            .uri("/session")
            .header("authorization", value)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_extract_token_from_bearer_header() {
        let request = request_with_header("Bearer my-token");
        assert_eq!(extract_token(&request).unwrap(), "my-token");
    }

    #[test]
    fn test_extract_token_rejects_non_bearer_scheme() {
        let request = request_with_header("Basic dXNlcjpwYXNz");
        assert!(matches!(
            extract_token(&request),
            Err(AuthError::InvalidAuthHeader)
        ));
    }

    #[test]
    fn test_extract_token_from_query_parameter() {
        let request = Request::builder()
            .method(Method::GET)
            .uri("/stream?session=abc&token=ws-token")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_token(&request).unwrap(), "ws-token");
    }

    #[test]
    fn test_extract_token_missing() {
        let request = Request::builder()
            .method(Method::GET)
            .uri("/stream")
            .body(Body::empty())
            .unwrap();
        assert!(matches!(
            extract_token(&request),
            Err(AuthError::MissingAuthHeader)
        ));
    }

    // Full middleware behavior is exercised in tests/server_startup.rs with
    // real routers, where the middleware runs in its natural position.
}
