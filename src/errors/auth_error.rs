//! Authentication errors
//!
//! Failures produced by the auth middleware while validating the service
//! credential presented on a request.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Errors that can occur during request authentication
#[derive(Debug, Error)]
pub enum AuthError {
    /// No Authorization header or `token` query parameter was present
    #[error("missing authentication token")]
    MissingAuthHeader,

    /// The Authorization header was present but not a valid bearer token
    #[error("invalid authorization header")]
    InvalidAuthHeader,

    /// The presented token did not match any configured API secret
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Authentication is required but the server has no secrets configured
    #[error("authentication configuration error: {0}")]
    ConfigError(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match self {
            AuthError::MissingAuthHeader
            | AuthError::InvalidAuthHeader
            | AuthError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AuthError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            AuthError::MissingAuthHeader.to_string(),
            "missing authentication token"
        );
        assert_eq!(
            AuthError::Unauthorized("bad token".to_string()).to_string(),
            "unauthorized: bad token"
        );
    }
}
