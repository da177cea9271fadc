//! Application-level API errors
//!
//! Errors returned by the REST handlers, rendered as JSON bodies with an
//! appropriate status code.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::core::session::SessionError;
use crate::utils::url_validation::UrlValidationError;

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors that can occur in REST API handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// The bootstrap request did not carry a `callUrl` field
    #[error("callUrl is required")]
    MissingCallUrl,

    /// The bootstrap `callUrl` field is not a usable URL
    #[error("invalid callUrl: {0}")]
    InvalidCallUrl(#[from] UrlValidationError),

    /// Session lookup or lifecycle failure
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Anything that should surface as a 500 without leaking internals
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingCallUrl | ApiError::InvalidCallUrl(_) => StatusCode::BAD_REQUEST,
            ApiError::Session(SessionError::NotFound) => StatusCode::NOT_FOUND,
            ApiError::Session(SessionError::Closed) => StatusCode::GONE,
            ApiError::Session(SessionError::AlreadyAttached) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
