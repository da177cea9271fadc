//! Base trait and shared types for speech-to-text provider adapters
//!
//! Every provider exposes the same narrow surface: one audio segment in, one
//! transcription out. Buffering, ordering, admission control, and retries all
//! live above this trait in the relay pipeline, which keeps adapters
//! stateless and trivially shareable across connections.

use std::time::Duration;

use bytes::Bytes;
use thiserror::Error;

/// A single transcription produced from one audio segment.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcription {
    /// Transcribed text (may be empty for silent audio)
    pub text: String,
}

/// Configuration shared across all STT provider adapters.
#[derive(Debug, Clone, Default)]
pub struct SttConfig {
    /// Service credential for the provider API
    pub api_key: String,
    /// Model identifier; provider default when empty
    pub model: String,
    /// Language hint (e.g. "en"); omitted from the request when empty
    pub language: String,
    /// Override for the provider endpoint URL (self-hosted gateways, tests)
    pub endpoint: Option<String>,
}

/// Errors produced by STT provider adapters.
#[derive(Debug, Clone, Error)]
pub enum SttError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("rate limited: {message}")]
    RateLimited {
        message: String,
        /// Provider-suggested wait before retrying, from a Retry-After header
        retry_after: Option<Duration>,
    },

    #[error("provider error ({status}): {message}")]
    Provider { status: u16, message: String },

    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

impl SttError {
    /// Whether the failure class is worth retrying.
    ///
    /// Network errors, timeouts, rate limits, and 5xx responses are
    /// transient; authentication and request-shape failures are not.
    pub fn is_transient(&self) -> bool {
        match self {
            SttError::Network(_) | SttError::Timeout(_) | SttError::RateLimited { .. } => true,
            SttError::Provider { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Provider-suggested retry delay, when one was given.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            SttError::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

/// Unified interface to an external speech-to-text provider.
///
/// Implementations are stateless per call: each invocation submits one opaque
/// audio segment and resolves to exactly one transcription or error. The
/// relay layers its own timeout and retry policy on top, so adapters should
/// surface failures promptly rather than retrying internally.
#[async_trait::async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe one audio segment.
    async fn transcribe(&self, audio: Bytes) -> Result<Transcription, SttError>;

    /// Human-readable provider description for logs.
    fn provider_info(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(SttError::Network("reset".into()).is_transient());
        assert!(SttError::Timeout(Duration::from_secs(5)).is_transient());
        assert!(
            SttError::RateLimited {
                message: "slow down".into(),
                retry_after: None
            }
            .is_transient()
        );
        assert!(
            SttError::Provider {
                status: 503,
                message: "unavailable".into()
            }
            .is_transient()
        );
    }

    #[test]
    fn test_fatal_classification() {
        assert!(!SttError::Authentication("bad key".into()).is_transient());
        assert!(!SttError::InvalidRequest("no file".into()).is_transient());
        assert!(!SttError::Configuration("missing key".into()).is_transient());
        assert!(
            !SttError::Provider {
                status: 404,
                message: "not found".into()
            }
            .is_transient()
        );
    }

    #[test]
    fn test_retry_after_only_on_rate_limit() {
        let err = SttError::RateLimited {
            message: "429".into(),
            retry_after: Some(Duration::from_millis(1500)),
        };
        assert_eq!(err.retry_after(), Some(Duration::from_millis(1500)));
        assert_eq!(SttError::Network("x".into()).retry_after(), None);
    }
}
