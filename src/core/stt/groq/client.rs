//! Groq Whisper transcription client.
//!
//! Same request/response shape as the OpenAI adapter, pointed at Groq's
//! OpenAI-compatible endpoint. Groq enforces tight per-minute quotas, so 429
//! handling matters more here: the Retry-After header (which Groq emits in
//! both integral and fractional seconds) is parsed and surfaced for the
//! relay's backoff to honor.

use std::time::Duration;

use bytes::Bytes;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use tracing::debug;

use super::super::base::{SttConfig, SttError, Transcriber, Transcription};
use super::config::GroqSttConfig;
use super::messages::{GroqErrorResponse, TranscriptionResponse};

/// Ceiling on any single HTTP exchange; the relay's per-call timeout is the
/// operative bound.
const HTTP_TIMEOUT: Duration = Duration::from_secs(120);

/// Groq Whisper STT client implementing the [`Transcriber`] trait.
pub struct GroqTranscriber {
    config: GroqSttConfig,
    http_client: Client,
}

impl GroqTranscriber {
    /// Create a client from the shared base configuration.
    pub fn new(config: SttConfig) -> Result<Self, SttError> {
        Self::with_config(GroqSttConfig::from_base(config))
    }

    /// Create a client with provider-specific configuration.
    pub fn with_config(config: GroqSttConfig) -> Result<Self, SttError> {
        config.validate().map_err(SttError::Configuration)?;

        let http_client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .pool_max_idle_per_host(4)
            .build()
            .map_err(|e| SttError::Configuration(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    fn build_form(&self, audio: Bytes) -> Result<Form, SttError> {
        let file_part = Part::stream(audio)
            .file_name("chunk.wav")
            .mime_str("audio/wav")
            .map_err(|e| SttError::Configuration(format!("Invalid MIME type: {e}")))?;

        let mut form = Form::new()
            .part("file", file_part)
            .text("model", self.config.model.as_str().to_string())
            .text("response_format", "json");

        if !self.config.base.language.is_empty() {
            form = form.text("language", self.config.base.language.clone());
        }

        Ok(form)
    }

    fn error_from_response(status: u16, retry_after: Option<Duration>, body: &str) -> SttError {
        let message = match serde_json::from_str::<GroqErrorResponse>(body) {
            Ok(parsed) => parsed.error.message,
            Err(_) => body.to_string(),
        };

        match status {
            401 | 403 => SttError::Authentication(message),
            429 => SttError::RateLimited {
                message,
                retry_after,
            },
            400..=499 => SttError::InvalidRequest(message),
            _ => SttError::Provider { status, message },
        }
    }
}

/// Parse a Retry-After value. Groq sends delta-seconds, sometimes fractional
/// ("0.466").
pub(super) fn parse_retry_after(raw: &str) -> Option<Duration> {
    let trimmed = raw.trim();
    if let Ok(secs) = trimmed.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(Duration::from_secs_f64)
}

#[async_trait::async_trait]
impl Transcriber for GroqTranscriber {
    async fn transcribe(&self, audio: Bytes) -> Result<Transcription, SttError> {
        let audio_len = audio.len();
        let form = self.build_form(audio)?;

        let response = self
            .http_client
            .post(self.config.api_url())
            .header(
                "Authorization",
                format!("Bearer {}", self.config.base.api_key),
            )
            .multipart(form)
            .send()
            .await
            .map_err(|e| SttError::Network(format!("Request failed: {e}")))?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);

        let body = response
            .text()
            .await
            .map_err(|e| SttError::Network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(Self::error_from_response(
                status.as_u16(),
                retry_after,
                &body,
            ));
        }

        let parsed: TranscriptionResponse = serde_json::from_str(&body).map_err(|e| {
            SttError::Provider {
                status: status.as_u16(),
                message: format!("Failed to parse response: {e}"),
            }
        })?;

        debug!(
            audio_bytes = audio_len,
            text_chars = parsed.text.len(),
            request_id = parsed.x_groq.as_ref().map(|x| x.id.as_str()),
            "Groq transcription complete"
        );

        Ok(Transcription { text: parsed.text })
    }

    fn provider_info(&self) -> &'static str {
        "Groq Whisper STT"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_empty_api_key() {
        let result = GroqTranscriber::new(SttConfig::default());
        assert!(matches!(result, Err(SttError::Configuration(_))));
    }

    #[test]
    fn test_provider_info() {
        let client = GroqTranscriber::new(SttConfig {
            api_key: "gsk-test".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(client.provider_info(), "Groq Whisper STT");
    }

    #[test]
    fn test_parse_retry_after_integral_and_fractional() {
        assert_eq!(parse_retry_after("2"), Some(Duration::from_secs(2)));
        assert_eq!(
            parse_retry_after("0.5"),
            Some(Duration::from_secs_f64(0.5))
        );
        assert_eq!(parse_retry_after("-1"), None);
        assert_eq!(parse_retry_after("soon"), None);
    }

    #[test]
    fn test_error_mapping_rate_limit() {
        let err = GroqTranscriber::error_from_response(
            429,
            Some(Duration::from_millis(466)),
            r#"{"error": {"message": "Rate limit reached"}}"#,
        );
        assert!(err.is_transient());
        assert_eq!(err.retry_after(), Some(Duration::from_millis(466)));
    }

    #[test]
    fn test_error_mapping_unparseable_body_uses_raw_text() {
        let err = GroqTranscriber::error_from_response(502, None, "Bad Gateway");
        match err {
            SttError::Provider { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "Bad Gateway");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
