//! OpenAI Whisper transcription client.
//!
//! Unlike WebSocket-streaming STT providers, the OpenAI transcription API is
//! plain REST: each audio segment is posted as a multipart upload and the
//! response carries the finished text. The relay submits one request per
//! chunk, so this adapter holds no audio state of its own — just a pooled
//! HTTP client and its configuration.

use std::time::Duration;

use bytes::Bytes;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use tracing::debug;

use super::super::base::{SttConfig, SttError, Transcriber, Transcription};
use super::config::OpenAiSttConfig;
use super::messages::{OpenAiErrorResponse, TranscriptionResponse};

/// Ceiling on any single HTTP exchange. The relay applies its own (shorter,
/// configurable) per-call timeout; this guards against a wedged connection
/// outliving the caller.
const HTTP_TIMEOUT: Duration = Duration::from_secs(120);

/// OpenAI Whisper STT client implementing the [`Transcriber`] trait.
pub struct OpenAiTranscriber {
    config: OpenAiSttConfig,
    /// HTTP client reused across requests (connection pooling).
    http_client: Client,
}

impl OpenAiTranscriber {
    /// Create a client from the shared base configuration.
    pub fn new(config: SttConfig) -> Result<Self, SttError> {
        Self::with_config(OpenAiSttConfig::from_base(config))
    }

    /// Create a client with provider-specific configuration.
    pub fn with_config(config: OpenAiSttConfig) -> Result<Self, SttError> {
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

        if let Some(temp) = self.config.temperature {
            form = form.text("temperature", temp.to_string());
        }

        Ok(form)
    }

    /// Map a non-success response into the error taxonomy.
    fn error_from_response(status: u16, retry_after: Option<Duration>, body: &str) -> SttError {
        // Prefer the structured error message when the body parses
        let message = match serde_json::from_str::<OpenAiErrorResponse>(body) {
            Ok(parsed) if !parsed.error.error_type.is_empty() => {
                format!("{} ({})", parsed.error.message, parsed.error.error_type)
            }
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

/// Parse a Retry-After header value (delta-seconds form only).
pub(crate) fn parse_retry_after(raw: &str) -> Option<Duration> {
    raw.trim().parse::<u64>().ok().map(Duration::from_secs)
}

#[async_trait::async_trait]
impl Transcriber for OpenAiTranscriber {
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
            "OpenAI transcription complete"
        );

        Ok(Transcription { text: parsed.text })
    }

    fn provider_info(&self) -> &'static str {
        "OpenAI Whisper STT"
    }
}
