//! Wire types for the OpenAI Audio Transcriptions API.

use serde::Deserialize;

/// Successful transcription response (`response_format=json`).
#[derive(Debug, Clone, Deserialize)]
pub(super) struct TranscriptionResponse {
    pub text: String,
}

/// Error envelope returned by the OpenAI API on non-success responses.
#[derive(Debug, Deserialize)]
pub(super) struct OpenAiErrorResponse {
    pub error: OpenAiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(super) struct OpenAiErrorDetail {
    pub message: String,
    #[serde(rename = "type", default)]
    pub error_type: String,
}
