//! Wire types for the Groq audio transcription API.

use serde::Deserialize;

/// Successful transcription response (`response_format=json`).
///
/// Groq responses additionally carry an `x_groq` envelope with a request id,
/// useful when raising issues against their API.
#[derive(Debug, Clone, Deserialize)]
pub(super) struct TranscriptionResponse {
    pub text: String,
    #[serde(default)]
    pub x_groq: Option<XGroq>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct XGroq {
    pub id: String,
}

/// Error envelope (OpenAI-compatible shape).
#[derive(Debug, Deserialize)]
pub(super) struct GroqErrorResponse {
    pub error: GroqErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(super) struct GroqErrorDetail {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response_with_request_id() {
        let raw = r#"{"text": "ordered words", "x_groq": {"id": "req_01"}}"#;
        let response: TranscriptionResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.text, "ordered words");
        assert_eq!(response.x_groq.unwrap().id, "req_01");
    }

    #[test]
    fn test_parse_response_without_request_id() {
        let response: TranscriptionResponse =
            serde_json::from_str(r#"{"text": "plain"}"#).unwrap();
        assert!(response.x_groq.is_none());
    }

    #[test]
    fn test_parse_error_response() {
        let raw = r#"{"error": {"message": "Rate limit reached", "type": "requests"}}"#;
        let response: GroqErrorResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.error.message, "Rate limit reached");
    }
}
