//! Outbound wire messages for the streaming endpoint.

use serde::{Deserialize, Serialize};

use crate::core::relay::TranscriptResult;
use crate::utils::epoch_millis;

/// One result frame, emitted per inbound chunk in strict submission order.
///
/// `error` is present only for chunks whose provider call failed for good;
/// `text` is empty in that case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptFrame {
    pub text: String,
    /// Emission time, milliseconds since the Unix epoch
    pub timestamp: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TranscriptFrame {
    /// Build the frame for a result at emission time.
    pub fn from_result(result: &TranscriptResult) -> Self {
        Self {
            text: result.text.clone(),
            timestamp: epoch_millis(),
            error: result.error.clone(),
        }
    }
}

/// Route for the per-connection sender task.
#[derive(Debug)]
pub enum StreamRoute {
    Result(TranscriptFrame),
    Close,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_success_frame_omits_error_field() {
        let result = TranscriptResult::success(3, "hello".to_string(), Duration::from_millis(80));
        let frame = TranscriptFrame::from_result(&result);
        let json = serde_json::to_string(&frame).unwrap();

        assert!(json.contains(r#""text":"hello""#));
        assert!(json.contains(r#""timestamp":"#));
        assert!(!json.contains("error"));
    }

    #[test]
    fn test_error_frame_carries_marker() {
        let result =
            TranscriptResult::failed(5, "retries exhausted".to_string(), Duration::from_secs(9));
        let frame = TranscriptFrame::from_result(&result);
        let json = serde_json::to_string(&frame).unwrap();

        assert!(json.contains(r#""error":"retries exhausted""#));
        assert!(json.contains(r#""text":"""#));
    }

    #[test]
    fn test_frame_round_trips() {
        let frame = TranscriptFrame {
            text: "words".to_string(),
            timestamp: 1_700_000_000_000,
            error: None,
        };
        let parsed: TranscriptFrame =
            serde_json::from_str(&serde_json::to_string(&frame).unwrap()).unwrap();
        assert_eq!(parsed.text, "words");
        assert_eq!(parsed.timestamp, 1_700_000_000_000);
    }
}
