//! Configuration types for the Groq Whisper adapter.

use serde::{Deserialize, Serialize};

use super::super::base::SttConfig;

/// Default API endpoint for Groq audio transcriptions.
pub(super) const GROQ_STT_URL: &str = "https://api.groq.com/openai/v1/audio/transcriptions";

/// Supported Groq Whisper models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GroqSttModel {
    /// Fastest Whisper variant, best price/performance for streaming
    #[default]
    #[serde(rename = "whisper-large-v3-turbo")]
    WhisperLargeV3Turbo,
    /// Full-size Whisper for maximum accuracy
    #[serde(rename = "whisper-large-v3")]
    WhisperLargeV3,
}

impl GroqSttModel {
    /// Convert to the API parameter value.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WhisperLargeV3Turbo => "whisper-large-v3-turbo",
            Self::WhisperLargeV3 => "whisper-large-v3",
        }
    }

    /// Parse from string, with fallback to default.
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "whisper-large-v3" => Self::WhisperLargeV3,
            _ => Self::WhisperLargeV3Turbo,
        }
    }
}

impl std::fmt::Display for GroqSttModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Configuration specific to the Groq transcription API.
#[derive(Debug, Clone, Default)]
pub struct GroqSttConfig {
    /// Base STT configuration (shared across all providers).
    pub base: SttConfig,

    /// Groq Whisper model to use.
    pub model: GroqSttModel,
}

impl GroqSttConfig {
    /// Create a configuration from the shared base, resolving the model name.
    pub fn from_base(base: SttConfig) -> Self {
        let model = if base.model.is_empty() {
            GroqSttModel::default()
        } else {
            GroqSttModel::from_str_or_default(&base.model)
        };

        Self { base, model }
    }

    /// Effective API endpoint URL.
    pub fn api_url(&self) -> &str {
        self.base.endpoint.as_deref().unwrap_or(GROQ_STT_URL)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.base.api_key.is_empty() {
            return Err("API key is required".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_as_str() {
        assert_eq!(
            GroqSttModel::WhisperLargeV3Turbo.as_str(),
            "whisper-large-v3-turbo"
        );
        assert_eq!(GroqSttModel::WhisperLargeV3.as_str(), "whisper-large-v3");
    }

    #[test]
    fn test_model_from_str_falls_back_to_turbo() {
        assert_eq!(
            GroqSttModel::from_str_or_default("whisper-large-v3"),
            GroqSttModel::WhisperLargeV3
        );
        assert_eq!(
            GroqSttModel::from_str_or_default("anything-else"),
            GroqSttModel::WhisperLargeV3Turbo
        );
    }

    #[test]
    fn test_endpoint_default_and_override() {
        let config = GroqSttConfig::from_base(SttConfig {
            api_key: "gsk-test".to_string(),
            ..Default::default()
        });
        assert_eq!(config.api_url(), GROQ_STT_URL);

        let config = GroqSttConfig::from_base(SttConfig {
            api_key: "gsk-test".to_string(),
            endpoint: Some("http://localhost:8080/stt".to_string()),
            ..Default::default()
        });
        assert_eq!(config.api_url(), "http://localhost:8080/stt");
    }

    #[test]
    fn test_validation_requires_api_key() {
        assert!(GroqSttConfig::default().validate().is_err());
    }
}
