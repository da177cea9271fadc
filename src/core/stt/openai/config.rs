//! Configuration types for the OpenAI Whisper adapter.

use serde::{Deserialize, Serialize};

use super::super::base::SttConfig;

/// Default API endpoint for audio transcriptions.
pub(super) const OPENAI_STT_URL: &str = "https://api.openai.com/v1/audio/transcriptions";

/// Supported OpenAI transcription models.
///
/// - `whisper-1`: original Whisper model, good balance of speed and accuracy
/// - `gpt-4o-transcribe`: enhanced transcription with GPT-4o intelligence
/// - `gpt-4o-mini-transcribe`: faster, cost-effective transcription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OpenAiSttModel {
    #[default]
    #[serde(rename = "whisper-1")]
    Whisper1,
    #[serde(rename = "gpt-4o-transcribe")]
    Gpt4oTranscribe,
    #[serde(rename = "gpt-4o-mini-transcribe")]
    Gpt4oMiniTranscribe,
}

impl OpenAiSttModel {
    /// Convert to the API parameter value.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Whisper1 => "whisper-1",
            Self::Gpt4oTranscribe => "gpt-4o-transcribe",
            Self::Gpt4oMiniTranscribe => "gpt-4o-mini-transcribe",
        }
    }

    /// Parse from string, with fallback to default.
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "whisper-1" | "whisper1" | "whisper" => Self::Whisper1,
            "gpt-4o-transcribe" | "gpt4o-transcribe" => Self::Gpt4oTranscribe,
            "gpt-4o-mini-transcribe" | "gpt4o-mini-transcribe" => Self::Gpt4oMiniTranscribe,
            _ => Self::default(),
        }
    }
}

impl std::fmt::Display for OpenAiSttModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Configuration specific to the OpenAI transcription API.
#[derive(Debug, Clone, Default)]
pub struct OpenAiSttConfig {
    /// Base STT configuration (shared across all providers).
    pub base: SttConfig,

    /// OpenAI transcription model to use.
    pub model: OpenAiSttModel,

    /// Temperature for sampling (0.0 to 1.0). Lower is more deterministic.
    pub temperature: Option<f32>,
}

impl OpenAiSttConfig {
    /// Create a configuration from the shared base, resolving the model name.
    pub fn from_base(base: SttConfig) -> Self {
        let model = if base.model.is_empty() {
            OpenAiSttModel::default()
        } else {
            OpenAiSttModel::from_str_or_default(&base.model)
        };

        Self {
            base,
            model,
            temperature: None,
        }
    }

    /// Effective API endpoint URL.
    pub fn api_url(&self) -> &str {
        self.base.endpoint.as_deref().unwrap_or(OPENAI_STT_URL)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.base.api_key.is_empty() {
            return Err("API key is required".to_string());
        }

        if let Some(temp) = self.temperature
            && !(0.0..=1.0).contains(&temp)
        {
            return Err(format!(
                "Temperature must be between 0.0 and 1.0, got {}",
                temp
            ));
        }

        Ok(())
    }
}
