pub mod base;
pub mod groq;
pub mod openai;

// Re-export public types and traits
pub use base::{SttConfig, SttError, Transcriber, Transcription};
pub use groq::{GroqSttConfig, GroqSttModel, GroqTranscriber};
pub use openai::{OpenAiSttConfig, OpenAiSttModel, OpenAiTranscriber};

use std::sync::Arc;

/// Supported STT providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SttProvider {
    /// OpenAI Whisper REST API
    OpenAi,
    /// Groq Whisper-compatible REST API (low latency)
    Groq,
}

impl std::fmt::Display for SttProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SttProvider::OpenAi => write!(f, "openai"),
            SttProvider::Groq => write!(f, "groq"),
        }
    }
}

impl std::str::FromStr for SttProvider {
    type Err = SttError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" | "whisper" => Ok(SttProvider::OpenAi),
            "groq" => Ok(SttProvider::Groq),
            _ => Err(SttError::Configuration(format!(
                "Unsupported STT provider: {s}. Supported providers: openai, groq"
            ))),
        }
    }
}

/// Factory function to create a transcriber by provider name.
///
/// # Arguments
/// * `provider` - The name of the STT provider (e.g. "openai")
/// * `config` - Shared configuration for the adapter
///
/// # Returns
/// * `Result<Arc<dyn Transcriber>, SttError>` - A shareable transcriber or error
pub fn create_transcriber(
    provider: &str,
    config: SttConfig,
) -> Result<Arc<dyn Transcriber>, SttError> {
    match provider.parse::<SttProvider>()? {
        SttProvider::OpenAi => Ok(Arc::new(OpenAiTranscriber::new(config)?)),
        SttProvider::Groq => Ok(Arc::new(GroqTranscriber::new(config)?)),
    }
}

/// Get a list of all supported STT providers.
pub fn get_supported_stt_providers() -> Vec<&'static str> {
    vec!["openai", "groq"]
}
