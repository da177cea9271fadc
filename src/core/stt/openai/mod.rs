//! OpenAI Whisper STT adapter
//!
//! REST-based transcription through the OpenAI Audio Transcriptions API.

mod client;
mod config;
mod messages;

pub use client::OpenAiTranscriber;
pub use config::{OpenAiSttConfig, OpenAiSttModel};
