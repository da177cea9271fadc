//! Groq Whisper STT adapter
//!
//! Groq serves Whisper models behind an OpenAI-compatible REST endpoint with
//! substantially lower latency, which makes it a good fit for per-chunk
//! transcription. The wire shape matches the OpenAI adapter; what differs is
//! the endpoint, the model catalog, and aggressive rate limiting surfaced
//! through Retry-After headers.

mod client;
mod config;
mod messages;

pub use client::GroqTranscriber;
pub use config::{GroqSttConfig, GroqSttModel};
