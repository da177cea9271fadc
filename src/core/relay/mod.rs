//! Per-connection transcription relay pipeline
//!
//! The relay turns a stream of concurrently-processed audio chunks back into
//! an ordered stream of transcript results:
//!
//! - [`types`] defines the chunk and result records that flow through the
//!   pipeline
//! - [`client`] wraps a [`crate::core::stt::Transcriber`] with admission
//!   control, per-call timeouts, and retry with exponential backoff
//! - [`sequencer`] is the reorder buffer that releases completions in
//!   submission order
//!
//! Each live connection owns one `TranscriptionClient` and one
//! `ChunkSequencer`; nothing here is shared between sessions except the
//! optional process-wide admission semaphore.

pub mod client;
pub mod sequencer;
pub mod types;

pub use client::TranscriptionClient;
pub use sequencer::ChunkSequencer;
pub use types::{Chunk, TranscriptResult};
