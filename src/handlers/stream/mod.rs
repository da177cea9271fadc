//! Streaming WebSocket endpoint
//!
//! One live connection per session: binary frames in, ordered transcript
//! frames out. The handler owns the per-connection pipeline (sequencer,
//! transcription client, in-flight task set) and tears all of it down when
//! the socket goes away.

mod handler;
mod messages;

pub use handler::{StreamParams, stream_handler};
pub use messages::TranscriptFrame;
