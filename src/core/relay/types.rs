//! Data records flowing through the relay pipeline.

use std::time::{Duration, Instant};

use bytes::Bytes;

/// One opaque audio segment received as a single inbound frame.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Session the chunk belongs to
    pub session_id: String,
    /// Position in submission order, assigned at intake starting from 0
    pub sequence: u64,
    /// Raw audio bytes; the relay never inspects them
    pub payload: Bytes,
    /// Intake timestamp, used to compute end-to-end latency
    pub received_at: Instant,
}

impl Chunk {
    pub fn new(session_id: String, sequence: u64, payload: Bytes) -> Self {
        Self {
            session_id,
            sequence,
            payload,
            received_at: Instant::now(),
        }
    }
}

/// Outcome of transcribing one chunk.
///
/// Exactly one of these exists per admitted chunk, whether or not the
/// provider call succeeded: failures are carried in `error` rather than
/// propagated, so a bad chunk never takes the session down with it.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptResult {
    /// Sequence number of the chunk this result belongs to
    pub sequence: u64,
    /// Transcribed text; empty when the call failed
    pub text: String,
    /// Time from chunk intake to result resolution
    pub latency: Duration,
    /// Failure marker when the provider call did not produce text
    pub error: Option<String>,
}

impl TranscriptResult {
    /// Result for a successful provider call.
    pub fn success(sequence: u64, text: String, latency: Duration) -> Self {
        Self {
            sequence,
            text,
            latency,
            error: None,
        }
    }

    /// Error-marked result for a chunk whose provider call failed for good.
    pub fn failed(sequence: u64, error: String, latency: Duration) -> Self {
        Self {
            sequence,
            text: String::new(),
            latency,
            error: Some(error),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
