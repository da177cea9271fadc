//! Admission-controlled transcription client.
//!
//! Wraps a provider adapter with the per-chunk call policy: a per-connection
//! semaphore caps concurrent in-flight calls, an optional process-wide
//! semaphore additionally guards the shared provider quota, each attempt runs
//! under a bounded timeout, and transient failures are retried with
//! exponential backoff.
//!
//! Per chunk the state machine is
//! `Submitted -> InFlight -> {Succeeded | Retrying -> InFlight | FailedFinal}`;
//! both terminal states resolve to exactly one [`TranscriptResult`]. Failures
//! never escape as errors — they become error-marked results, so one bad
//! chunk cannot abort the session.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use crate::config::RelayConfig;
use crate::core::stt::{SttError, Transcriber, Transcription};

use super::types::{Chunk, TranscriptResult};

/// Per-connection transcription pipeline front end.
///
/// One instance per live connection; the provider adapter and the global
/// permit pool are shared across connections.
pub struct TranscriptionClient {
    transcriber: Arc<dyn Transcriber>,
    limits: RelayConfig,
    /// Caps in-flight provider calls for this connection (M)
    local_permits: Arc<Semaphore>,
    /// Optional process-wide cap shared by all connections
    global_permits: Option<Arc<Semaphore>>,
}

impl TranscriptionClient {
    pub fn new(
        transcriber: Arc<dyn Transcriber>,
        limits: RelayConfig,
        global_permits: Option<Arc<Semaphore>>,
    ) -> Self {
        let local_permits = Arc::new(Semaphore::new(limits.max_in_flight));
        Self {
            transcriber,
            limits,
            local_permits,
            global_permits,
        }
    }

    /// Turn one chunk into exactly one result.
    ///
    /// Waits for admission, then drives the provider call through the
    /// timeout/retry policy. Cancellation-safe: dropping the future (the
    /// handler aborting its task set) releases any held permits and abandons
    /// the in-flight request without producing a result.
    pub async fn process(&self, chunk: Chunk) -> TranscriptResult {
        let sequence = chunk.sequence;

        let _local = match self.local_permits.acquire().await {
            Ok(permit) => permit,
            Err(_) => {
                return TranscriptResult::failed(
                    sequence,
                    "admission controller closed".to_string(),
                    chunk.received_at.elapsed(),
                );
            }
        };
        let _global = match &self.global_permits {
            Some(pool) => match pool.acquire().await {
                Ok(permit) => Some(permit),
                Err(_) => {
                    return TranscriptResult::failed(
                        sequence,
                        "admission controller closed".to_string(),
                        chunk.received_at.elapsed(),
                    );
                }
            },
            None => None,
        };

        match self.call_with_retry(&chunk).await {
            Ok(transcription) => {
                TranscriptResult::success(sequence, transcription.text, chunk.received_at.elapsed())
            }
            Err(e) => {
                warn!(
                    session_id = %chunk.session_id,
                    sequence,
                    error = %e,
                    "chunk transcription failed for good"
                );
                TranscriptResult::failed(sequence, e.to_string(), chunk.received_at.elapsed())
            }
        }
    }

    /// Delay before the given retry attempt (1-based). A provider-supplied
    /// Retry-After takes precedence over exponential backoff.
    fn backoff_delay(&self, attempt: u32, last_error: Option<&SttError>) -> std::time::Duration {
        last_error
            .and_then(SttError::retry_after)
            .unwrap_or_else(|| self.limits.retry_base_delay * 2u32.pow(attempt - 1))
    }

    async fn call_with_retry(&self, chunk: &Chunk) -> Result<Transcription, SttError> {
        let mut last_error: Option<SttError> = None;

        for attempt in 0..=self.limits.max_retries {
            if attempt > 0 {
                let delay = self.backoff_delay(attempt, last_error.as_ref());
                debug!(
                    sequence = chunk.sequence,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "retrying provider call"
                );
                sleep(delay).await;
            }

            let call = self.transcriber.transcribe(chunk.payload.clone());
            match timeout(self.limits.request_timeout, call).await {
                Ok(Ok(transcription)) => return Ok(transcription),
                Ok(Err(e)) => {
                    if e.is_transient() && attempt < self.limits.max_retries {
                        warn!(
                            sequence = chunk.sequence,
                            attempt,
                            error = %e,
                            "transient provider failure"
                        );
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e);
                }
                Err(_) => {
                    let e = SttError::Timeout(self.limits.request_timeout);
                    if attempt < self.limits.max_retries {
                        warn!(
                            sequence = chunk.sequence,
                            attempt,
                            timeout_ms = self.limits.request_timeout.as_millis() as u64,
                            "provider call timed out"
                        );
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        // The loop always returns from its final iteration
        Err(last_error
            .unwrap_or_else(|| SttError::Configuration("retry loop exited early".to_string())))
    }
}
