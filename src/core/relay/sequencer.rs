//! Reorder buffer for concurrently-completing transcription results.
//!
//! Provider calls run in parallel and finish in whatever order the network
//! allows, but the caller must see results in submission order. The sequencer
//! is the protocol counterpart of a network receive-reorder buffer: completed
//! results park in a map keyed by sequence number until every earlier result
//! has been released.
//!
//! The pending map is bounded by the configured window. When the window is
//! full behind an unresolved head-of-line entry, `has_capacity` turns false
//! and the connection handler stops admitting new chunks until the head
//! clears. One stalled chunk can therefore delay later, already-completed
//! chunks — the accepted tradeoff for O(window) memory per connection.

use std::collections::BTreeMap;

use tracing::debug;

use super::types::TranscriptResult;

/// Per-connection reorder buffer.
///
/// Owned exclusively by one connection handler; no locking, no sharing.
#[derive(Debug)]
pub struct ChunkSequencer {
    /// Next sequence number eligible for emission
    next_to_emit: u64,
    /// Completed results waiting for earlier sequences to resolve
    pending: BTreeMap<u64, TranscriptResult>,
    /// Maximum number of parked out-of-order results
    window: usize,
}

impl ChunkSequencer {
    pub fn new(window: usize) -> Self {
        debug_assert!(window > 0, "reorder window must be at least 1");
        Self {
            next_to_emit: 0,
            pending: BTreeMap::new(),
            window,
        }
    }

    /// Accept one completed result and return every result that became
    /// eligible for emission, in submission order.
    ///
    /// Results below the cursor (stale duplicates after a teardown race) are
    /// discarded. The common case returns either an empty vec (result parked
    /// out of order) or a run of consecutive results starting at the cursor.
    pub fn accept(&mut self, result: TranscriptResult) -> Vec<TranscriptResult> {
        if result.sequence < self.next_to_emit {
            debug!(
                sequence = result.sequence,
                next_to_emit = self.next_to_emit,
                "discarding stale result below emission cursor"
            );
            return Vec::new();
        }

        self.pending.insert(result.sequence, result);

        let mut ready = Vec::new();
        while let Some(next) = self.pending.remove(&self.next_to_emit) {
            self.next_to_emit += 1;
            ready.push(next);
        }
        ready
    }

    /// Whether a further out-of-order completion can be parked without
    /// exceeding the window. Consulted by the intake guard: when false, no
    /// new work is admitted until the head-of-line entry resolves.
    pub fn has_capacity(&self) -> bool {
        self.pending.len() < self.window
    }

    /// Number of results currently parked out of order.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Sequence number the output stream is waiting on.
    pub fn next_to_emit(&self) -> u64 {
        self.next_to_emit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn result(sequence: u64) -> TranscriptResult {
        TranscriptResult::success(sequence, format!("text-{sequence}"), Duration::ZERO)
    }

    fn sequences(results: &[TranscriptResult]) -> Vec<u64> {
        results.iter().map(|r| r.sequence).collect()
    }

    #[test]
    fn test_in_order_results_emit_immediately() {
        let mut seq = ChunkSequencer::new(8);
        assert_eq!(sequences(&seq.accept(result(0))), vec![0]);
        assert_eq!(sequences(&seq.accept(result(1))), vec![1]);
        assert_eq!(sequences(&seq.accept(result(2))), vec![2]);
        assert_eq!(seq.pending_len(), 0);
        assert_eq!(seq.next_to_emit(), 3);
    }

    #[test]
    fn test_out_of_order_completion_is_held_until_head_resolves() {
        let mut seq = ChunkSequencer::new(8);

        // Chunk 1 finishes before chunk 0; nothing may be emitted yet
        assert!(seq.accept(result(1)).is_empty());
        assert_eq!(seq.pending_len(), 1);

        // Head resolves: both emit, in submission order
        assert_eq!(sequences(&seq.accept(result(0))), vec![0, 1]);
        assert_eq!(seq.pending_len(), 0);
    }

    #[test]
    fn test_reversed_completion_order_fully_reorders() {
        let mut seq = ChunkSequencer::new(8);
        for sequence in (1..5).rev() {
            assert!(seq.accept(result(sequence)).is_empty());
        }
        assert_eq!(sequences(&seq.accept(result(0))), vec![0, 1, 2, 3, 4]);
        assert_eq!(seq.next_to_emit(), 5);
    }

    #[test]
    fn test_gap_splits_emission_into_runs() {
        let mut seq = ChunkSequencer::new(8);
        assert_eq!(sequences(&seq.accept(result(0))), vec![0]);
        assert!(seq.accept(result(2)).is_empty());
        assert!(seq.accept(result(4)).is_empty());

        // Filling the first gap releases 1 and 2 but not 4
        assert_eq!(sequences(&seq.accept(result(1))), vec![1, 2]);
        assert_eq!(sequences(&seq.accept(result(3))), vec![3, 4]);
    }

    #[test]
    fn test_error_marked_results_flow_through_in_order() {
        let mut seq = ChunkSequencer::new(8);
        let failed = TranscriptResult::failed(0, "retries exhausted".to_string(), Duration::ZERO);

        assert!(seq.accept(result(1)).is_empty());
        let ready = seq.accept(failed);
        assert_eq!(sequences(&ready), vec![0, 1]);
        assert!(ready[0].is_error());
        assert!(!ready[1].is_error());
    }

    #[test]
    fn test_capacity_reflects_parked_results() {
        let mut seq = ChunkSequencer::new(2);
        assert!(seq.has_capacity());

        // Two completions ahead of the unresolved head fill the window
        assert!(seq.accept(result(1)).is_empty());
        assert!(seq.has_capacity());
        assert!(seq.accept(result(2)).is_empty());
        assert!(!seq.has_capacity());

        // Head resolving drains everything and reopens the window
        assert_eq!(sequences(&seq.accept(result(0))), vec![0, 1, 2]);
        assert!(seq.has_capacity());
    }

    #[test]
    fn test_stale_result_below_cursor_is_discarded() {
        let mut seq = ChunkSequencer::new(4);
        assert_eq!(sequences(&seq.accept(result(0))), vec![0]);

        // A duplicate for an already-emitted sequence must not re-emit
        assert!(seq.accept(result(0)).is_empty());
        assert_eq!(seq.next_to_emit(), 1);
        assert_eq!(seq.pending_len(), 0);
    }

    #[test]
    fn test_every_sequence_emitted_exactly_once() {
        // Deterministic shuffle of 0..32 completion order
        let mut order: Vec<u64> = (0..32).collect();
        for i in 0..order.len() {
            order.swap(i, (i * 17 + 5) % 32);
        }

        let mut seq = ChunkSequencer::new(32);
        let mut emitted = Vec::new();
        for sequence in order {
            emitted.extend(sequences(&seq.accept(result(sequence))));
        }

        assert_eq!(emitted, (0..32).collect::<Vec<u64>>());
        assert_eq!(seq.pending_len(), 0);
    }
}
