//! Session registry
//!
//! Issues opaque session identifiers and tracks lifecycle state in process
//! memory. A session is the logical identity of one streaming interaction:
//! minted at bootstrap, bound to exactly one live connection while streaming,
//! and closed exactly once. Sessions deliberately do not survive a process
//! restart.

use std::time::SystemTime;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use dashmap::DashMap;
use rand::RngCore;
use thiserror::Error;
use tracing::debug;

/// Bytes of randomness in a session token (256 bits).
const TOKEN_BYTES: usize = 32;

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Minted but not yet bound to a streaming connection
    Active,
    /// Bound to exactly one live streaming connection
    Streaming,
    /// Finished; the identifier is never reused
    Closed,
}

/// Snapshot of a session as handed to callers.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub created_at: SystemTime,
    pub state: SessionState,
}

/// Session lifecycle errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("unknown session")]
    NotFound,

    #[error("session is closed")]
    Closed,

    #[error("session already has a live connection")]
    AlreadyAttached,
}

#[derive(Debug)]
struct SessionEntry {
    created_at: SystemTime,
    state: SessionState,
}

/// In-memory registry of sessions, keyed by opaque token.
///
/// Shared across connections; entries are small and sessions are closed (not
/// removed) so that a late reconnect attempt gets a precise rejection rather
/// than a generic NotFound.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, SessionEntry>,
}

/// Mint an unguessable session token: 256 bits from the OS RNG, URL-safe
/// base64 so it can travel in a query parameter.
fn mint_token() -> String {
    let mut raw = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut raw);
    URL_SAFE_NO_PAD.encode(raw)
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a new Active session.
    pub fn create(&self) -> Session {
        let id = mint_token();
        let created_at = SystemTime::now();
        self.sessions.insert(
            id.clone(),
            SessionEntry {
                created_at,
                state: SessionState::Active,
            },
        );
        debug!(session_id = %id, "session created");
        Session {
            id,
            created_at,
            state: SessionState::Active,
        }
    }

    /// Bind a streaming connection to a session.
    ///
    /// Enforces the one-handler-per-session invariant: only an Active session
    /// can be attached, and attaching moves it to Streaming.
    pub fn attach(&self, id: &str) -> Result<(), SessionError> {
        let mut entry = self.sessions.get_mut(id).ok_or(SessionError::NotFound)?;
        match entry.state {
            SessionState::Active => {
                entry.state = SessionState::Streaming;
                Ok(())
            }
            SessionState::Streaming => Err(SessionError::AlreadyAttached),
            SessionState::Closed => Err(SessionError::Closed),
        }
    }

    /// Close a session. Idempotent: closing an already-closed session is a
    /// no-op. Fails only for an identifier that was never minted.
    pub fn close(&self, id: &str) -> Result<(), SessionError> {
        let mut entry = self.sessions.get_mut(id).ok_or(SessionError::NotFound)?;
        if entry.state != SessionState::Closed {
            entry.state = SessionState::Closed;
            debug!(session_id = %id, "session closed");
        }
        Ok(())
    }

    /// Current state of a session, if it exists.
    pub fn state(&self, id: &str) -> Option<SessionState> {
        self.sessions.get(id).map(|entry| entry.state)
    }

    /// Snapshot of a session, if it exists.
    pub fn get(&self, id: &str) -> Option<Session> {
        self.sessions.get(id).map(|entry| Session {
            id: id.to_string(),
            created_at: entry.created_at,
            state: entry.state,
        })
    }

    /// Number of sessions ever minted and still tracked.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_unique_and_urlsafe() {
        let registry = SessionRegistry::new();
        let a = registry.create();
        let b = registry.create();

        assert_ne!(a.id, b.id);
        // 32 bytes -> 43 base64url characters, no padding
        assert_eq!(a.id.len(), 43);
        assert!(
            a.id.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_create_then_attach_then_close() {
        let registry = SessionRegistry::new();
        let session = registry.create();
        assert_eq!(registry.state(&session.id), Some(SessionState::Active));

        registry.attach(&session.id).unwrap();
        assert_eq!(registry.state(&session.id), Some(SessionState::Streaming));

        registry.close(&session.id).unwrap();
        assert_eq!(registry.state(&session.id), Some(SessionState::Closed));
    }

    #[test]
    fn test_attach_unknown_session() {
        let registry = SessionRegistry::new();
        assert_eq!(registry.attach("nope"), Err(SessionError::NotFound));
    }

    #[test]
    fn test_attach_is_exclusive() {
        let registry = SessionRegistry::new();
        let session = registry.create();

        registry.attach(&session.id).unwrap();
        assert_eq!(
            registry.attach(&session.id),
            Err(SessionError::AlreadyAttached)
        );
    }

    #[test]
    fn test_attach_closed_session_rejected() {
        let registry = SessionRegistry::new();
        let session = registry.create();
        registry.close(&session.id).unwrap();

        assert_eq!(registry.attach(&session.id), Err(SessionError::Closed));
    }

    #[test]
    fn test_close_is_idempotent() {
        let registry = SessionRegistry::new();
        let session = registry.create();

        registry.close(&session.id).unwrap();
        // Second close is a no-op, not an error
        registry.close(&session.id).unwrap();
        assert_eq!(registry.state(&session.id), Some(SessionState::Closed));
    }

    #[test]
    fn test_close_unknown_session_is_not_found() {
        let registry = SessionRegistry::new();
        assert_eq!(registry.close("missing"), Err(SessionError::NotFound));
    }

    #[test]
    fn test_len_tracks_minted_sessions() {
        let registry = SessionRegistry::new();
        assert!(registry.is_empty());
        registry.create();
        registry.create();
        assert_eq!(registry.len(), 2);
    }
}
