//! Authentication context and API secret matching
//!
//! The relay authenticates callers with pre-shared API secrets. Tokens are
//! compared in constant time so the matcher cannot be used as a timing
//! oracle.

use subtle::ConstantTimeEq;

use crate::config::AuthApiSecret;

/// Authentication context attached to a request after validation.
///
/// Handlers read this via `Extension<Auth>` to learn which configured
/// secret (if any) authenticated the caller.
#[derive(Debug, Clone, Default)]
pub struct Auth {
    /// Identifier of the matched API secret, `None` when auth is disabled
    pub id: Option<String>,
}

impl Auth {
    /// Context for a caller that matched a configured secret
    pub fn new(id: String) -> Self {
        Self { id: Some(id) }
    }

    /// Context used when authentication is disabled
    pub fn empty() -> Self {
        Self { id: None }
    }
}

/// Match a presented token against the configured API secrets.
///
/// Returns the identifier of the first matching secret. Every candidate is
/// compared in constant time regardless of where (or whether) a match is
/// found.
pub fn match_api_secret_id<'a>(token: &str, secrets: &'a [AuthApiSecret]) -> Option<&'a str> {
    let mut matched: Option<&'a str> = None;
    for entry in secrets {
        let eq: bool = entry.secret.as_bytes().ct_eq(token.as_bytes()).into();
        if eq && matched.is_none() {
            matched = Some(&entry.id);
        }
    }
    matched
}
