//! Revoked-token registry
//!
//! An in-memory set of raw token strings invalidated before their natural
//! expiry, shared by every request handler through [`crate::state::AppState`].
//! Two tokens with identical claims issued at different instants are
//! distinct strings and independently revocable.
//!
//! Entries carry the token's own `exp` so stale entries can be evicted on
//! write: a token past its expiry is already rejected by the expiry check,
//! so pruning it from the registry loses nothing. For multi-instance
//! deployments, swap this for a shared keyed store with TTL behind the
//! same two operations.

use std::collections::HashMap;
use std::sync::Mutex;

/// Concurrency-safe registry of revoked tokens.
///
/// `revoke` followed by `is_revoked` from any task observes the revocation
/// (read-your-writes within the process). No persistence guarantee.
#[derive(Debug, Default)]
pub struct TokenBlacklist {
    // raw token -> natural expiry (Unix epoch seconds)
    entries: Mutex<HashMap<String, u64>>,
}

impl TokenBlacklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Revoke a token until its natural expiry. Idempotent.
    ///
    /// Evicts entries whose own expiry has already passed (`exp <= now`)
    /// before inserting, keeping the registry bounded by the number of
    /// live revoked tokens.
    pub fn revoke(&self, token: &str, expires_at: u64, now: u64) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.retain(|_, exp| *exp > now);
        entries.insert(token.to_string(), expires_at);
    }

    /// Membership test on the raw token string.
    pub fn is_revoked(&self, token: &str) -> bool {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.contains_key(token)
    }

    pub fn len(&self) -> usize {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
