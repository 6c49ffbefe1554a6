//! C2: Idempotency Layer (spec §4.2).
//!
//! Every mutating HTTP route goes through [`IdempotencyStore`] via the Axum
//! [`middleware`] before the handler runs. The store row itself acts as a
//! mutex: a `locked` phase blocks concurrent retries until the original
//! request completes or the key expires.

pub mod in_memory;
pub mod middleware;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdempotencyPhase {
    Locked,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdempotencyRecord {
    pub service_id: String,
    pub key: String,
    pub phase: IdempotencyPhase,
    pub request_body_hash: String,
    pub response: Option<StoredResponse>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

pub fn hash_body(body: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body);
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, thiserror::Error)]
pub enum IdempotencyError {
    /// A record already exists and is `locked` — the original request is
    /// still in flight. Callers should surface a transient 409 and let the
    /// client retry after backoff.
    #[error("idempotency key {0} is locked by an in-flight request")]
    InFlight(String),
    /// Same key reused with a different request body (spec §4.2 edge case).
    #[error("idempotency key {0} reused with a different request body")]
    BodyMismatch(String),
    #[error("idempotency key exceeds max length of {0}")]
    KeyTooLong(usize),
    #[error("storage error: {0}")]
    Storage(String),
}

/// Outcome of [`IdempotencyStore::begin`]: either this caller now holds the
/// lock and must execute the handler, or a prior completed response should
/// be replayed verbatim.
pub enum BeginOutcome {
    Proceed,
    Replay(StoredResponse),
}

#[async_trait::async_trait]
pub trait IdempotencyStore: Send + Sync {
    /// Atomically insert a `locked` record, or return the existing one's
    /// outcome (spec §4.2 contract).
    async fn begin(
        &self,
        service_id: &str,
        key: &str,
        request_body_hash: &str,
        ttl_hours: i64,
    ) -> Result<BeginOutcome, IdempotencyError>;

    async fn complete(&self, service_id: &str, key: &str, response: StoredResponse) -> Result<(), IdempotencyError>;

    /// Handler failed: release the lock so retries are possible (spec §4.2).
    async fn release(&self, service_id: &str, key: &str) -> Result<(), IdempotencyError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_stable_and_sensitive_to_content() {
        let h1 = hash_body(b"{}");
        let h2 = hash_body(b"{}");
        let h3 = hash_body(b"{\"a\":1}");
        assert_eq!(h1, h2);
        assert_ne!(h1, h3);
    }
}
