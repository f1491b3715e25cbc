//! One-time identity handoffs between cooperating services.
//!
//! A handoff is an opaque hash that resolves to a subject exactly once within
//! a 60-second window. Deletion is mandatory on every path that examines an
//! entry: a guessed or leaked hash is good for at most one lookup.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use sha2::{Digest, Sha256};
use time::{Duration, OffsetDateTime};
use tracing::instrument;

use crate::app_error::{AppError, AppResult};

/// Entry as returned by a successful atomic take.
#[derive(Debug, Clone)]
pub struct StoredHandoff {
    pub subject: String,
    pub created_at: i64,
}

#[async_trait]
pub trait ExchangeStore: Send + Sync {
    async fn save(&self, hash: &str, subject: &str) -> AppResult<()>;

    /// Atomically remove and return the entry. Backends must never implement
    /// this as a check followed by a separate delete; under concurrent
    /// callers exactly one observes the entry.
    async fn take(&self, hash: &str) -> AppResult<Option<StoredHandoff>>;

    /// Purge entries past the TTL. Returns the number purged.
    async fn sweep(&self) -> AppResult<u64>;
}

pub struct ExchangeUseCases {
    store: Arc<dyn ExchangeStore>,
    ttl: Duration,
}

impl ExchangeUseCases {
    pub fn new(store: Arc<dyn ExchangeStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    #[instrument(skip(self, secret))]
    pub async fn put(&self, subject: &str, secret: &str) -> AppResult<String> {
        let hash = hash_handoff(subject, secret);
        self.store.save(&hash, subject).await?;
        Ok(hash)
    }

    /// Resolve a hash to its subject, consuming the entry.
    ///
    /// The entry is gone after this call whatever the outcome; an expired
    /// entry only changes the error report, never the deletion.
    #[instrument(skip(self, hash))]
    pub async fn resolve(&self, hash: &str) -> AppResult<String> {
        let Some(entry) = self.store.take(hash).await? else {
            return Err(AppError::HashNotFound);
        };
        let age = OffsetDateTime::now_utc().unix_timestamp() - entry.created_at;
        if age > self.ttl.whole_seconds() {
            return Err(AppError::HashExpired);
        }
        Ok(entry.subject)
    }

    pub async fn sweep(&self) -> AppResult<u64> {
        self.store.sweep().await
    }
}

pub fn hash_handoff(subject: &str, secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(subject.as_bytes());
    hasher.update(b"||");
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Entropy for a handoff when the caller does not bring its own secret.
pub fn generate_secret() -> String {
    use rand::RngCore;
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic_and_input_sensitive() {
        assert_eq!(hash_handoff("u1", "s"), hash_handoff("u1", "s"));
        assert_ne!(hash_handoff("u1", "s"), hash_handoff("u2", "s"));
        assert_ne!(hash_handoff("u1", "s"), hash_handoff("u1", "t"));
        // Concatenation is delimited; shifting bytes across the boundary
        // must change the digest.
        assert_ne!(hash_handoff("ab", "c"), hash_handoff("a", "bc"));
    }

    #[test]
    fn hash_is_url_safe_hex() {
        let hash = hash_handoff("u1", "secretA");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generated_secrets_do_not_repeat() {
        assert_ne!(generate_secret(), generate_secret());
    }
}
