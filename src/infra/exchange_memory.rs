//! Process-local exchange store for redis-less, single-instance deployments.
//!
//! `take` removes under the lock, which is the atomic check-and-delete the
//! single-use guarantee requires.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use time::{Duration, OffsetDateTime};

use crate::app_error::AppResult;
use crate::use_cases::exchange::{ExchangeStore, StoredHandoff};

pub struct MemoryExchangeStore {
    entries: Mutex<HashMap<String, StoredHandoff>>,
    ttl: Duration,
}

impl MemoryExchangeStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    #[cfg(test)]
    pub fn insert_backdated(&self, hash: &str, subject: &str, created_at: i64) {
        self.entries
            .lock()
            .expect("exchange entries lock poisoned")
            .insert(
                hash.to_string(),
                StoredHandoff {
                    subject: subject.to_string(),
                    created_at,
                },
            );
    }
}

#[async_trait]
impl ExchangeStore for MemoryExchangeStore {
    async fn save(&self, hash: &str, subject: &str) -> AppResult<()> {
        let entry = StoredHandoff {
            subject: subject.to_string(),
            created_at: OffsetDateTime::now_utc().unix_timestamp(),
        };
        self.entries
            .lock()
            .expect("exchange entries lock poisoned")
            .insert(hash.to_string(), entry);
        Ok(())
    }

    async fn take(&self, hash: &str) -> AppResult<Option<StoredHandoff>> {
        Ok(self
            .entries
            .lock()
            .expect("exchange entries lock poisoned")
            .remove(hash))
    }

    async fn sweep(&self) -> AppResult<u64> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let ttl_secs = self.ttl.whole_seconds();
        let mut entries = self.entries.lock().expect("exchange entries lock poisoned");
        let before = entries.len();
        entries.retain(|_, entry| now - entry.created_at <= ttl_secs);
        Ok((before - entries.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::app_error::AppError;
    use crate::use_cases::exchange::{ExchangeUseCases, hash_handoff};

    fn fixture() -> (Arc<MemoryExchangeStore>, ExchangeUseCases) {
        let ttl = Duration::seconds(60);
        let store = Arc::new(MemoryExchangeStore::new(ttl));
        (store.clone(), ExchangeUseCases::new(store, ttl))
    }

    #[tokio::test]
    async fn put_then_resolve_returns_the_subject_once() {
        let (_store, exchange) = fixture();
        let hash = exchange.put("u1", "secretA").await.unwrap();
        assert_eq!(exchange.resolve(&hash).await.unwrap(), "u1");

        let err = exchange.resolve(&hash).await.unwrap_err();
        assert!(matches!(err, AppError::HashNotFound));
    }

    #[tokio::test]
    async fn unknown_hash_is_not_found() {
        let (_store, exchange) = fixture();
        let err = exchange.resolve("no-such-hash").await.unwrap_err();
        assert!(matches!(err, AppError::HashNotFound));
    }

    #[tokio::test]
    async fn stale_entry_reports_expired_and_leaves_nothing_behind() {
        let (store, exchange) = fixture();
        let hash = hash_handoff("u1", "secretA");
        let stale = OffsetDateTime::now_utc().unix_timestamp() - 120;
        store.insert_backdated(&hash, "u1", stale);

        let err = exchange.resolve(&hash).await.unwrap_err();
        assert!(matches!(err, AppError::HashExpired));

        // Expired, not retryable: the first lookup consumed it.
        let err = exchange.resolve(&hash).await.unwrap_err();
        assert!(matches!(err, AppError::HashNotFound));
    }

    #[tokio::test]
    async fn sweep_purges_only_stale_entries() {
        let (store, exchange) = fixture();
        let fresh = exchange.put("u1", "fresh").await.unwrap();
        let stale_hash = hash_handoff("u2", "stale");
        let stale = OffsetDateTime::now_utc().unix_timestamp() - 120;
        store.insert_backdated(&stale_hash, "u2", stale);

        assert_eq!(exchange.sweep().await.unwrap(), 1);

        let err = exchange.resolve(&stale_hash).await.unwrap_err();
        assert!(matches!(err, AppError::HashNotFound));
        assert_eq!(exchange.resolve(&fresh).await.unwrap(), "u1");
    }

    #[tokio::test]
    async fn concurrent_resolvers_produce_exactly_one_winner() {
        let ttl = Duration::seconds(60);
        let store = Arc::new(MemoryExchangeStore::new(ttl));
        let exchange = Arc::new(ExchangeUseCases::new(store, ttl));
        let hash = exchange.put("u1", "secretA").await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let exchange = exchange.clone();
            let hash = hash.clone();
            handles.push(tokio::spawn(async move { exchange.resolve(&hash).await }));
        }

        let mut wins = 0;
        let mut losses = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(subject) => {
                    assert_eq!(subject, "u1");
                    wins += 1;
                }
                Err(AppError::HashNotFound) => losses += 1,
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }
        assert_eq!(wins, 1);
        assert_eq!(losses, 15);
    }
}
