//! Redis-backed exchange store.
//!
//! Values carry their creation time so a late resolver can still be told
//! "expired" rather than "never existed": keys are retained for twice the
//! logical TTL and redis expiry clears whatever the sweep misses. Both
//! consumption and sweeping run as Lua scripts, so check-and-delete is a
//! single atomic step on the redis side.

use async_trait::async_trait;
use redis::{AsyncCommands, Script, aio::ConnectionManager};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::app_error::{AppError, AppResult};
use crate::use_cases::exchange::{ExchangeStore, StoredHandoff};

/// Atomic GET + DEL: the winning caller gets the value, everyone else nil.
const TAKE_SCRIPT: &str = r#"
local value = redis.call('GET', KEYS[1])
if value then
    redis.call('DEL', KEYS[1])
end
return value
"#;

/// Delete the key only if its entry is past the TTL, judged inside redis so
/// the sweep cannot race a concurrent take or a fresh save of the same hash.
const SWEEP_SCRIPT: &str = r#"
local value = redis.call('GET', KEYS[1])
if not value then
    return 0
end
local data = cjson.decode(value)
if (tonumber(ARGV[1]) - data.created_at) > tonumber(ARGV[2]) then
    redis.call('DEL', KEYS[1])
    return 1
end
return 0
"#;

#[derive(Clone)]
pub struct RedisExchangeStore {
    manager: ConnectionManager,
    take_script: Script,
    sweep_script: Script,
    ttl: Duration,
}

#[derive(Serialize, Deserialize)]
struct HandoffValue {
    subject: String,
    created_at: i64,
}

impl RedisExchangeStore {
    pub async fn new(redis_url: &str, ttl: Duration) -> AppResult<Self> {
        let client = redis::Client::open(redis_url).map_err(|e| {
            AppError::Internal(format!(
                "Redis connection failed (check redis password/URL): {e}"
            ))
        })?;
        let manager = ConnectionManager::new(client).await.map_err(|e| {
            AppError::Internal(format!(
                "Redis auth/connection failed (check redis password/URL): {e}"
            ))
        })?;

        Ok(Self {
            manager,
            take_script: Script::new(TAKE_SCRIPT),
            sweep_script: Script::new(SWEEP_SCRIPT),
            ttl,
        })
    }

    fn key(hash: &str) -> String {
        format!("exchange:{hash}")
    }
}

#[async_trait]
impl ExchangeStore for RedisExchangeStore {
    async fn save(&self, hash: &str, subject: &str) -> AppResult<()> {
        let mut conn = self.manager.clone();
        let value = HandoffValue {
            subject: subject.to_string(),
            created_at: OffsetDateTime::now_utc().unix_timestamp(),
        };
        let json = serde_json::to_string(&value)
            .map_err(|e| AppError::Internal(format!("Failed to serialize handoff: {e}")))?;

        // Twice the logical TTL: the grace window in which a resolver still
        // observes "expired" instead of "not found".
        let retain_secs = (self.ttl.whole_seconds().max(1) * 2) as u64;

        let _: () = conn
            .set_ex(Self::key(hash), json, retain_secs)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;

        Ok(())
    }

    async fn take(&self, hash: &str) -> AppResult<Option<StoredHandoff>> {
        let mut conn = self.manager.clone();

        let raw: Option<String> = self
            .take_script
            .key(Self::key(hash))
            .invoke_async(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to consume handoff: {e}")))?;

        match raw {
            Some(value) => {
                let data: HandoffValue = serde_json::from_str(&value)
                    .map_err(|e| AppError::Internal(format!("Failed to parse handoff: {e}")))?;
                Ok(Some(StoredHandoff {
                    subject: data.subject,
                    created_at: data.created_at,
                }))
            }
            None => Ok(None),
        }
    }

    async fn sweep(&self) -> AppResult<u64> {
        let mut conn = self.manager.clone();

        let mut keys: Vec<String> = Vec::new();
        {
            let mut iter: redis::AsyncIter<'_, String> = conn
                .scan_match("exchange:*")
                .await
                .map_err(|e| AppError::Internal(e.to_string()))?;
            while let Some(key) = iter.next_item().await {
                keys.push(key);
            }
        }

        let now = OffsetDateTime::now_utc().unix_timestamp();
        let ttl_secs = self.ttl.whole_seconds();
        let mut purged: u64 = 0;
        for key in keys {
            let removed: i64 = self
                .sweep_script
                .key(&key)
                .arg(now)
                .arg(ttl_secs)
                .invoke_async(&mut conn)
                .await
                .map_err(|e| AppError::Internal(e.to_string()))?;
            purged += removed as u64;
        }

        Ok(purged)
    }
}
