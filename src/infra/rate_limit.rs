use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use redis::{Script, aio::ConnectionManager};
use time::OffsetDateTime;

use crate::app_error::{AppError, AppResult};

#[async_trait]
pub trait RateLimiterTrait: Send + Sync {
    /// Returns Ok(()) while the caller is within its window budget.
    async fn check(&self, ip: &str) -> AppResult<()>;
}

/// Lua script for atomic increment with TTL. Returns the count after the
/// increment; a key that lost its TTL gets one reattached.
const INCR_WITH_TTL_SCRIPT: &str = r#"
local current = redis.call('INCR', KEYS[1])
if current == 1 then
    redis.call('EXPIRE', KEYS[1], ARGV[1])
elseif redis.call('TTL', KEYS[1]) == -1 then
    redis.call('EXPIRE', KEYS[1], ARGV[1])
end
return current
"#;

#[derive(Clone)]
pub struct RedisRateLimiter {
    manager: ConnectionManager,
    window_secs: u64,
    max_per_ip: u64,
    script: Script,
}

impl RedisRateLimiter {
    pub async fn new(redis_url: &str, window_secs: u64, max_per_ip: u64) -> AppResult<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| AppError::Internal(format!("Redis connection failed: {e}")))?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| AppError::Internal(format!("Redis auth/connection failed: {e}")))?;
        Ok(Self {
            manager,
            window_secs,
            max_per_ip,
            script: Script::new(INCR_WITH_TTL_SCRIPT),
        })
    }
}

#[async_trait]
impl RateLimiterTrait for RedisRateLimiter {
    async fn check(&self, ip: &str) -> AppResult<()> {
        let mut conn = self.manager.clone();
        let current: u64 = self
            .script
            .key(format!("rate:ip:{ip}"))
            .arg(self.window_secs)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;

        if current > self.max_per_ip {
            return Err(AppError::RateLimited);
        }
        Ok(())
    }
}

/// Fixed-window counter for redis-less deployments. Counters reset when
/// their window lapses; stale windows are dropped on the way through.
pub struct MemoryRateLimiter {
    counters: Mutex<HashMap<String, (i64, u64)>>,
    window_secs: u64,
    max_per_ip: u64,
}

impl MemoryRateLimiter {
    pub fn new(window_secs: u64, max_per_ip: u64) -> Self {
        Self {
            counters: Mutex::new(HashMap::new()),
            window_secs,
            max_per_ip,
        }
    }
}

#[async_trait]
impl RateLimiterTrait for MemoryRateLimiter {
    async fn check(&self, ip: &str) -> AppResult<()> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let mut counters = self.counters.lock().expect("rate counters lock poisoned");
        counters.retain(|_, (started, _)| now - *started < self.window_secs as i64);

        let entry = counters.entry(ip.to_string()).or_insert((now, 0));
        entry.1 += 1;
        if entry.1 > self.max_per_ip {
            return Err(AppError::RateLimited);
        }
        Ok(())
    }
}
