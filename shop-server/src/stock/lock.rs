//! Per-product distributed lock
//!
//! Advisory lock keyed `lock:stock:{product_id}`, serializing concurrent
//! reservation attempts across server instances. Acquisition is non-blocking
//! (`SET NX EX`) — contention surfaces immediately as a reservation failure
//! and the caller retries at the order level, so two orders racing for two
//! products in opposite sequences can never deadlock.
//!
//! The owner token is an opaque UUID; release is an atomic compare-and-delete
//! so a holder whose lock already expired cannot delete a newer holder's
//! lock. Expiry (~30s) is the crash-safety net — a process that dies holding
//! the lock frees it automatically.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Capability interface for mutual exclusion.
///
/// Any store with atomic conditional set and conditional delete can back
/// this; it need not be the same technology as the stock cache.
#[async_trait]
pub trait DistributedLock: Send + Sync {
    /// Try to acquire `key` for `ttl`. Returns the owner token on success,
    /// `None` if the lock is currently held. Never blocks.
    async fn acquire(&self, key: &str, ttl: Duration) -> Result<Option<String>, BoxError>;

    /// Release `key` if `token` still owns it. Returns `true` when the lock
    /// was actually released, `false` when ownership was already lost
    /// (expired and possibly re-acquired by someone else).
    async fn release(&self, key: &str, token: &str) -> Result<bool, BoxError>;
}

/// Compare-and-delete: only the token holder may remove the lock.
const UNLOCK_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
else
    return 0
end
"#;

/// Redis-backed [`DistributedLock`] (`SET NX EX` + Lua unlock)
#[derive(Clone)]
pub struct RedisLock {
    conn: ConnectionManager,
}

impl RedisLock {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl DistributedLock for RedisLock {
    async fn acquire(&self, key: &str, ttl: Duration) -> Result<Option<String>, BoxError> {
        let mut conn = self.conn.clone();
        let token = uuid::Uuid::new_v4().to_string();

        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(&token)
            .arg("NX")
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async(&mut conn)
            .await?;

        Ok(reply.map(|_| token))
    }

    async fn release(&self, key: &str, token: &str) -> Result<bool, BoxError> {
        let mut conn = self.conn.clone();
        let deleted: i64 = redis::Script::new(UNLOCK_SCRIPT)
            .key(key)
            .arg(token)
            .invoke_async(&mut conn)
            .await?;
        Ok(deleted == 1)
    }
}

/// Lock key for a product's stock
pub fn stock_lock_key(product_id: i64) -> String {
    format!("lock:stock:{product_id}")
}
