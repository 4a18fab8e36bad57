//! Stock ledger cache — Redis-backed shadow of per-product available stock
//!
//! Key layout:
//! - `stock:{product_id}`            当前可售库存影子 (integer)
//! - `reserve:{product_id}:{order_id}` 预扣记录 (quantity, TTL ~10min)
//!
//! The cached value is a fast-path shadow of the durable `products.stock`
//! column. It may drift after crashes or multi-instance races and converges
//! again on confirm/rollback/sync. Reservation records are the compensation
//! ledger: rollback consumes them atomically, which is what makes rollback
//! idempotent.

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Capability interface over the stock ledger cache.
///
/// Injected into [`super::StockService`] so tests can substitute the
/// in-memory implementation from [`super::memory`].
#[async_trait]
pub trait StockCache: Send + Sync {
    /// Cached available stock for a product, `None` on cache miss
    async fn get_stock(&self, product_id: i64) -> Result<Option<i64>, BoxError>;

    /// Overwrite the cached stock shadow (cache-miss population, bulk sync)
    async fn set_stock(&self, product_id: i64, stock: i64) -> Result<(), BoxError>;

    /// Atomically write the decremented stock shadow and the reservation
    /// record. Both writes land together — a crash cannot leave a decrement
    /// without its compensation record.
    async fn apply_reservation(
        &self,
        product_id: i64,
        order_id: i64,
        new_stock: i64,
        quantity: i64,
        ttl_secs: u64,
    ) -> Result<(), BoxError>;

    /// Consume the reservation record and restore its quantity to the stock
    /// shadow. Returns `false` when no record exists (already rolled back,
    /// already finalized, or expired) — in that case the stock shadow is left
    /// untouched, which makes repeated rollbacks safe.
    async fn release_reservation(&self, product_id: i64, order_id: i64) -> Result<bool, BoxError>;

    /// Drop the reservation record without touching the stock shadow
    /// (post-commit cleanup after a durable confirm)
    async fn clear_reservation(&self, product_id: i64, order_id: i64) -> Result<(), BoxError>;

    /// Quantity held by a reservation record, `None` if absent
    async fn get_reservation(&self, product_id: i64, order_id: i64)
    -> Result<Option<i64>, BoxError>;

    /// Evict the stock shadow so the next read re-syncs from durable storage
    async fn evict_stock(&self, product_id: i64) -> Result<(), BoxError>;
}

/// Restore-if-present: consumes the reservation record and gives its quantity
/// back to the stock shadow in one atomic step.
const RELEASE_SCRIPT: &str = r#"
local qty = redis.call('GET', KEYS[2])
if qty then
    redis.call('INCRBY', KEYS[1], qty)
    redis.call('DEL', KEYS[2])
    return 1
end
return 0
"#;

/// Redis-backed [`StockCache`]
#[derive(Clone)]
pub struct RedisStockCache {
    conn: ConnectionManager,
}

impl RedisStockCache {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    fn stock_key(product_id: i64) -> String {
        format!("stock:{product_id}")
    }

    fn reserve_key(product_id: i64, order_id: i64) -> String {
        format!("reserve:{product_id}:{order_id}")
    }
}

#[async_trait]
impl StockCache for RedisStockCache {
    async fn get_stock(&self, product_id: i64) -> Result<Option<i64>, BoxError> {
        let mut conn = self.conn.clone();
        let stock: Option<i64> = conn.get(Self::stock_key(product_id)).await?;
        Ok(stock)
    }

    async fn set_stock(&self, product_id: i64, stock: i64) -> Result<(), BoxError> {
        let mut conn = self.conn.clone();
        let _: () = conn.set(Self::stock_key(product_id), stock).await?;
        Ok(())
    }

    async fn apply_reservation(
        &self,
        product_id: i64,
        order_id: i64,
        new_stock: i64,
        quantity: i64,
        ttl_secs: u64,
    ) -> Result<(), BoxError> {
        let mut conn = self.conn.clone();
        let _: () = redis::pipe()
            .atomic()
            .set(Self::stock_key(product_id), new_stock)
            .set_ex(Self::reserve_key(product_id, order_id), quantity, ttl_secs)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn release_reservation(&self, product_id: i64, order_id: i64) -> Result<bool, BoxError> {
        let mut conn = self.conn.clone();
        let released: i64 = redis::Script::new(RELEASE_SCRIPT)
            .key(Self::stock_key(product_id))
            .key(Self::reserve_key(product_id, order_id))
            .invoke_async(&mut conn)
            .await?;
        Ok(released == 1)
    }

    async fn clear_reservation(&self, product_id: i64, order_id: i64) -> Result<(), BoxError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(Self::reserve_key(product_id, order_id)).await?;
        Ok(())
    }

    async fn get_reservation(
        &self,
        product_id: i64,
        order_id: i64,
    ) -> Result<Option<i64>, BoxError> {
        let mut conn = self.conn.clone();
        let qty: Option<i64> = conn.get(Self::reserve_key(product_id, order_id)).await?;
        Ok(qty)
    }

    async fn evict_stock(&self, product_id: i64) -> Result<(), BoxError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(Self::stock_key(product_id)).await?;
        Ok(())
    }
}
