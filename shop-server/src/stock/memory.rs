//! In-memory StockCache / DistributedLock implementations
//!
//! Single-process stand-ins used by unit tests (and usable for local
//! experimentation). TTLs are honored lazily: expired entries are dropped
//! when touched, which is enough to exercise the expiry boundaries without a
//! mock clock — tests pass a zero TTL to simulate expiry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use shared::util::now_millis;

use super::cache::StockCache;
use super::lock::DistributedLock;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Default)]
struct CacheState {
    stock: HashMap<i64, i64>,
    /// (product_id, order_id) -> (quantity, expiry in Unix millis)
    reservations: HashMap<(i64, i64), (i64, i64)>,
}

/// In-memory [`StockCache`]
#[derive(Clone, Default)]
pub struct MemoryStockCache {
    state: Arc<Mutex<CacheState>>,
}

impl MemoryStockCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) reservation records
    pub fn reservation_count(&self) -> usize {
        let now = now_millis();
        let mut state = self.state.lock();
        state.reservations.retain(|_, (_, exp)| *exp > now);
        state.reservations.len()
    }
}

#[async_trait]
impl StockCache for MemoryStockCache {
    async fn get_stock(&self, product_id: i64) -> Result<Option<i64>, BoxError> {
        Ok(self.state.lock().stock.get(&product_id).copied())
    }

    async fn set_stock(&self, product_id: i64, stock: i64) -> Result<(), BoxError> {
        self.state.lock().stock.insert(product_id, stock);
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
        let expiry = now_millis() + (ttl_secs as i64) * 1000;
        let mut state = self.state.lock();
        state.stock.insert(product_id, new_stock);
        state
            .reservations
            .insert((product_id, order_id), (quantity, expiry));
        Ok(())
    }

    async fn release_reservation(&self, product_id: i64, order_id: i64) -> Result<bool, BoxError> {
        let now = now_millis();
        let mut state = self.state.lock();
        match state.reservations.remove(&(product_id, order_id)) {
            Some((qty, expiry)) if expiry > now => {
                *state.stock.entry(product_id).or_insert(0) += qty;
                Ok(true)
            }
            // Expired records behave like absent ones
            _ => Ok(false),
        }
    }

    async fn clear_reservation(&self, product_id: i64, order_id: i64) -> Result<(), BoxError> {
        self.state.lock().reservations.remove(&(product_id, order_id));
        Ok(())
    }

    async fn get_reservation(
        &self,
        product_id: i64,
        order_id: i64,
    ) -> Result<Option<i64>, BoxError> {
        let now = now_millis();
        let state = self.state.lock();
        Ok(state
            .reservations
            .get(&(product_id, order_id))
            .filter(|(_, exp)| *exp > now)
            .map(|(qty, _)| *qty))
    }

    async fn evict_stock(&self, product_id: i64) -> Result<(), BoxError> {
        self.state.lock().stock.remove(&product_id);
        Ok(())
    }
}

/// In-memory [`DistributedLock`]
#[derive(Clone, Default)]
pub struct MemoryLock {
    /// key -> (token, expiry in Unix millis)
    held: Arc<Mutex<HashMap<String, (String, i64)>>>,
}

impl MemoryLock {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DistributedLock for MemoryLock {
    async fn acquire(&self, key: &str, ttl: Duration) -> Result<Option<String>, BoxError> {
        let now = now_millis();
        let mut held = self.held.lock();
        if let Some((_, expiry)) = held.get(key)
            && *expiry > now
        {
            return Ok(None);
        }
        let token = format!("tok-{}-{}", now, held.len());
        held.insert(key.to_string(), (token.clone(), now + ttl.as_millis() as i64));
        Ok(Some(token))
    }

    async fn release(&self, key: &str, token: &str) -> Result<bool, BoxError> {
        let now = now_millis();
        let mut held = self.held.lock();
        match held.get(key) {
            Some((owner, expiry)) if owner == token && *expiry > now => {
                held.remove(key);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_release_reservation_is_idempotent() {
        let cache = MemoryStockCache::new();
        cache.set_stock(1, 10).await.unwrap();
        cache.apply_reservation(1, 99, 7, 3, 600).await.unwrap();
        assert_eq!(cache.get_stock(1).await.unwrap(), Some(7));

        assert!(cache.release_reservation(1, 99).await.unwrap());
        assert_eq!(cache.get_stock(1).await.unwrap(), Some(10));

        // Second release finds no record and must not increment again
        assert!(!cache.release_reservation(1, 99).await.unwrap());
        assert_eq!(cache.get_stock(1).await.unwrap(), Some(10));
    }

    #[tokio::test]
    async fn test_expired_reservation_is_not_restored() {
        let cache = MemoryStockCache::new();
        cache.set_stock(1, 10).await.unwrap();
        // Zero TTL: the record is born expired
        cache.apply_reservation(1, 99, 8, 2, 0).await.unwrap();

        assert!(!cache.release_reservation(1, 99).await.unwrap());
        assert_eq!(cache.get_stock(1).await.unwrap(), Some(8));
        assert_eq!(cache.get_reservation(1, 99).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_lock_mutual_exclusion_and_expiry() {
        let lock = MemoryLock::new();
        let key = "lock:stock:1";

        let token = lock
            .acquire(key, Duration::from_secs(30))
            .await
            .unwrap()
            .expect("first acquire succeeds");
        assert!(lock.acquire(key, Duration::from_secs(30)).await.unwrap().is_none());

        assert!(lock.release(key, &token).await.unwrap());
        assert!(lock.acquire(key, Duration::from_secs(30)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_expired_lock_is_reacquirable_and_stale_token_rejected() {
        let lock = MemoryLock::new();
        let key = "lock:stock:2";

        // Zero TTL: lock expires immediately
        let stale = lock.acquire(key, Duration::ZERO).await.unwrap().unwrap();

        // A second holder may take over after expiry
        let fresh = lock
            .acquire(key, Duration::from_secs(30))
            .await
            .unwrap()
            .expect("expired lock must be reacquirable");

        // The first holder's token must no longer release the lock
        assert!(!lock.release(key, &stale).await.unwrap());
        assert!(lock.release(key, &fresh).await.unwrap());
    }
}
