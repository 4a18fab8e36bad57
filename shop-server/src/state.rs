//! Application state

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::notify::Notifier;
use crate::orders::OrderService;
use crate::orders::reconciler::TimeoutReconciler;
use crate::payments::PaymentService;
use crate::stock::{RedisLock, RedisStockCache, StockService};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool
    pub pool: PgPool,
    /// Stock reservation manager (cache + lock + durable counters)
    pub stock: StockService,
    /// Order orchestrator
    pub orders: OrderService,
    /// Payment collaborator surface
    pub payments: PaymentService,
    /// Timeout reconciler (spawned in main, also invokable on demand)
    pub reconciler: TimeoutReconciler,
    /// JWT secret for user authentication
    pub jwt_secret: String,
}

impl AppState {
    /// Create a new AppState: connect PostgreSQL, run migrations, open the
    /// Redis connection and wire up the services.
    pub async fn new(config: &Config, shutdown: CancellationToken) -> Result<Self, BoxError> {
        let pool = PgPool::connect(&config.database_url).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        let redis_client = redis::Client::open(config.redis_url.as_str())?;
        let redis_conn = redis::aio::ConnectionManager::new(redis_client).await?;
        tracing::info!("stock cache connected");

        let stock = StockService::new(
            pool.clone(),
            Arc::new(RedisStockCache::new(redis_conn.clone())),
            Arc::new(RedisLock::new(redis_conn)),
            Duration::from_secs(config.reservation_ttl_secs),
            Duration::from_secs(config.lock_ttl_secs),
        );

        let notifier = Notifier::new(config.notify_webhook_url.clone());

        let orders = OrderService::new(pool.clone(), stock.clone(), notifier.clone());

        let payments = PaymentService::new(
            pool.clone(),
            orders.clone(),
            notifier,
            Duration::from_secs(config.payment_timeout_minutes * 60),
        );

        let reconciler = TimeoutReconciler::new(
            pool.clone(),
            orders.clone(),
            Duration::from_secs(config.reconcile_interval_secs),
            Duration::from_secs(config.order_timeout_minutes * 60),
            shutdown,
        );

        Ok(Self {
            pool,
            stock,
            orders,
            payments,
            reconciler,
            jwt_secret: config.jwt_secret.clone(),
        })
    }
}
