//! Timeout reconciler
//!
//! Periodic sweep over orders stuck in pending/pending past the configured
//! deadline: each is cancelled and its stock released through the same
//! compensation path as a user cancellation. Stale pending payments past
//! their own deadline are failed. One order erroring does not abort the
//! sweep — it is logged and retried on the next pass.
//!
//! A stuck order this old means its reservation records already hit their
//! TTL (a crashed or abandoned orchestration), so each cancellation is
//! logged at warn level.

use std::time::Duration;

use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use shared::util::now_millis;

use crate::db;
use crate::orders::OrderService;

/// Max orders handled per sweep; leftovers wait for the next tick
const SWEEP_BATCH: i64 = 200;

/// Periodic order/payment timeout sweeper
#[derive(Clone)]
pub struct TimeoutReconciler {
    pool: PgPool,
    orders: OrderService,
    interval: Duration,
    order_timeout: Duration,
    shutdown: CancellationToken,
}

impl TimeoutReconciler {
    pub fn new(
        pool: PgPool,
        orders: OrderService,
        interval: Duration,
        order_timeout: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            pool,
            orders,
            interval,
            order_timeout,
            shutdown,
        }
    }

    /// Main loop: tick every `interval` until shutdown
    pub async fn run(self) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            order_timeout_secs = self.order_timeout.as_secs(),
            "timeout reconciler started"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = self.shutdown.cancelled() => {
                    tracing::info!("timeout reconciler received shutdown signal");
                    return;
                }
            }

            let processed = self.run_once().await;
            if processed > 0 {
                tracing::info!(processed, "timeout reconciliation pass complete");
            }
        }
    }

    /// One reconciliation pass. Returns the number of records processed
    /// (orders cancelled + payments expired). Exposed as the scheduler
    /// collaborator's single parameterless entry point.
    pub async fn run_once(&self) -> u64 {
        let mut processed = self.sweep_orders().await;
        processed += self.sweep_payments().await;
        processed
    }

    /// Cancel timed-out pending orders and release their stock
    async fn sweep_orders(&self) -> u64 {
        let cutoff = now_millis() - self.order_timeout.as_millis() as i64;

        let stale = match db::orders::find_timed_out(&self.pool, cutoff, SWEEP_BATCH).await {
            Ok(orders) => orders,
            Err(e) => {
                tracing::error!(error = %e, "timed-out order query failed");
                return 0;
            }
        };

        let mut cancelled = 0u64;
        for order in &stale {
            let age_minutes = (now_millis() - order.created_at) / 60_000;
            tracing::warn!(
                order_id = order.id,
                order_number = %order.order_number,
                age_minutes,
                "cancelling timed-out pending order, releasing stock"
            );

            // Continue-on-error: a failed compensation stays pending and is
            // picked up again next sweep
            match self.orders.release_and_cancel(order).await {
                Ok(()) => cancelled += 1,
                Err(e) => {
                    tracing::error!(
                        order_id = order.id,
                        error = %e,
                        "failed to compensate timed-out order, will retry next sweep"
                    );
                }
            }
        }

        cancelled
    }

    /// Fail pending payments whose deadline passed. Each payment carries its
    /// own `expires_at` (stamped at creation), so the sweep compares against
    /// the current time.
    async fn sweep_payments(&self) -> u64 {
        match db::payments::expire_stale(&self.pool, now_millis()).await {
            Ok(expired) => {
                if expired > 0 {
                    tracing::info!(expired, "stale pending payments failed");
                }
                expired
            }
            Err(e) => {
                tracing::error!(error = %e, "stale payment sweep failed");
                0
            }
        }
    }
}
