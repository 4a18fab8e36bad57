//! Order orchestration - creation pipeline, status management, cancellation
//!
//! # Order Creation Flow
//!
//! ```text
//! create_order(user, items)
//!     ├─ 1. Validate items (quantity / bounds)
//!     ├─ 2. Generate order id (snowflake) + order number
//!     ├─ 3. Availability pre-check per item (no side effects yet)
//!     ├─ 4. Reserve each item in caller order
//!     │      └─ first failure → roll back prior reservations, abort
//!     ├─ 5. One transaction: snapshot products, insert order + items,
//!     │      confirm each reservation (conditional durable decrement)
//!     │      └─ any failure → transaction aborts, all reservations rolled back
//!     ├─ 6. Commit
//!     ├─ 7. Clear reservation records (post-commit, TTL as backstop)
//!     └─ 8. Notify (fire-and-forget)
//! ```
//!
//! Reservations are awaited sequentially — never concurrently — so the
//! compensation pass can unwind them in reservation order. No partial order
//! is ever visible: the durable insert and every confirm share one
//! transaction.

pub mod money;
pub mod reconciler;

use sqlx::PgPool;
use thiserror::Error;

use shared::error::{AppError, ErrorCode};
use shared::models::{Order, OrderDetail, OrderItem, OrderItemInput, OrderStatus, PaymentStatus};
use shared::util::{now_millis, snowflake_id};

use crate::db;
use crate::db::orders::{NewOrder, NewOrderItem};
use crate::notify::Notifier;
use crate::stock::{StockError, StockService};

/// Order orchestration errors
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("order contains no items")]
    EmptyOrder,

    #[error("invalid order item: {0}")]
    InvalidItem(String),

    #[error("insufficient stock for product {product_id} (requested {requested})")]
    Unavailable { product_id: i64, requested: i64 },

    #[error(transparent)]
    Stock(#[from] StockError),

    #[error("order not found: {0}")]
    NotFound(i64),

    #[error("order {0} cannot be cancelled in status {1:?}")]
    NotCancellable(i64, OrderStatus),

    #[error("invalid status transition {0:?} -> {1:?}")]
    InvalidTransition(OrderStatus, OrderStatus),

    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::EmptyOrder => AppError::new(ErrorCode::EmptyOrder),
            OrderError::InvalidItem(msg) => {
                AppError::with_message(ErrorCode::ValidationFailed, msg)
            }
            OrderError::Unavailable {
                product_id,
                requested,
            } => AppError::new(ErrorCode::StockUnavailable)
                .with_detail("product_id", product_id)
                .with_detail("requested", requested),
            OrderError::Stock(stock_err) => match stock_err {
                StockError::Unavailable { product_id, .. } => {
                    AppError::new(ErrorCode::StockUnavailable).with_detail("product_id", product_id)
                }
                StockError::LockContention(product_id) => {
                    AppError::new(ErrorCode::StockContended).with_detail("product_id", product_id)
                }
                StockError::ProductNotFound(product_id) => {
                    AppError::new(ErrorCode::ProductNotFound).with_detail("product_id", product_id)
                }
                StockError::ConfirmFailed { product_id } => {
                    AppError::new(ErrorCode::StockConfirmFailed)
                        .with_detail("product_id", product_id)
                }
                StockError::Cache(e) => {
                    tracing::error!(error = %e, "stock cache error");
                    AppError::new(ErrorCode::CacheError)
                }
                StockError::Db(e) => {
                    tracing::error!(error = %e, "stock database error");
                    AppError::new(ErrorCode::DatabaseError)
                }
            },
            OrderError::NotFound(order_id) => {
                AppError::new(ErrorCode::OrderNotFound).with_detail("order_id", order_id)
            }
            OrderError::NotCancellable(order_id, status) => {
                AppError::new(ErrorCode::OrderNotCancellable)
                    .with_detail("order_id", order_id)
                    .with_detail("status", status.as_str())
            }
            OrderError::InvalidTransition(from, to) => {
                AppError::new(ErrorCode::InvalidStatusTransition)
                    .with_detail("from", from.as_str())
                    .with_detail("to", to.as_str())
            }
            OrderError::Db(e) => {
                tracing::error!(error = %e, "order database error");
                AppError::new(ErrorCode::DatabaseError)
            }
        }
    }
}

/// Top-level order state machine. Owns all writes to `orders` /
/// `order_items`; payment and display collaborators only read.
#[derive(Clone)]
pub struct OrderService {
    pool: PgPool,
    stock: StockService,
    notifier: Notifier,
}

impl OrderService {
    pub fn new(pool: PgPool, stock: StockService, notifier: Notifier) -> Self {
        Self {
            pool,
            stock,
            notifier,
        }
    }

    /// Create an order for `user_id` from the requested items.
    ///
    /// Every exit is either a fully committed order or a fully compensated
    /// rejection — no partial reservations, no dangling rows.
    pub async fn create_order(
        &self,
        user_id: i64,
        items: &[OrderItemInput],
        delivery_address: Option<serde_json::Value>,
    ) -> Result<OrderDetail, OrderError> {
        validate_items(items)?;

        let order_id = snowflake_id();
        let order_number = gen_order_number();
        let now = now_millis();

        // Availability pre-check: reject impossible orders before touching
        // anything. check_availability fails closed on read errors.
        for item in items {
            if !self
                .stock
                .check_availability(item.product_id, item.quantity as i64)
                .await
            {
                return Err(OrderError::Unavailable {
                    product_id: item.product_id,
                    requested: item.quantity as i64,
                });
            }
        }

        // Reserve sequentially in caller order; unwind on first failure
        let mut reserved = 0;
        for item in items {
            if let Err(e) = self
                .stock
                .reserve(item.product_id, item.quantity as i64, order_id)
                .await
            {
                tracing::warn!(
                    order_id,
                    product_id = item.product_id,
                    error = %e,
                    "reservation failed, compensating prior items"
                );
                self.rollback_items(&items[..reserved], order_id).await;
                return Err(e.into());
            }
            reserved += 1;
        }

        // Durable phase: order + items + confirms in one transaction
        match self
            .persist_order(
                order_id,
                &order_number,
                user_id,
                items,
                delivery_address,
                now,
            )
            .await
        {
            Ok(detail) => {
                // Records are consumed only after commit so an aborted
                // transaction can still compensate through them
                for item in items {
                    self.stock.finalize_reservation(item.product_id, order_id).await;
                }
                tracing::info!(
                    order_id,
                    order_number = %order_number,
                    user_id,
                    total = detail.order.total_amount,
                    "order created"
                );
                self.notifier.order_created(&detail.order);
                Ok(detail)
            }
            Err(e) => {
                tracing::error!(order_id, user_id, error = %e, "order persistence failed, compensating");
                self.rollback_items(items, order_id).await;
                Err(e)
            }
        }
    }

    async fn persist_order(
        &self,
        order_id: i64,
        order_number: &str,
        user_id: i64,
        items: &[OrderItemInput],
        delivery_address: Option<serde_json::Value>,
        now: i64,
    ) -> Result<OrderDetail, OrderError> {
        let mut tx = self.pool.begin().await?;

        // Snapshot each product inside the transaction so order items freeze
        // name/price/attributes as of this instant
        let mut snapshots = Vec::with_capacity(items.len());
        for item in items {
            let product = db::products::get_product(&mut *tx, item.product_id)
                .await?
                .ok_or(StockError::ProductNotFound(item.product_id))?;
            snapshots.push(product);
        }

        let lines: Vec<(f64, i32)> = snapshots
            .iter()
            .zip(items)
            .map(|(p, i)| (p.price, i.quantity))
            .collect();
        let totals = money::compute_totals(&lines);

        db::orders::insert_order(
            &mut *tx,
            &NewOrder {
                id: order_id,
                order_number,
                user_id,
                subtotal: totals.subtotal,
                tax_amount: totals.tax_amount,
                shipping_fee: totals.shipping_fee,
                discount_amount: totals.discount_amount,
                total_amount: totals.total_amount,
                delivery_address: delivery_address.as_ref(),
                now,
            },
        )
        .await?;

        let mut order_items = Vec::with_capacity(items.len());
        for (product, item) in snapshots.iter().zip(items) {
            let order_item = OrderItem {
                id: snowflake_id(),
                order_id,
                product_id: product.id,
                product_name: product.title.clone(),
                unit_price: product.price,
                quantity: item.quantity,
                total_price: money::line_total(product.price, item.quantity),
                product_attributes: product.attributes.clone(),
                created_at: now,
            };
            db::orders::insert_order_item(
                &mut *tx,
                &NewOrderItem {
                    id: order_item.id,
                    order_id,
                    product_id: order_item.product_id,
                    product_name: &order_item.product_name,
                    unit_price: order_item.unit_price,
                    quantity: order_item.quantity,
                    total_price: order_item.total_price,
                    product_attributes: order_item.product_attributes.as_ref(),
                    now,
                },
            )
            .await?;
            order_items.push(order_item);
        }

        // Authoritative confirm per item; zero-rows aborts the whole unit
        for item in items {
            self.stock
                .confirm(&mut tx, item.product_id, item.quantity as i64, order_id)
                .await?;
        }

        tx.commit().await?;

        Ok(OrderDetail {
            order: Order {
                id: order_id,
                order_number: order_number.to_string(),
                user_id,
                status: OrderStatus::Pending,
                payment_status: PaymentStatus::Pending,
                subtotal: totals.subtotal,
                tax_amount: totals.tax_amount,
                shipping_fee: totals.shipping_fee,
                discount_amount: totals.discount_amount,
                total_amount: totals.total_amount,
                delivery_address,
                created_at: now,
                updated_at: now,
            },
            items: order_items,
        })
    }

    async fn rollback_items(&self, items: &[OrderItemInput], order_id: i64) {
        for item in items {
            self.stock
                .rollback(item.product_id, item.quantity as i64, order_id)
                .await;
        }
    }

    /// Update order status (and optionally payment status).
    ///
    /// Idempotent for re-delivered payment callbacks: a transition to the
    /// current state is a no-op returning the unchanged order.
    pub async fn update_order_status(
        &self,
        order_id: i64,
        status: OrderStatus,
        payment_status: Option<PaymentStatus>,
    ) -> Result<Order, OrderError> {
        let order = db::orders::get_order(&self.pool, order_id, None)
            .await?
            .ok_or(OrderError::NotFound(order_id))?;

        if order.status == status
            && payment_status.is_none_or(|p| p == order.payment_status)
        {
            return Ok(order);
        }

        if !order.status.can_transition_to(status) {
            return Err(OrderError::InvalidTransition(order.status, status));
        }

        db::orders::update_status(&self.pool, order_id, status, payment_status, now_millis())
            .await?;

        let updated = db::orders::get_order(&self.pool, order_id, None)
            .await?
            .ok_or(OrderError::NotFound(order_id))?;

        tracing::info!(
            order_id,
            status = status.as_str(),
            payment_status = ?payment_status.map(|p| p.as_str()),
            "order status updated"
        );

        Ok(updated)
    }

    /// Cancel an order, releasing its stock back to inventory.
    ///
    /// Refused when the order already reached a terminal status. The durable
    /// counters are restored in the same transaction that flips the status;
    /// the cached shadow is evicted and re-syncs on next read.
    pub async fn cancel_order(
        &self,
        order_id: i64,
        user_id: Option<i64>,
    ) -> Result<Order, OrderError> {
        let order = db::orders::get_order(&self.pool, order_id, user_id)
            .await?
            .ok_or(OrderError::NotFound(order_id))?;

        if !order.status.can_cancel() {
            return Err(OrderError::NotCancellable(order_id, order.status));
        }

        self.release_and_cancel(&order).await?;

        let updated = db::orders::get_order(&self.pool, order_id, None)
            .await?
            .ok_or(OrderError::NotFound(order_id))?;

        tracing::info!(order_id, user_id = ?user_id, "order cancelled");
        self.notifier.order_cancelled(&updated);

        Ok(updated)
    }

    /// Flip an order to cancelled and return its stock, atomically on the
    /// durable side. Shared by user cancellation and the timeout reconciler.
    pub(crate) async fn release_and_cancel(&self, order: &Order) -> Result<(), OrderError> {
        let items = db::orders::list_order_items(&self.pool, order.id).await?;
        let now = now_millis();

        let mut tx = self.pool.begin().await?;
        db::orders::update_status(
            &mut *tx,
            order.id,
            OrderStatus::Cancelled,
            Some(PaymentStatus::Cancelled),
            now,
        )
        .await?;
        for item in &items {
            db::products::restore_stock(&mut *tx, item.product_id, item.quantity as i64, now)
                .await?;
        }
        tx.commit().await?;

        for item in &items {
            // Consume any reservation record a crashed orchestration left
            // behind, then drop the shadow so reads re-sync from durable
            self.stock
                .finalize_reservation(item.product_id, order.id)
                .await;
            self.stock.evict(item.product_id).await;
        }

        Ok(())
    }

    /// Order detail by order number, optionally scoped to its owner
    pub async fn get_order_by_number(
        &self,
        order_number: &str,
        user_id: Option<i64>,
    ) -> Result<Option<OrderDetail>, OrderError> {
        let Some(order) = db::orders::get_order_by_number(&self.pool, order_number, user_id).await?
        else {
            return Ok(None);
        };
        let items = db::orders::list_order_items(&self.pool, order.id).await?;
        Ok(Some(OrderDetail { order, items }))
    }

    /// A user's orders, newest first
    pub async fn list_user_orders(
        &self,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Order>, OrderError> {
        Ok(db::orders::list_user_orders(&self.pool, user_id, limit, offset).await?)
    }
}

/// Reject malformed item lists before any side effect
fn validate_items(items: &[OrderItemInput]) -> Result<(), OrderError> {
    if items.is_empty() {
        return Err(OrderError::EmptyOrder);
    }
    for item in items {
        if item.quantity < 1 {
            return Err(OrderError::InvalidItem(format!(
                "quantity must be positive, got {}",
                item.quantity
            )));
        }
        if item.quantity > money::MAX_QUANTITY {
            return Err(OrderError::InvalidItem(format!(
                "quantity exceeds maximum allowed ({}), got {}",
                money::MAX_QUANTITY,
                item.quantity
            )));
        }
    }
    Ok(())
}

/// Order number: `ORD` + UTC date + 8 uppercase hex chars
fn gen_order_number() -> String {
    let date = chrono::Utc::now().format("%Y%m%d");
    let suffix = uuid::Uuid::new_v4().simple().to_string()[..8].to_uppercase();
    format!("ORD{date}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_items_empty_rejected() {
        assert!(matches!(validate_items(&[]), Err(OrderError::EmptyOrder)));
    }

    #[test]
    fn test_validate_items_zero_quantity_rejected() {
        let items = [OrderItemInput {
            product_id: 1,
            quantity: 0,
        }];
        assert!(matches!(
            validate_items(&items),
            Err(OrderError::InvalidItem(_))
        ));
    }

    #[test]
    fn test_validate_items_excessive_quantity_rejected() {
        let items = [OrderItemInput {
            product_id: 1,
            quantity: money::MAX_QUANTITY + 1,
        }];
        assert!(matches!(
            validate_items(&items),
            Err(OrderError::InvalidItem(_))
        ));
    }

    #[test]
    fn test_validate_items_accepts_normal_order() {
        let items = [
            OrderItemInput {
                product_id: 1,
                quantity: 2,
            },
            OrderItemInput {
                product_id: 2,
                quantity: 1,
            },
        ];
        assert!(validate_items(&items).is_ok());
    }

    #[test]
    fn test_order_number_format() {
        let n = gen_order_number();
        assert!(n.starts_with("ORD"));
        assert_eq!(n.len(), 3 + 8 + 8);
        let suffix = &n[11..];
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(!suffix.chars().any(|c| c.is_ascii_lowercase()));
    }

    #[test]
    fn test_order_error_maps_to_api_codes() {
        let err: AppError = OrderError::Unavailable {
            product_id: 7,
            requested: 3,
        }
        .into();
        assert_eq!(err.code, ErrorCode::StockUnavailable);

        let err: AppError = OrderError::Stock(StockError::LockContention(7)).into();
        assert_eq!(err.code, ErrorCode::StockContended);

        let err: AppError =
            OrderError::NotCancellable(1, OrderStatus::Completed).into();
        assert_eq!(err.code, ErrorCode::OrderNotCancellable);
    }
}
