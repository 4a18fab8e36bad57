//! Order and order-item persistence
//!
//! Plain query functions over a `PgExecutor` so callers decide whether a
//! statement runs on the pool or inside an open transaction. The order
//! orchestrator owns all writes; queries are read by the API layer and the
//! timeout reconciler.

use shared::models::{Order, OrderItem, OrderStatus, PaymentStatus};
use sqlx::PgExecutor;

pub struct NewOrder<'a> {
    pub id: i64,
    pub order_number: &'a str,
    pub user_id: i64,
    pub subtotal: f64,
    pub tax_amount: f64,
    pub shipping_fee: f64,
    pub discount_amount: f64,
    pub total_amount: f64,
    pub delivery_address: Option<&'a serde_json::Value>,
    pub now: i64,
}

/// Insert a new order row (status pending/pending)
pub async fn insert_order(db: impl PgExecutor<'_>, order: &NewOrder<'_>) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO orders (id, order_number, user_id, status, payment_status,
                             subtotal, tax_amount, shipping_fee, discount_amount, total_amount,
                             delivery_address, created_at, updated_at)
         VALUES ($1, $2, $3, 'pending', 'pending', $4, $5, $6, $7, $8, $9, $10, $10)",
    )
    .bind(order.id)
    .bind(order.order_number)
    .bind(order.user_id)
    .bind(order.subtotal)
    .bind(order.tax_amount)
    .bind(order.shipping_fee)
    .bind(order.discount_amount)
    .bind(order.total_amount)
    .bind(order.delivery_address)
    .bind(order.now)
    .execute(db)
    .await?;
    Ok(())
}

pub struct NewOrderItem<'a> {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub product_name: &'a str,
    pub unit_price: f64,
    pub quantity: i32,
    pub total_price: f64,
    pub product_attributes: Option<&'a serde_json::Value>,
    pub now: i64,
}

/// Insert one order line item (product snapshot taken at creation time)
pub async fn insert_order_item(
    db: impl PgExecutor<'_>,
    item: &NewOrderItem<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO order_items (id, order_id, product_id, product_name, unit_price,
                                  quantity, total_price, product_attributes, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(item.id)
    .bind(item.order_id)
    .bind(item.product_id)
    .bind(item.product_name)
    .bind(item.unit_price)
    .bind(item.quantity)
    .bind(item.total_price)
    .bind(item.product_attributes)
    .bind(item.now)
    .execute(db)
    .await?;
    Ok(())
}

const ORDER_COLUMNS: &str = "id, order_number, user_id, status, payment_status, subtotal, \
     tax_amount, shipping_fee, discount_amount, total_amount, delivery_address, \
     created_at, updated_at";

/// Load an order by id, optionally scoped to its owner
pub async fn get_order(
    db: impl PgExecutor<'_>,
    order_id: i64,
    user_id: Option<i64>,
) -> Result<Option<Order>, sqlx::Error> {
    let sql = format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND ($2::BIGINT IS NULL OR user_id = $2)"
    );
    sqlx::query_as::<_, Order>(&sql)
        .bind(order_id)
        .bind(user_id)
        .fetch_optional(db)
        .await
}

/// Load an order by its order number, optionally scoped to its owner
pub async fn get_order_by_number(
    db: impl PgExecutor<'_>,
    order_number: &str,
    user_id: Option<i64>,
) -> Result<Option<Order>, sqlx::Error> {
    let sql = format!(
        "SELECT {ORDER_COLUMNS} FROM orders \
         WHERE order_number = $1 AND ($2::BIGINT IS NULL OR user_id = $2)"
    );
    sqlx::query_as::<_, Order>(&sql)
        .bind(order_number)
        .bind(user_id)
        .fetch_optional(db)
        .await
}

/// A user's orders, newest first
pub async fn list_user_orders(
    db: impl PgExecutor<'_>,
    user_id: i64,
    limit: i64,
    offset: i64,
) -> Result<Vec<Order>, sqlx::Error> {
    let sql = format!(
        "SELECT {ORDER_COLUMNS} FROM orders \
         WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3"
    );
    sqlx::query_as::<_, Order>(&sql)
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await
}

/// Line items of an order
pub async fn list_order_items(
    db: impl PgExecutor<'_>,
    order_id: i64,
) -> Result<Vec<OrderItem>, sqlx::Error> {
    sqlx::query_as::<_, OrderItem>(
        "SELECT id, order_id, product_id, product_name, unit_price, quantity,
                total_price, product_attributes, created_at
         FROM order_items WHERE order_id = $1 ORDER BY id",
    )
    .bind(order_id)
    .fetch_all(db)
    .await
}

/// Update order status (and optionally payment status)
pub async fn update_status(
    db: impl PgExecutor<'_>,
    order_id: i64,
    status: OrderStatus,
    payment_status: Option<PaymentStatus>,
    now: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE orders
         SET status = $2, payment_status = COALESCE($3, payment_status), updated_at = $4
         WHERE id = $1",
    )
    .bind(order_id)
    .bind(status)
    .bind(payment_status)
    .bind(now)
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}

/// Orders stuck in pending/pending since before `cutoff` (for the reconciler)
pub async fn find_timed_out(
    db: impl PgExecutor<'_>,
    cutoff: i64,
    limit: i64,
) -> Result<Vec<Order>, sqlx::Error> {
    let sql = format!(
        "SELECT {ORDER_COLUMNS} FROM orders \
         WHERE status = 'pending' AND payment_status = 'pending' AND created_at < $1 \
         ORDER BY created_at LIMIT $2"
    );
    sqlx::query_as::<_, Order>(&sql)
        .bind(cutoff)
        .bind(limit)
        .fetch_all(db)
        .await
}
