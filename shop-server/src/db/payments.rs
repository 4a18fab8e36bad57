//! Payment record persistence

use shared::models::{Payment, PaymentStatus};
use sqlx::PgExecutor;

pub struct NewPayment<'a> {
    pub id: i64,
    pub payment_number: &'a str,
    pub order_id: i64,
    pub method: &'a str,
    pub amount: f64,
    pub expires_at: i64,
    pub now: i64,
}

pub async fn insert_payment(
    db: impl PgExecutor<'_>,
    payment: &NewPayment<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO payments (id, payment_number, order_id, status, method, amount,
                               expires_at, created_at)
         VALUES ($1, $2, $3, 'pending', $4, $5, $6, $7)",
    )
    .bind(payment.id)
    .bind(payment.payment_number)
    .bind(payment.order_id)
    .bind(payment.method)
    .bind(payment.amount)
    .bind(payment.expires_at)
    .bind(payment.now)
    .execute(db)
    .await?;
    Ok(())
}

const PAYMENT_COLUMNS: &str = "id, payment_number, order_id, status, method, amount, \
     gateway_transaction_id, expires_at, paid_at, created_at";

/// Latest payment record for an order
pub async fn get_latest_for_order(
    db: impl PgExecutor<'_>,
    order_id: i64,
) -> Result<Option<Payment>, sqlx::Error> {
    let sql = format!(
        "SELECT {PAYMENT_COLUMNS} FROM payments \
         WHERE order_id = $1 ORDER BY created_at DESC LIMIT 1"
    );
    sqlx::query_as::<_, Payment>(&sql)
        .bind(order_id)
        .fetch_optional(db)
        .await
}

/// Mark a payment successful, recording the gateway reference
pub async fn mark_success(
    db: impl PgExecutor<'_>,
    payment_id: i64,
    gateway_transaction_id: Option<&str>,
    now: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE payments
         SET status = 'success', gateway_transaction_id = $2, paid_at = $3
         WHERE id = $1 AND status IN ('pending', 'processing')",
    )
    .bind(payment_id)
    .bind(gateway_transaction_id)
    .bind(now)
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}

/// Move a payment into a terminal failure state
pub async fn mark_status(
    db: impl PgExecutor<'_>,
    payment_id: i64,
    status: PaymentStatus,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE payments SET status = $2 WHERE id = $1")
        .bind(payment_id)
        .bind(status)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

/// Fail every pending payment whose deadline passed; returns affected count
pub async fn expire_stale(db: impl PgExecutor<'_>, now: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE payments SET status = 'failed' WHERE status = 'pending' AND expires_at < $1",
    )
    .bind(now)
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}
