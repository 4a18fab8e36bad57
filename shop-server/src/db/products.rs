//! Product queries: catalog snapshots and the stock / sales counters
//!
//! The catalog itself is owned by an external collaborator; this module only
//! reads product metadata and mutates the two counters the reservation
//! pipeline is responsible for.

use shared::models::Product;
use sqlx::PgExecutor;

/// Load a product by id (soft-deleted products are invisible)
pub async fn get_product(
    db: impl PgExecutor<'_>,
    product_id: i64,
) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>(
        "SELECT id, title, price, stock, sales_count, attributes, is_deleted,
                created_at, updated_at
         FROM products
         WHERE id = $1 AND is_deleted = FALSE",
    )
    .bind(product_id)
    .fetch_optional(db)
    .await
}

/// Authoritative stock for a product, `None` when the product does not exist
pub async fn get_stock(
    db: impl PgExecutor<'_>,
    product_id: i64,
) -> Result<Option<i64>, sqlx::Error> {
    let row: Option<(i64,)> =
        sqlx::query_as("SELECT stock FROM products WHERE id = $1 AND is_deleted = FALSE")
            .bind(product_id)
            .fetch_optional(db)
            .await?;
    Ok(row.map(|r| r.0))
}

/// Conditional confirm-phase decrement.
///
/// Re-verifies sufficiency atomically at write time: zero rows affected means
/// the durable stock was depleted between reserve and confirm (e.g. by a
/// second instance with a stale cache) and the confirm must fail.
pub async fn confirm_decrement(
    db: impl PgExecutor<'_>,
    product_id: i64,
    quantity: i64,
    now: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE products
         SET stock = stock - $2, sales_count = sales_count + $2, updated_at = $3
         WHERE id = $1 AND stock >= $2 AND is_deleted = FALSE",
    )
    .bind(product_id)
    .bind(quantity)
    .bind(now)
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}

/// Compensating increment for a cancelled order: returns the confirmed
/// quantity to stock and backs out the sales counter.
pub async fn restore_stock(
    db: impl PgExecutor<'_>,
    product_id: i64,
    quantity: i64,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE products
         SET stock = stock + $2,
             sales_count = GREATEST(sales_count - $2, 0),
             updated_at = $3
         WHERE id = $1",
    )
    .bind(product_id)
    .bind(quantity)
    .bind(now)
    .execute(db)
    .await?;
    Ok(())
}

/// (product_id, stock) pairs for cache synchronization — one product or all
pub async fn list_stock(
    db: impl PgExecutor<'_>,
    product_id: Option<i64>,
) -> Result<Vec<(i64, i64)>, sqlx::Error> {
    match product_id {
        Some(id) => {
            sqlx::query_as("SELECT id, stock FROM products WHERE id = $1 AND is_deleted = FALSE")
                .bind(id)
                .fetch_all(db)
                .await
        }
        None => {
            sqlx::query_as("SELECT id, stock FROM products WHERE is_deleted = FALSE")
                .fetch_all(db)
                .await
        }
    }
}
