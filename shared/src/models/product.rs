//! Product Model
//!
//! The catalog itself is managed elsewhere; this crate only reads product
//! metadata for order snapshots and mutates the `stock` / `sales_count`
//! counters through the reservation pipeline.

use serde::{Deserialize, Serialize};

/// Product entity (durable row)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    pub title: String,
    /// Price in currency unit
    pub price: f64,
    /// Authoritative available quantity, never negative
    pub stock: i64,
    /// Units sold (bumped by the confirm-phase decrement)
    pub sales_count: i64,
    /// Attribute snapshot source (JSON)
    pub attributes: Option<serde_json::Value>,
    /// Soft delete flag — deleted products are invisible to the pipeline
    pub is_deleted: bool,
    /// Creation time (Unix millis)
    pub created_at: i64,
    /// Last update time (Unix millis)
    pub updated_at: i64,
}
