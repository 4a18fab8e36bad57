//! Payment Model

use serde::{Deserialize, Serialize};

use super::order::PaymentStatus;

/// Payment record for an order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Payment {
    pub id: i64,
    /// Payment number, e.g. `PMT20260806A1B2C3D4`
    pub payment_number: String,
    pub order_id: i64,
    pub status: PaymentStatus,
    /// Payment method identifier (e.g. "mock", "card")
    pub method: String,
    /// Amount in currency unit
    pub amount: f64,
    /// External gateway transaction reference
    pub gateway_transaction_id: Option<String>,
    /// Expiry deadline for a pending payment (Unix millis)
    pub expires_at: i64,
    /// Time the payment succeeded (Unix millis)
    pub paid_at: Option<i64>,
    /// Creation time (Unix millis)
    pub created_at: i64,
}
