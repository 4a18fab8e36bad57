//! Order Model

use serde::{Deserialize, Serialize};

/// Order status
///
/// Forward flow: pending → paid → confirmed → preparing → ready → shipped →
/// delivered → completed. `cancelled` / `refunded` are terminal failure exits.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    Confirmed,
    Preparing,
    Ready,
    Shipped,
    Delivered,
    Completed,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Confirmed => "confirmed",
            Self::Preparing => "preparing",
            Self::Ready => "ready",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
        }
    }

    /// Terminal statuses admit no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Refunded)
    }

    /// An order can be cancelled unless it already reached a terminal status
    pub fn can_cancel(&self) -> bool {
        !self.is_terminal()
    }

    /// Whether moving from `self` to `next` is a valid transition
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        if *self == next {
            return true; // idempotent re-delivery
        }
        match self {
            Pending => matches!(next, Paid | Cancelled),
            Paid => matches!(next, Confirmed | Cancelled | Refunded),
            Confirmed => matches!(next, Preparing | Shipped | Cancelled),
            Preparing => matches!(next, Ready | Shipped | Cancelled),
            Ready => matches!(next, Shipped | Delivered),
            Shipped => matches!(next, Delivered),
            Delivered => matches!(next, Completed),
            Completed | Cancelled | Refunded => false,
        }
    }
}

/// Payment status (tracked on the order and on payment records)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Processing,
    Success,
    Failed,
    Cancelled,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Success | Self::Failed | Self::Cancelled | Self::Refunded
        )
    }
}

/// Order entity (durable row)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    pub order_number: String,
    pub user_id: i64,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    /// Sum of item line totals, in currency unit
    pub subtotal: f64,
    /// Tax amount in currency unit
    pub tax_amount: f64,
    /// Shipping fee in currency unit
    pub shipping_fee: f64,
    /// Discount amount in currency unit
    pub discount_amount: f64,
    /// Final amount: subtotal + tax + shipping - discount
    pub total_amount: f64,
    pub delivery_address: Option<serde_json::Value>,
    /// Creation time (Unix millis)
    pub created_at: i64,
    /// Last update time (Unix millis)
    pub updated_at: i64,
}

/// Order line item — immutable snapshot of the product at creation time
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub product_name: String,
    /// Unit price in currency unit, snapshotted at order creation
    pub unit_price: f64,
    pub quantity: i32,
    /// unit_price * quantity, in currency unit
    pub total_price: f64,
    /// Product attribute snapshot (JSON)
    pub product_attributes: Option<serde_json::Value>,
    /// Creation time (Unix millis)
    pub created_at: i64,
}

/// Requested order line (API input)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemInput {
    pub product_id: i64,
    pub quantity: i32,
}

/// Order with its line items (API output)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses_cannot_cancel() {
        assert!(!OrderStatus::Completed.can_cancel());
        assert!(!OrderStatus::Cancelled.can_cancel());
        assert!(!OrderStatus::Refunded.can_cancel());
        assert!(OrderStatus::Pending.can_cancel());
        assert!(OrderStatus::Shipped.can_cancel());
    }

    #[test]
    fn test_forward_transitions() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Paid));
        assert!(OrderStatus::Paid.can_transition_to(OrderStatus::Confirmed));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Delivered));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Delivered));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Pending));
    }

    #[test]
    fn test_same_status_transition_is_noop() {
        assert!(OrderStatus::Paid.can_transition_to(OrderStatus::Paid));
    }

    #[test]
    fn test_status_serde_lowercase() {
        let s = serde_json::to_string(&OrderStatus::Preparing).unwrap();
        assert_eq!(s, "\"preparing\"");
        let s = serde_json::to_string(&PaymentStatus::Success).unwrap();
        assert_eq!(s, "\"success\"");
    }
}
