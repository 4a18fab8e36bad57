//! Payment collaborator surface
//!
//! The real gateway lives outside this system. This module owns the payment
//! records, exposes the idempotent callback entry point, and transitions the
//! order's payment state through the order orchestrator.

use std::time::Duration;

use sqlx::PgPool;
use thiserror::Error;

use shared::error::{AppError, ErrorCode};
use shared::models::{Order, OrderStatus, Payment, PaymentStatus};
use shared::util::{now_millis, snowflake_id};

use crate::db;
use crate::db::payments::NewPayment;
use crate::notify::Notifier;
use crate::orders::{OrderError, OrderService};

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("payment not found for order {0}")]
    NotFound(i64),

    #[error("order not found: {0}")]
    OrderNotFound(i64),

    #[error("order {0} is not awaiting payment")]
    OrderNotPayable(i64),

    #[error("payment {0} is not in a pending state")]
    NotPending(i64),

    #[error("payment {0} expired before the callback arrived")]
    Expired(i64),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::NotFound(order_id) => {
                AppError::new(ErrorCode::PaymentNotFound).with_detail("order_id", order_id)
            }
            PaymentError::OrderNotFound(order_id) => {
                AppError::new(ErrorCode::OrderNotFound).with_detail("order_id", order_id)
            }
            PaymentError::OrderNotPayable(order_id) => {
                AppError::new(ErrorCode::PaymentNotPending).with_detail("order_id", order_id)
            }
            PaymentError::NotPending(payment_id) => {
                AppError::new(ErrorCode::PaymentNotPending).with_detail("payment_id", payment_id)
            }
            PaymentError::Expired(payment_id) => {
                AppError::new(ErrorCode::PaymentExpired).with_detail("payment_id", payment_id)
            }
            PaymentError::Order(e) => e.into(),
            PaymentError::Db(e) => {
                tracing::error!(error = %e, "payment database error");
                AppError::new(ErrorCode::DatabaseError)
            }
        }
    }
}

#[derive(Clone)]
pub struct PaymentService {
    pool: PgPool,
    orders: OrderService,
    notifier: Notifier,
    payment_timeout: Duration,
}

impl PaymentService {
    pub fn new(
        pool: PgPool,
        orders: OrderService,
        notifier: Notifier,
        payment_timeout: Duration,
    ) -> Self {
        Self {
            pool,
            orders,
            notifier,
            payment_timeout,
        }
    }

    /// Open a payment record for a pending order. The amount is always the
    /// order's total — the gateway is never trusted with the price.
    pub async fn create_payment(
        &self,
        order_id: i64,
        user_id: i64,
        method: &str,
    ) -> Result<Payment, PaymentError> {
        let order = db::orders::get_order(&self.pool, order_id, Some(user_id))
            .await?
            .ok_or(PaymentError::OrderNotFound(order_id))?;

        if order.status != OrderStatus::Pending || order.payment_status != PaymentStatus::Pending {
            return Err(PaymentError::OrderNotPayable(order_id));
        }

        let now = now_millis();
        let payment = Payment {
            id: snowflake_id(),
            payment_number: gen_payment_number(),
            order_id,
            status: PaymentStatus::Pending,
            method: method.to_string(),
            amount: order.total_amount,
            gateway_transaction_id: None,
            expires_at: now + self.payment_timeout.as_millis() as i64,
            paid_at: None,
            created_at: now,
        };

        db::payments::insert_payment(
            &self.pool,
            &NewPayment {
                id: payment.id,
                payment_number: &payment.payment_number,
                order_id,
                method,
                amount: payment.amount,
                expires_at: payment.expires_at,
                now,
            },
        )
        .await?;

        tracing::info!(
            payment_id = payment.id,
            payment_number = %payment.payment_number,
            order_id,
            amount = payment.amount,
            "payment created"
        );

        Ok(payment)
    }

    /// Gateway result callback, idempotent.
    ///
    /// Re-delivering a callback for an already-successful (or refunded)
    /// payment is a no-op returning the existing record. A success callback
    /// marks the payment and moves the order to paid; a failure callback
    /// only marks the payment and the order's payment state.
    pub async fn handle_callback(
        &self,
        order_id: i64,
        gateway_transaction_id: Option<&str>,
        succeeded: bool,
    ) -> Result<Payment, PaymentError> {
        let payment = db::payments::get_latest_for_order(&self.pool, order_id)
            .await?
            .ok_or(PaymentError::NotFound(order_id))?;

        match payment.status {
            // Idempotent re-delivery
            PaymentStatus::Success | PaymentStatus::Refunded => return Ok(payment),
            PaymentStatus::Failed | PaymentStatus::Cancelled => {
                return Err(PaymentError::NotPending(payment.id));
            }
            PaymentStatus::Pending | PaymentStatus::Processing => {}
        }

        let now = now_millis();
        if now > payment.expires_at {
            db::payments::mark_status(&self.pool, payment.id, PaymentStatus::Failed).await?;
            self.orders
                .update_order_status(order_id, OrderStatus::Pending, Some(PaymentStatus::Failed))
                .await?;
            tracing::warn!(payment_id = payment.id, order_id, "payment expired before callback");
            return Err(PaymentError::Expired(payment.id));
        }

        let order = if succeeded {
            db::payments::mark_success(&self.pool, payment.id, gateway_transaction_id, now).await?;
            let order = self
                .orders
                .update_order_status(order_id, OrderStatus::Paid, Some(PaymentStatus::Success))
                .await?;
            tracing::info!(payment_id = payment.id, order_id, "payment succeeded");
            order
        } else {
            db::payments::mark_status(&self.pool, payment.id, PaymentStatus::Failed).await?;
            let order = self
                .orders
                .update_order_status(order_id, OrderStatus::Pending, Some(PaymentStatus::Failed))
                .await?;
            tracing::warn!(payment_id = payment.id, order_id, "payment failed");
            order
        };

        self.notify_payment(&order, succeeded);

        let updated = db::payments::get_latest_for_order(&self.pool, order_id)
            .await?
            .ok_or(PaymentError::NotFound(order_id))?;
        Ok(updated)
    }

    fn notify_payment(&self, order: &Order, succeeded: bool) {
        if succeeded {
            self.notifier.payment_succeeded(order);
        }
    }
}

/// Payment number: `PMT` + UTC date + 8 uppercase hex chars
fn gen_payment_number() -> String {
    let date = chrono::Utc::now().format("%Y%m%d");
    let suffix = uuid::Uuid::new_v4().simple().to_string()[..8].to_uppercase();
    format!("PMT{date}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_number_format() {
        let n = gen_payment_number();
        assert!(n.starts_with("PMT"));
        assert_eq!(n.len(), 19);
    }

    #[test]
    fn test_payment_error_maps_to_api_codes() {
        let err: AppError = PaymentError::Expired(1).into();
        assert_eq!(err.code, ErrorCode::PaymentExpired);

        let err: AppError = PaymentError::OrderNotPayable(1).into();
        assert_eq!(err.code, ErrorCode::PaymentNotPending);
    }
}
