//! Payment endpoints: create payment, gateway result callback

use axum::{
    Extension, Json,
    extract::State,
};
use serde::Deserialize;

use shared::models::Payment;

use crate::auth::UserIdentity;
use crate::state::AppState;

use super::ApiResult;

/// POST /api/payments
#[derive(Deserialize)]
pub struct CreatePaymentRequest {
    pub order_id: i64,
    pub method: String,
}

pub async fn create_payment(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Json(req): Json<CreatePaymentRequest>,
) -> ApiResult<Payment> {
    let payment = state
        .payments
        .create_payment(req.order_id, identity.user_id, &req.method)
        .await?;
    Ok(Json(payment))
}

/// POST /api/payments/callback
///
/// Gateway result delivery. Idempotent: re-delivering a result for an
/// already-settled payment returns the settled record.
#[derive(Deserialize)]
pub struct PaymentCallbackRequest {
    pub order_id: i64,
    pub transaction_id: Option<String>,
    pub success: bool,
}

pub async fn payment_callback(
    State(state): State<AppState>,
    Json(req): Json<PaymentCallbackRequest>,
) -> ApiResult<Payment> {
    let payment = state
        .payments
        .handle_callback(req.order_id, req.transaction_id.as_deref(), req.success)
        .await?;
    Ok(Json(payment))
}
