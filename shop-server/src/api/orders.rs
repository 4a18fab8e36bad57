//! Order endpoints: create, list, detail, cancel

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use shared::error::{AppError, ErrorCode};
use shared::models::{Order, OrderDetail, OrderItemInput};

use crate::auth::UserIdentity;
use crate::state::AppState;

use super::ApiResult;

/// POST /api/orders
#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItemInput>,
    pub delivery_address: Option<serde_json::Value>,
}

pub async fn create_order(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Json(req): Json<CreateOrderRequest>,
) -> ApiResult<OrderDetail> {
    let detail = state
        .orders
        .create_order(identity.user_id, &req.items, req.delivery_address)
        .await?;
    Ok(Json(detail))
}

/// GET /api/orders
#[derive(Deserialize)]
pub struct OrdersQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

pub async fn list_orders(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Query(query): Query<OrdersQuery>,
) -> ApiResult<Vec<Order>> {
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let orders = state
        .orders
        .list_user_orders(identity.user_id, per_page, offset)
        .await?;
    Ok(Json(orders))
}

/// GET /api/orders/{order_number}
pub async fn get_order(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(order_number): Path<String>,
) -> ApiResult<OrderDetail> {
    let detail = state
        .orders
        .get_order_by_number(&order_number, Some(identity.user_id))
        .await?
        .ok_or_else(|| {
            AppError::new(ErrorCode::OrderNotFound).with_detail("order_number", order_number)
        })?;
    Ok(Json(detail))
}

/// POST /api/orders/{order_id}/cancel
pub async fn cancel_order(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(order_id): Path<i64>,
) -> ApiResult<Order> {
    let order = state
        .orders
        .cancel_order(order_id, Some(identity.user_id))
        .await?;
    Ok(Json(order))
}
