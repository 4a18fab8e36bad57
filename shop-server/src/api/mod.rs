//! API routes

pub mod admin;
pub mod health;
pub mod orders;
pub mod payments;

use axum::routing::{get, post};
use axum::{Json, Router, middleware};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use shared::error::AppError;

use crate::auth::user_auth_middleware;
use crate::state::AppState;

/// Handler result: JSON payload or a unified error envelope
pub type ApiResult<T> = Result<Json<T>, AppError>;

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    // Order + payment endpoints (JWT authenticated)
    let user_api = Router::new()
        .route(
            "/api/orders",
            post(orders::create_order).get(orders::list_orders),
        )
        .route("/api/orders/{order_number}", get(orders::get_order))
        .route("/api/orders/{order_id}/cancel", post(orders::cancel_order))
        .route("/api/payments", post(payments::create_payment))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            user_auth_middleware,
        ));

    // Operational endpoints (JWT authenticated; fronted by an internal
    // gateway in production)
    let admin_api = Router::new()
        .route("/api/admin/stock/sync", post(admin::sync_stock))
        .route("/api/admin/reconcile", post(admin::reconcile))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            user_auth_middleware,
        ));

    // Public: health probe + gateway callback (gateway authenticates with
    // its own channel, not a user token)
    let public = Router::new()
        .route("/health", get(health::health_check))
        .route("/api/payments/callback", post(payments::payment_callback));

    Router::new()
        .merge(public)
        .merge(user_api)
        .merge(admin_api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
