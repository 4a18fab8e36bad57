//! Operational endpoints: stock cache sync, on-demand reconciliation

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use shared::error::AppError;

use crate::orders::OrderError;
use crate::state::AppState;

use super::ApiResult;

/// POST /api/admin/stock/sync
#[derive(Deserialize)]
pub struct SyncStockRequest {
    /// Sync a single product, or the whole catalog when absent
    pub product_id: Option<i64>,
}

#[derive(Serialize)]
pub struct SyncStockResponse {
    pub synced: u64,
}

pub async fn sync_stock(
    State(state): State<AppState>,
    Json(req): Json<SyncStockRequest>,
) -> ApiResult<SyncStockResponse> {
    let synced = state
        .stock
        .sync_stock_to_cache(req.product_id)
        .await
        .map_err(|e| AppError::from(OrderError::Stock(e)))?;
    Ok(Json(SyncStockResponse { synced }))
}

/// POST /api/admin/reconcile
///
/// Scheduler collaborator entry point: one timeout reconciliation pass.
#[derive(Serialize)]
pub struct ReconcileResponse {
    pub processed: u64,
}

pub async fn reconcile(State(state): State<AppState>) -> ApiResult<ReconcileResponse> {
    let processed = state.reconciler.run_once().await;
    Ok(Json(ReconcileResponse { processed }))
}
