//! Health check endpoint

use axum::Json;
use axum::extract::State;

use crate::state::AppState;

/// GET /health
///
/// Liveness + a cheap database round-trip so the probe catches a wedged pool.
pub async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let db_ok = sqlx::query("SELECT 1")
        .execute(&state.pool)
        .await
        .is_ok();

    Json(serde_json::json!({
        "status": if db_ok { "ok" } else { "degraded" },
        "database": db_ok,
    }))
}
