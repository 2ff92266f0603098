use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use tracing::warn;

use crate::state::AppState;
use crate::store::StoreHealth;

/// GET /health
/// Public. 503 while the database is unreachable so orchestrators hold
/// traffic back.
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let (status, overall, database) = match state.store.ping().await {
        Ok(()) => (StatusCode::OK, "ok", "ok"),
        Err(e) => {
            warn!("Health check failed: {e}");
            (StatusCode::SERVICE_UNAVAILABLE, "degraded", "unavailable")
        }
    };

    (
        status,
        Json(json!({
            "status": overall,
            "database": database,
            "version": env!("CARGO_PKG_VERSION"),
            "service": "cvalign-api"
        })),
    )
}
