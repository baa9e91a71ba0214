use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};

use crate::AppState;

/// GET /health - Store connectivity check.
///
/// Store faults are reported in the body rather than as an opaque 500.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.gateway.ping().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "db": "connected" })),
        ),
        Err(e) => {
            tracing::warn!(name: "health.degraded", error = ?e, "Session store unreachable");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "status": "error",
                    "db": "disconnected",
                    "message": e.to_string(),
                })),
            )
        }
    }
}
