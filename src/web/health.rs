use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};

/// Liveness check. Never touches upstream services.
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
