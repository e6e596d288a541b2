use axum::Json;
use serde_json::{json, Value};

/// The one endpoint exempt from auth (§6).
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
