//! Request handlers.

pub mod run;
pub mod schedules;
pub mod webhooks;

use axum::Json;
use serde_json::{json, Value};

/// Liveness probe.
pub async fn health() -> Json<Value> {
    Json(json!({ "service": "autoflow", "status": "ok" }))
}
