//! `POST /run` — execute a workflow for the authenticated user.
//!
//! The authenticated user id arrives in the `X-User-Id` header (the auth
//! middleware in front of this service resolves tokens to ids).

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use engine::Workflow;
use serde_json::{json, Value};

use crate::AppState;

pub async fn run_workflow(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(workflow): Json<Workflow>,
) -> (StatusCode, Json<Value>) {
    let user_id = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty());

    match state.engine.run(&workflow, user_id).await {
        Ok(results) => (StatusCode::OK, Json(json!({ "message": results }))),
        Err(e) => (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() }))),
    }
}
