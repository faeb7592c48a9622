//! Cron schedule management.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use scheduler::ScheduleError;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::AppState;

#[derive(Deserialize)]
pub struct ScheduleParams {
    pub workflow_id: String,
    pub cron: String,
}

/// `POST /schedule?workflow_id=…&cron=…` — register a cron trigger for a
/// stored workflow.
pub async fn add(
    State(state): State<AppState>,
    Query(params): Query<ScheduleParams>,
) -> (StatusCode, Json<Value>) {
    if !state.engine.store().contains(&params.workflow_id) {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": format!("Workflow {} not found in stored workflows", params.workflow_id)
            })),
        );
    }

    match state.engine.scheduler().add(&params.workflow_id, &params.cron) {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "message": format!(
                    "Workflow {} scheduled with cron {}",
                    params.workflow_id, params.cron
                )
            })),
        ),
        Err(e) => (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() }))),
    }
}

/// `POST /schedule/stop/:workflow_id` — remove a cron trigger.
pub async fn stop(
    Path(workflow_id): Path<String>,
    State(state): State<AppState>,
) -> (StatusCode, Json<Value>) {
    match state.engine.scheduler().remove(&workflow_id) {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "message": format!("Stopped scheduled workflow {workflow_id}") })),
        ),
        Err(e @ ScheduleError::NotFound(_)) => {
            (StatusCode::NOT_FOUND, Json(json!({ "error": e.to_string() })))
        }
        Err(e) => (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() }))),
    }
}

/// `GET /schedule/list` — all active cron triggers with their next fire time.
pub async fn list(State(state): State<AppState>) -> Json<Value> {
    let jobs = state.engine.scheduler().list();
    Json(json!({ "count": jobs.len(), "scheduled_workflows": jobs }))
}
