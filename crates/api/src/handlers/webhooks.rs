//! Webhook registration and triggering.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use engine::Workflow;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::AppState;

#[derive(Deserialize)]
pub struct WebhookTrigger {
    #[serde(default)]
    pub payload: Value,
    #[serde(default)]
    pub source: Option<String>,
}

/// `POST /webhook/register/:workflow_id` — store a workflow for triggering.
pub async fn register(
    Path(workflow_id): Path<String>,
    State(state): State<AppState>,
    Json(workflow): Json<Workflow>,
) -> (StatusCode, Json<Value>) {
    state.engine.store().register(&workflow_id, workflow);
    info!(workflow_id = %workflow_id, "webhook workflow registered");
    (
        StatusCode::OK,
        Json(json!({
            "message": format!("Workflow {workflow_id} registered for webhook triggers"),
            "webhook_url": format!("/webhook/trigger/{workflow_id}"),
        })),
    )
}

/// `POST /webhook/trigger/:workflow_id` — inject the payload into every
/// webhook node and run the stored workflow.
pub async fn trigger(
    Path(workflow_id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<WebhookTrigger>,
) -> (StatusCode, Json<Value>) {
    let Some(mut workflow) = state.engine.store().get(&workflow_id) else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("No workflow registered under '{workflow_id}'") })),
        );
    };

    workflow.inject_webhook_payload(&body.payload, body.source.as_deref());

    match state.engine.run(&workflow, None).await {
        Ok(results) => (
            StatusCode::OK,
            Json(json!({
                "message": format!("Workflow {workflow_id} triggered"),
                "result": results,
            })),
        ),
        Err(e) => (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() }))),
    }
}

/// `GET /webhook/list` — ids of all registered workflows.
pub async fn list(State(state): State<AppState>) -> Json<Value> {
    let workflows = state.engine.store().list();
    Json(json!({ "count": workflows.len(), "workflows": workflows }))
}
