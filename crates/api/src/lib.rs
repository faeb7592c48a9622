//! `api` crate — HTTP surface for the execution core.
//!
//! Exposes:
//!   POST /run
//!   POST /webhook/register/:workflow_id
//!   POST /webhook/trigger/:workflow_id
//!   GET  /webhook/list
//!   POST /schedule?workflow_id=…&cron=…
//!   POST /schedule/stop/:workflow_id
//!   GET  /schedule/list
//!   GET  /health

pub mod handlers;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use engine::WorkflowEngine;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<WorkflowEngine>,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/run", post(handlers::run::run_workflow))
        .route("/webhook/register/:workflow_id", post(handlers::webhooks::register))
        .route("/webhook/trigger/:workflow_id", post(handlers::webhooks::trigger))
        .route("/webhook/list", get(handlers::webhooks::list))
        .route("/schedule", post(handlers::schedules::add))
        .route("/schedule/stop/:workflow_id", post(handlers::schedules::stop))
        .route("/schedule/list", get(handlers::schedules::list))
        .route("/health", get(handlers::health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(bind: &str, state: AppState) -> Result<(), std::io::Error> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await
}
