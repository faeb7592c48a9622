//! Persistence models. Domain types live in the `engine` crate; rows here
//! carry JSON snapshots so the history survives schema drift in the domain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Input for one history append.
#[derive(Debug, Clone)]
pub struct NewExecution<'a> {
    pub user_id: &'a str,
    pub workflow_id: Option<&'a str>,
    /// Snapshot of the executed nodes and edges.
    pub definition: serde_json::Value,
    /// The engine's result map (or `{"error": …}` for graph failures).
    pub result: serde_json::Value,
}

/// A stored execution history row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub id: Uuid,
    pub user_id: String,
    pub workflow_id: Option<String>,
    pub definition: serde_json::Value,
    pub result: serde_json::Value,
    pub status: String,
    pub executed_at: DateTime<Utc>,
}

/// A user profile as the core sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub execution_count: i64,
}

/// `success` unless the result map carries a top-level `error` key.
pub fn execution_status(result: &serde_json::Value) -> &'static str {
    if result.get("error").is_some() {
        "failed"
    } else {
        "success"
    }
}
