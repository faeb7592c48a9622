//! Core domain models: nodes, edges, and the workflow graph.
//!
//! These types are the wire format of the HTTP surface and the snapshot
//! format of execution history. `kind`/`config` accept the legacy
//! `type`/`data` field names.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single step in the workflow graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier within this workflow (referenced by edges).
    pub id: String,
    /// Discriminator over the closed executor set.
    #[serde(alias = "type")]
    pub kind: String,
    /// Kind-specific configuration.
    #[serde(default, alias = "data")]
    pub config: Value,
    /// Editor placement; opaque to the core.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Value>,
}

/// Directed edge: `target` may use `source`'s result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub source: String,
    pub target: String,
}

/// A workflow submitted for execution: an unordered node set plus edges
/// that must form a DAG.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl Workflow {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    /// Snapshot for history rows.
    pub fn to_snapshot(&self) -> Value {
        serde_json::json!({ "nodes": self.nodes, "edges": self.edges })
    }

    /// Inject a trigger payload into every webhook node's config.
    pub fn inject_webhook_payload(&mut self, payload: &Value, source: Option<&str>) {
        for node in self.nodes.iter_mut().filter(|n| n.kind == "webhook") {
            if !node.config.is_object() {
                node.config = serde_json::json!({});
            }
            if let Some(config) = node.config.as_object_mut() {
                config.insert("webhook_payload".into(), payload.clone());
                config.insert(
                    "webhook_source".into(),
                    source.map(Into::into).unwrap_or(Value::Null),
                );
            }
        }
    }
}
