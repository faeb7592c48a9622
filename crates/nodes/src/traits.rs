//! The `NodeExecutor` trait — the contract every node kind fulfils.

use async_trait::async_trait;
use credentials::{CredentialBroker, ServiceKey};
use serde_json::Value;

use crate::NodeResult;

/// Everything an executor sees for one node invocation.
pub struct NodeContext<'a> {
    /// Id of the node being executed.
    pub node_id: &'a str,
    /// The node's kind-specific configuration object.
    pub config: &'a Value,
    /// Immediate predecessors, in the engine's stable iteration order.
    pub predecessors: &'a [(String, NodeResult)],
    /// Present when the run was started with a user id.
    pub broker: Option<&'a CredentialBroker>,
}

impl NodeContext<'_> {
    /// String config value, trimmed; `None` when absent or not a string.
    pub fn config_str(&self, key: &str) -> Option<&str> {
        self.config.get(key).and_then(Value::as_str).map(str::trim)
    }

    /// String config value with a default for absent/empty entries.
    pub fn config_str_or<'v>(&'v self, key: &str, default: &'v str) -> &'v str {
        match self.config_str(key) {
            Some(value) if !value.is_empty() => value,
            _ => default,
        }
    }

    /// Resolve a service credential: broker chain when a user is attached,
    /// plain environment fallback otherwise.
    pub async fn credential(&self, key: ServiceKey) -> String {
        match self.broker {
            Some(broker) => broker.resolve(key).await,
            None => std::env::var(key.env_var()).unwrap_or_default(),
        }
    }
}

/// The core node trait. One implementation per node kind (or family).
///
/// Executors never return `Err` to the engine — failures are folded into
/// [`NodeResult::Error`] so downstream nodes can observe them.
#[async_trait]
pub trait NodeExecutor: Send + Sync {
    async fn execute(&self, ctx: &NodeContext<'_>) -> NodeResult;
}
