//! `MockExecutor` — a recording test double for `NodeExecutor`.
//!
//! Engine tests register these under real node kinds to observe dispatch
//! order, predecessor wiring, and the no-execution-on-cycle invariant.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::{NodeContext, NodeExecutor, NodeResult};

/// Everything a mock saw for one invocation.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub node_id: String,
    pub config: Value,
    pub predecessors: Vec<(String, NodeResult)>,
}

/// A mock that returns a fixed result and records every call.
pub struct MockExecutor {
    result: NodeResult,
    pub calls: Arc<Mutex<Vec<MockCall>>>,
}

impl MockExecutor {
    pub fn returning(result: NodeResult) -> Self {
        Self { result, calls: Arc::new(Mutex::new(Vec::new())) }
    }

    /// Shorthand for a free-text (AI-style) result.
    pub fn returning_text(text: impl Into<String>) -> Self {
        Self::returning(NodeResult::AiText(text.into()))
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Node ids this mock was invoked for, in order.
    pub fn invoked_nodes(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|c| c.node_id.clone()).collect()
    }
}

#[async_trait]
impl NodeExecutor for MockExecutor {
    async fn execute(&self, ctx: &NodeContext<'_>) -> NodeResult {
        self.calls.lock().unwrap().push(MockCall {
            node_id: ctx.node_id.to_owned(),
            config: ctx.config.clone(),
            predecessors: ctx.predecessors.to_vec(),
        });
        self.result.clone()
    }
}
