//! The execution engine.
//!
//! `run` drives one workflow execution end to end: pre-pass registrations,
//! graph validation, sequential dispatch in topological order, and
//! best-effort history recording. Executor failures never abort the run —
//! they land in the result map as `Error:` strings.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use credentials::{CredentialBroker, CredentialStore};
use db::{NewExecution, Persistence};
use nodes::{NodeContext, NodeRegistry, NodeResult};
use scheduler::{Scheduler, WorkflowRunner};
use tracing::{error, info, instrument, warn};

use crate::dag::validate_dag;
use crate::{EngineError, Workflow, WorkflowStore};

/// The engine's return value: one wire string per node id.
pub type ResultMap = BTreeMap<String, String>;

pub struct WorkflowEngine {
    registry: NodeRegistry,
    store: Arc<WorkflowStore>,
    scheduler: Arc<Scheduler>,
    persistence: Arc<dyn Persistence>,
    credentials: Arc<dyn CredentialStore>,
}

impl WorkflowEngine {
    pub fn new(
        registry: NodeRegistry,
        store: Arc<WorkflowStore>,
        scheduler: Arc<Scheduler>,
        persistence: Arc<dyn Persistence>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        Self { registry, store, scheduler, persistence, credentials }
    }

    pub fn store(&self) -> &Arc<WorkflowStore> {
        &self.store
    }

    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }

    /// Execute a workflow. Returns the per-node result map, or a graph
    /// error before any executor has been invoked.
    #[instrument(skip(self, workflow), fields(nodes = workflow.nodes.len()))]
    pub async fn run(
        &self,
        workflow: &Workflow,
        user_id: Option<&str>,
    ) -> Result<ResultMap, EngineError> {
        // ------------------------------------------------------------------
        // Pre-pass: webhook auto-registration and schedule registration.
        // Kept even when validation rejects the graph afterwards.
        // ------------------------------------------------------------------
        self.pre_pass(workflow);

        // ------------------------------------------------------------------
        // Validate and order.
        // ------------------------------------------------------------------
        let order = match validate_dag(workflow) {
            Ok(order) => order,
            Err(e) => {
                error!("graph rejected: {e}");
                self.record(workflow, user_id, &serde_json::json!({ "error": e.to_string() }))
                    .await;
                return Err(e);
            }
        };
        info!("executing {} nodes in order: {:?}", order.len(), order);

        // ------------------------------------------------------------------
        // Per-run credential broker.
        // ------------------------------------------------------------------
        let broker = user_id.map(|id| CredentialBroker::new(self.credentials.clone(), id));

        // ------------------------------------------------------------------
        // Execute sequentially in topological order.
        // ------------------------------------------------------------------
        let node_map: HashMap<&str, &crate::Node> =
            workflow.nodes.iter().map(|n| (n.id.as_str(), n)).collect();

        let mut state: HashMap<String, NodeResult> = HashMap::with_capacity(order.len());
        for node_id in &order {
            let node = node_map[node_id.as_str()];
            let predecessors = predecessor_results(workflow, node_id, &state);

            let result = match self.registry.get(&node.kind) {
                Ok(executor) => {
                    let ctx = NodeContext {
                        node_id,
                        config: &node.config,
                        predecessors: &predecessors,
                        broker: broker.as_ref(),
                    };
                    executor.execute(&ctx).await
                }
                Err(unknown) => {
                    warn!(node_id = %node_id, kind = %node.kind, "unknown node kind");
                    NodeResult::Notification(format!("{} node not implemented", unknown.0))
                }
            };

            info!(node_id = %node_id, result = %result.to_wire(), "node finished");
            state.insert(node_id.clone(), result);
        }

        let results: ResultMap =
            state.into_iter().map(|(id, result)| (id, result.to_wire())).collect();

        // ------------------------------------------------------------------
        // Record history and bump the user counter. Best-effort.
        // ------------------------------------------------------------------
        let result_value = serde_json::to_value(&results).unwrap_or_default();
        self.record(workflow, user_id, &result_value).await;

        Ok(results)
    }

    /// Register webhook workflows (keyed by the webhook node's id) and
    /// schedule-node cron jobs (keyed `scheduled_<node_id>`).
    fn pre_pass(&self, workflow: &Workflow) {
        for node in &workflow.nodes {
            match node.kind.as_str() {
                "webhook" => {
                    self.store.register(&node.id, workflow.clone());
                }
                "schedule" => {
                    let key = format!("scheduled_{}", node.id);
                    self.store.register(&key, workflow.clone());

                    let cron = node
                        .config
                        .get("cron")
                        .and_then(serde_json::Value::as_str)
                        .unwrap_or("*/1 * * * *");
                    if let Err(e) = self.scheduler.add(&key, cron) {
                        warn!(node_id = %node.id, "schedule registration failed: {e}");
                    }
                }
                _ => {}
            }
        }
    }

    async fn record(&self, workflow: &Workflow, user_id: Option<&str>, result: &serde_json::Value) {
        let user = user_id.unwrap_or("");
        let record = NewExecution {
            user_id: user,
            workflow_id: None,
            definition: workflow.to_snapshot(),
            result: result.clone(),
        };
        if let Err(e) = self.persistence.save_execution(record).await {
            warn!("failed to record execution history: {e}");
        }
        if let Some(user_id) = user_id {
            if let Err(e) = self.persistence.increment_execution_count(user_id).await {
                warn!(user_id, "failed to increment execution counter: {e}");
            }
        }
    }
}

/// Immediate predecessors of `node_id` with their results, deduplicated and
/// in edge-declaration order — the stable order the adapter contracts on.
fn predecessor_results(
    workflow: &Workflow,
    node_id: &str,
    state: &HashMap<String, NodeResult>,
) -> Vec<(String, NodeResult)> {
    let mut seen = std::collections::HashSet::new();
    workflow
        .edges
        .iter()
        .filter(|edge| edge.target == node_id)
        .filter(|edge| seen.insert(edge.source.clone()))
        .filter_map(|edge| {
            state.get(&edge.source).map(|result| (edge.source.clone(), result.clone()))
        })
        .collect()
}

/// Scheduler-facing runner over the engine and the workflow store.
pub struct StoredWorkflowRunner {
    engine: Arc<WorkflowEngine>,
}

impl StoredWorkflowRunner {
    pub fn new(engine: Arc<WorkflowEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl WorkflowRunner for StoredWorkflowRunner {
    async fn run_scheduled(&self, workflow_id: &str) {
        let Some(workflow) = self.engine.store().get(workflow_id) else {
            warn!(workflow_id, "scheduled fire for an unknown stored workflow");
            return;
        };
        match self.engine.run(&workflow, None).await {
            Ok(results) => info!(workflow_id, nodes = results.len(), "scheduled run finished"),
            Err(e) => error!(workflow_id, "scheduled run failed: {e}"),
        }
    }
}
