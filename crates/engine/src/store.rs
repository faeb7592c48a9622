//! The process-wide workflow store backing webhook and scheduled
//! invocations.
//!
//! Entries live for the process lifetime; re-registering an id replaces the
//! previous definition (latest wins).

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::info;

use crate::Workflow;

#[derive(Default)]
pub struct WorkflowStore {
    workflows: Mutex<HashMap<String, Workflow>>,
}

impl WorkflowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `workflow` under `id`, replacing any previous entry.
    pub fn register(&self, id: &str, workflow: Workflow) {
        let replaced = self
            .workflows
            .lock()
            .unwrap()
            .insert(id.to_owned(), workflow)
            .is_some();
        info!(workflow_id = id, replaced, "registered workflow");
    }

    pub fn get(&self, id: &str) -> Option<Workflow> {
        self.workflows.lock().unwrap().get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.workflows.lock().unwrap().contains_key(id)
    }

    /// Registered ids, sorted for stable listings.
    pub fn list(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.workflows.lock().unwrap().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.workflows.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
