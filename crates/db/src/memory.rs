//! In-memory persistence, selected by `FORCE_IN_MEMORY_DB` and used
//! throughout the test suite.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::models::{execution_status, ExecutionRecord, NewExecution, UserProfile};
use crate::{DbError, Persistence};

#[derive(Default)]
pub struct InMemoryDb {
    executions: Mutex<Vec<ExecutionRecord>>,
    counters: Mutex<HashMap<String, i64>>,
}

impl InMemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored records, oldest first. Test-facing.
    pub fn executions(&self) -> Vec<ExecutionRecord> {
        self.executions.lock().unwrap().clone()
    }
}

#[async_trait]
impl Persistence for InMemoryDb {
    async fn save_execution(&self, record: NewExecution<'_>) -> Result<Uuid, DbError> {
        let id = Uuid::new_v4();
        let status = execution_status(&record.result).to_owned();
        self.executions.lock().unwrap().push(ExecutionRecord {
            id,
            user_id: record.user_id.to_owned(),
            workflow_id: record.workflow_id.map(str::to_owned),
            definition: record.definition,
            result: record.result,
            status,
            executed_at: Utc::now(),
        });
        Ok(id)
    }

    async fn increment_execution_count(&self, user_id: &str) -> Result<(), DbError> {
        *self.counters.lock().unwrap().entry(user_id.to_owned()).or_insert(0) += 1;
        Ok(())
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<UserProfile>, DbError> {
        Ok(self.counters.lock().unwrap().get(user_id).map(|&count| UserProfile {
            user_id: user_id.to_owned(),
            execution_count: count,
        }))
    }
}
