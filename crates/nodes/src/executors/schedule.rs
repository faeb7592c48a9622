//! Schedule node executor.
//!
//! Registration happens in the engine's pre-pass; execution itself only
//! acknowledges the configured expression.

use async_trait::async_trait;

use crate::{NodeContext, NodeExecutor, NodeResult};

pub const DEFAULT_CRON: &str = "*/1 * * * *";

pub struct ScheduleExecutor;

#[async_trait]
impl NodeExecutor for ScheduleExecutor {
    async fn execute(&self, ctx: &NodeContext<'_>) -> NodeResult {
        let cron = ctx.config_str_or("cron", DEFAULT_CRON);
        NodeResult::Notification(format!("Schedule set: {cron}"))
    }
}
