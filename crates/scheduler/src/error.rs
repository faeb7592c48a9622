//! Scheduler error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScheduleError {
    /// The cron expression could not be parsed.
    #[error("invalid cron expression: {0}")]
    InvalidExpression(String),

    /// No job registered under the given workflow id.
    #[error("no scheduled job found with ID: {0}")]
    NotFound(String),
}
