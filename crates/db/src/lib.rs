//! `db` crate — execution history and per-user counters.
//!
//! The engine writes through the [`Persistence`] trait and never reads its
//! own history. Two implementations: the in-memory store (tests,
//! `FORCE_IN_MEMORY_DB=1`) and a SQLite store.

pub mod error;
pub mod memory;
pub mod models;
pub mod sqlite;

use async_trait::async_trait;

pub use error::DbError;
pub use memory::InMemoryDb;
pub use models::{execution_status, ExecutionRecord, NewExecution, UserProfile};
pub use sqlite::SqliteDb;

/// Write access to execution history and user statistics.
#[async_trait]
pub trait Persistence: Send + Sync {
    /// Append one execution record.
    async fn save_execution(&self, record: NewExecution<'_>) -> Result<uuid::Uuid, DbError>;

    /// Bump the user's lifetime execution counter.
    async fn increment_execution_count(&self, user_id: &str) -> Result<(), DbError>;

    /// Read a user's profile; `None` for unknown users.
    async fn get_user(&self, user_id: &str) -> Result<Option<UserProfile>, DbError>;
}
