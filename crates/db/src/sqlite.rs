//! SQLite persistence.
//!
//! Schema is created on connect; JSON payloads are stored as TEXT and
//! timestamps as RFC 3339 strings.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use tracing::info;
use uuid::Uuid;

use crate::models::{execution_status, NewExecution, UserProfile};
use crate::{DbError, Persistence};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS workflow_executions (
    id          TEXT PRIMARY KEY,
    user_id     TEXT NOT NULL,
    workflow_id TEXT,
    definition  TEXT NOT NULL,
    result      TEXT NOT NULL,
    status      TEXT NOT NULL,
    executed_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS user_stats (
    user_id         TEXT PRIMARY KEY,
    execution_count INTEGER NOT NULL DEFAULT 0
);
"#;

pub struct SqliteDb {
    pool: SqlitePool,
}

impl SqliteDb {
    /// Connect and ensure the schema exists. `database_url` is a sqlx
    /// SQLite URL (`sqlite://autoflow.db?mode=rwc` or `sqlite::memory:`).
    pub async fn connect(database_url: &str) -> Result<Self, DbError> {
        info!("connecting to sqlite at {database_url}");
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        for statement in SCHEMA.split(';').filter(|s| !s.trim().is_empty()) {
            sqlx::query(statement).execute(&pool).await?;
        }
        Ok(Self { pool })
    }
}

#[async_trait]
impl Persistence for SqliteDb {
    async fn save_execution(&self, record: NewExecution<'_>) -> Result<Uuid, DbError> {
        let id = Uuid::new_v4();
        let status = execution_status(&record.result);
        sqlx::query(
            "INSERT INTO workflow_executions \
             (id, user_id, workflow_id, definition, result, status, executed_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(id.to_string())
        .bind(record.user_id)
        .bind(record.workflow_id)
        .bind(serde_json::to_string(&record.definition)?)
        .bind(serde_json::to_string(&record.result)?)
        .bind(status)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    async fn increment_execution_count(&self, user_id: &str) -> Result<(), DbError> {
        sqlx::query(
            "INSERT INTO user_stats (user_id, execution_count) VALUES (?1, 1) \
             ON CONFLICT(user_id) DO UPDATE SET execution_count = execution_count + 1",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<UserProfile>, DbError> {
        let row = sqlx::query("SELECT execution_count FROM user_stats WHERE user_id = ?1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| UserProfile {
            user_id: user_id.to_owned(),
            execution_count: row.get::<i64, _>("execution_count"),
        }))
    }
}
