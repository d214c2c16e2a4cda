//! SQLite-backed checkpoint store.
//!
//! Durable I/O only; pure serialization lives in
//! [`super::persistence`]. Schema:
//!
//! - `threads.id` ← `checkpoint.thread_id`, `threads.last_step` denormalizes
//!   the highest saved step for cheap `load_latest`.
//! - `snapshots(thread_id, step)` is the primary key; `INSERT OR REPLACE`
//!   makes re-saving the same step idempotent.
//!
//! With the default `sqlite-migrations` feature the embedded migrations
//! (`sqlx::migrate!("./migrations")`) run on connect; without it the schema
//! is assumed to be applied externally.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};
use tracing::instrument;

use super::persistence::PersistedCheckpoint;
use super::{Checkpoint, Checkpointer, CheckpointerError, Result};
use crate::routing::StageId;
use crate::state::WorkflowState;

/// Durable checkpointer with full per-thread step history.
pub struct SqliteCheckpointer {
    pool: Arc<SqlitePool>,
}

impl std::fmt::Debug for SqliteCheckpointer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteCheckpointer").finish()
    }
}

fn backend(context: &str) -> impl Fn(sqlx::Error) -> CheckpointerError + '_ {
    move |e| CheckpointerError::Backend {
        message: format!("{context}: {e}"),
    }
}

impl SqliteCheckpointer {
    /// Connect (or create) a SQLite database at `database_url`.
    /// Example URL: `sqlite://jobflow.db`.
    #[must_use = "checkpointer must be used to persist state"]
    #[instrument(skip(database_url))]
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .map_err(backend("connect"))?;
        #[cfg(feature = "sqlite-migrations")]
        {
            if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
                return Err(CheckpointerError::Backend {
                    message: format!("migration failure: {e}"),
                });
            }
        }
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    fn row_to_checkpoint(row: &SqliteRow) -> Result<Checkpoint> {
        let thread_id: String = row.get("thread_id");
        let step: i64 = row.get("step");
        let state_json: String = row.get("state_json");
        let next_stage: String = row.get("next_stage");
        let created_at_str: String = row.get("created_at");

        let state: WorkflowState =
            serde_json::from_str(&state_json).map_err(|e| CheckpointerError::Serde {
                message: format!("state decode: {e}"),
            })?;
        let next_stage = StageId::decode(&next_stage).ok_or_else(|| CheckpointerError::Serde {
            message: format!("unknown stage id: {next_stage}"),
        })?;
        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(Checkpoint {
            thread_id,
            step: step as u64,
            state,
            next_stage,
            created_at,
        })
    }
}

#[async_trait::async_trait]
impl Checkpointer for SqliteCheckpointer {
    #[instrument(skip(self, checkpoint), fields(thread_id = %checkpoint.thread_id, step = checkpoint.step), err)]
    async fn save(&self, checkpoint: Checkpoint) -> Result<()> {
        let persisted =
            PersistedCheckpoint::try_from(&checkpoint).map_err(|e| CheckpointerError::Serde {
                message: e.to_string(),
            })?;
        let state_json =
            serde_json::to_string(&persisted.state).map_err(|e| CheckpointerError::Serde {
                message: format!("state encode: {e}"),
            })?;

        let mut tx = self.pool.begin().await.map_err(backend("tx begin"))?;

        sqlx::query(
            r#"
            INSERT INTO threads (id, last_step, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET
                last_step = MAX(last_step, excluded.last_step),
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&persisted.thread_id)
        .bind(persisted.step as i64)
        .bind(&persisted.created_at)
        .execute(&mut *tx)
        .await
        .map_err(backend("upsert thread"))?;

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO snapshots (
                thread_id, step, state_json, next_stage, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&persisted.thread_id)
        .bind(persisted.step as i64)
        .bind(&state_json)
        .bind(&persisted.next_stage)
        .bind(&persisted.created_at)
        .execute(&mut *tx)
        .await
        .map_err(backend("insert snapshot"))?;

        tx.commit().await.map_err(backend("tx commit"))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn load_latest(&self, thread_id: &str) -> Result<Option<Checkpoint>> {
        let row = sqlx::query(
            r#"
            SELECT thread_id, step, state_json, next_stage, created_at
            FROM snapshots
            WHERE thread_id = ?1
            ORDER BY step DESC
            LIMIT 1
            "#,
        )
        .bind(thread_id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(backend("select latest"))?;

        row.as_ref().map(Self::row_to_checkpoint).transpose()
    }

    #[instrument(skip(self), err)]
    async fn list(&self, thread_id: &str) -> Result<Vec<Checkpoint>> {
        let rows = sqlx::query(
            r#"
            SELECT thread_id, step, state_json, next_stage, created_at
            FROM snapshots
            WHERE thread_id = ?1
            ORDER BY step ASC
            "#,
        )
        .bind(thread_id)
        .fetch_all(&*self.pool)
        .await
        .map_err(backend("select history"))?;

        rows.iter().map(Self::row_to_checkpoint).collect()
    }

    #[instrument(skip(self), err)]
    async fn list_threads(&self) -> Result<Vec<String>> {
        let rows = sqlx::query(
            r#"
            SELECT id FROM threads
            ORDER BY updated_at DESC
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(backend("list threads"))?;

        Ok(rows.into_iter().map(|r| r.get::<String, _>("id")).collect())
    }
}
