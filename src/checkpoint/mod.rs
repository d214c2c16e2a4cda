//! Durable workflow snapshots.
//!
//! The executor writes a [`Checkpoint`] after every completed stage; a
//! snapshot carries the full state plus the stage the run would execute
//! next, so resumption needs nothing but the latest row. Backends implement
//! [`Checkpointer`]; the in-memory backend lives here, the SQLite backend in
//! [`sqlite`] behind the `sqlite` feature, and the pure serde shapes shared
//! by durable backends in [`persistence`].

pub mod persistence;
#[cfg(feature = "sqlite")]
pub mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use miette::Diagnostic;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::routing::StageId;
use crate::state::WorkflowState;

/// One durable snapshot of a workflow thread.
#[derive(Clone, Debug, PartialEq)]
pub struct Checkpoint {
    pub thread_id: String,
    /// Executor step counter; strictly increasing within a thread.
    pub step: u64,
    pub state: WorkflowState,
    /// Stage the executor would run next (`End` for a finished thread).
    pub next_stage: StageId,
    pub created_at: DateTime<Utc>,
}

impl Checkpoint {
    #[must_use]
    pub fn new(
        thread_id: impl Into<String>,
        step: u64,
        state: WorkflowState,
        next_stage: StageId,
    ) -> Self {
        Self {
            thread_id: thread_id.into(),
            step,
            state,
            next_stage,
            created_at: Utc::now(),
        }
    }
}

/// Checkpoint store failure.
#[derive(Debug, Error, Diagnostic)]
pub enum CheckpointerError {
    #[error("checkpoint backend error: {message}")]
    #[diagnostic(
        code(jobflow::checkpoint::backend),
        help("Check the storage backend (connectivity, schema, permissions).")
    )]
    Backend { message: String },

    #[error("checkpoint serialization error: {message}")]
    #[diagnostic(code(jobflow::checkpoint::serde))]
    Serde { message: String },
}

pub type Result<T> = std::result::Result<T, CheckpointerError>;

/// Durable storage for workflow snapshots.
///
/// Saving the same `(thread_id, step)` twice supersedes the earlier row, so
/// a retried step never duplicates history. `load_latest` for an unknown
/// thread is `Ok(None)`, never an error.
#[async_trait]
pub trait Checkpointer: Send + Sync {
    async fn save(&self, checkpoint: Checkpoint) -> Result<()>;
    async fn load_latest(&self, thread_id: &str) -> Result<Option<Checkpoint>>;
    /// Full history for a thread, ordered by step ascending.
    async fn list(&self, thread_id: &str) -> Result<Vec<Checkpoint>>;
    async fn list_threads(&self) -> Result<Vec<String>>;
}

/// Process-local checkpoint store for tests and ephemeral runs.
#[derive(Default)]
pub struct InMemoryCheckpointer {
    threads: Mutex<FxHashMap<String, Vec<Checkpoint>>>,
}

impl InMemoryCheckpointer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for InMemoryCheckpointer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryCheckpointer")
            .field("threads", &self.threads.lock().len())
            .finish()
    }
}

#[async_trait]
impl Checkpointer for InMemoryCheckpointer {
    async fn save(&self, checkpoint: Checkpoint) -> Result<()> {
        let mut threads = self.threads.lock();
        let history = threads.entry(checkpoint.thread_id.clone()).or_default();
        match history.binary_search_by_key(&checkpoint.step, |c| c.step) {
            Ok(position) => history[position] = checkpoint,
            Err(position) => history.insert(position, checkpoint),
        }
        Ok(())
    }

    async fn load_latest(&self, thread_id: &str) -> Result<Option<Checkpoint>> {
        Ok(self
            .threads
            .lock()
            .get(thread_id)
            .and_then(|history| history.last().cloned()))
    }

    async fn list(&self, thread_id: &str) -> Result<Vec<Checkpoint>> {
        Ok(self
            .threads
            .lock()
            .get(thread_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_threads(&self) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self.threads.lock().keys().cloned().collect();
        ids.sort_unstable();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_thread_loads_none() {
        let store = InMemoryCheckpointer::new();
        assert_eq!(store.load_latest("missing").await.unwrap(), None);
        assert!(store.list("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn same_step_resave_supersedes() {
        let store = InMemoryCheckpointer::new();
        let mut state = WorkflowState::new();
        store
            .save(Checkpoint::new("t", 1, state.clone(), StageId::AnalyzeResume))
            .await
            .unwrap();
        state.messages.push("retried".to_string());
        store
            .save(Checkpoint::new("t", 1, state.clone(), StageId::AnalyzeResume))
            .await
            .unwrap();

        let history = store.list("t").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].state.messages, vec!["retried".to_string()]);
    }

    #[tokio::test]
    async fn latest_is_highest_step() {
        let store = InMemoryCheckpointer::new();
        for step in [2u64, 1, 3] {
            store
                .save(Checkpoint::new("t", step, WorkflowState::new(), StageId::Complete))
                .await
                .unwrap();
        }
        let latest = store.load_latest("t").await.unwrap().unwrap();
        assert_eq!(latest.step, 3);
        let steps: Vec<u64> = store.list("t").await.unwrap().iter().map(|c| c.step).collect();
        assert_eq!(steps, vec![1, 2, 3]);
    }
}
