//! Pure serde shapes shared by durable checkpoint backends.
//!
//! Conversion only, no I/O: backends serialize through these shapes so the
//! on-disk format stays stable even if the runtime types grow fields.

use chrono::{DateTime, Utc};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Checkpoint;
use crate::routing::StageId;
use crate::state::WorkflowState;

/// Durable form of one [`Checkpoint`].
///
/// The state is embedded as a JSON value and the stage as its encoded
/// string, matching the column layout of the SQLite backend.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersistedCheckpoint {
    pub thread_id: String,
    pub step: u64,
    pub state: serde_json::Value,
    pub next_stage: String,
    /// RFC 3339 timestamp.
    pub created_at: String,
}

/// Conversion failure when rehydrating a persisted snapshot.
#[derive(Debug, Error, Diagnostic)]
pub enum PersistenceError {
    #[error("persisted state does not deserialize: {0}")]
    #[diagnostic(code(jobflow::persistence::state))]
    State(#[from] serde_json::Error),

    #[error("unknown persisted stage id: {0}")]
    #[diagnostic(
        code(jobflow::persistence::stage),
        help("The snapshot was written by an incompatible version.")
    )]
    UnknownStage(String),
}

impl TryFrom<&Checkpoint> for PersistedCheckpoint {
    type Error = PersistenceError;

    fn try_from(checkpoint: &Checkpoint) -> Result<Self, Self::Error> {
        Ok(Self {
            thread_id: checkpoint.thread_id.clone(),
            step: checkpoint.step,
            state: serde_json::to_value(&checkpoint.state)?,
            next_stage: checkpoint.next_stage.encode().to_string(),
            created_at: checkpoint.created_at.to_rfc3339(),
        })
    }
}

impl TryFrom<PersistedCheckpoint> for Checkpoint {
    type Error = PersistenceError;

    fn try_from(persisted: PersistedCheckpoint) -> Result<Self, Self::Error> {
        let state: WorkflowState = serde_json::from_value(persisted.state)?;
        let next_stage = StageId::decode(&persisted.next_stage)
            .ok_or(PersistenceError::UnknownStage(persisted.next_stage))?;
        let created_at = DateTime::parse_from_rfc3339(&persisted.created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());
        Ok(Self {
            thread_id: persisted.thread_id,
            step: persisted.step,
            state,
            next_stage,
            created_at,
        })
    }
}
