//! Orchestration stages: error surfacing and run completion.

use async_trait::async_trait;
use tracing::warn;

use crate::state::{Step, WorkflowState};

use super::{Stage, StageContext};

/// Surface a business error to the user and clear the error slot.
///
/// The `current_step` re-entry marker set by the failing stage is left
/// untouched so a resumed run re-enters the stage that can fix the
/// precondition.
pub struct ErrorHandler;

#[async_trait]
impl Stage for ErrorHandler {
    async fn run(&self, mut state: WorkflowState, _ctx: &StageContext) -> WorkflowState {
        if let Some(error) = state.error.take() {
            warn!(%error, "workflow error surfaced");
            state.notify(format!("Something went wrong: {error}"));
            state.last_error = Some(error);
            state.error_surfaced = true;
        }
        state
    }
}

/// Terminal stage: stamp the run complete.
///
/// When this run surfaced an error, the failing stage's re-entry marker is
/// preserved instead of being overwritten with `complete`, so resumption
/// lands back in the fixable stage. The `error_surfaced` flag is consumed
/// here; an error from an earlier run never blocks a clean completion.
pub struct Complete;

#[async_trait]
impl Stage for Complete {
    async fn run(&self, mut state: WorkflowState, _ctx: &StageContext) -> WorkflowState {
        let surfaced = std::mem::take(&mut state.error_surfaced);
        if !surfaced || !state.current_step.is_reentry_marker() {
            state.current_step = Step::Complete;
            state.notify("Workflow complete.");
        }
        state
    }
}
