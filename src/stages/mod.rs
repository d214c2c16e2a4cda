//! Stage functions: the units of work the executor drives.
//!
//! A stage takes the whole [`WorkflowState`] by value and returns the next
//! state. Stages are **total**: they never return an error. A failed tool
//! call or unmet precondition becomes a business error recorded in
//! `state.error` together with the `current_step` marker of the stage that
//! can fix it; routing then sends the run through the error handler instead
//! of dead-ending.
//!
//! Stages are stateless unit structs. Everything they need beyond the state
//! arrives through [`StageContext`].

mod interview;
mod job;
mod orchestration;
mod resume;

pub use interview::{
    AdvanceQuestion, AwaitInput, CheckProgress, ConductQuestion, FinalizeInterview,
    GenerateQuestions, InitializeSession,
};
pub use job::{AnalyzeMatch, NoResults, SearchJobs, SelectJob};
pub use orchestration::{Complete, ErrorHandler};
pub use resume::{AnalyzeResume, ParseResume, ValidateResume};

use std::sync::Arc;

use async_trait::async_trait;

use crate::state::WorkflowState;
use crate::tools::ToolRegistry;

/// Execution environment handed to every stage invocation.
#[derive(Clone)]
pub struct StageContext {
    /// Workflow thread this invocation belongs to.
    pub thread_id: String,
    /// Executor step counter, for log correlation.
    pub step: u64,
    /// Shared tool gateway.
    pub tools: Arc<ToolRegistry>,
}

impl std::fmt::Debug for StageContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageContext")
            .field("thread_id", &self.thread_id)
            .field("step", &self.step)
            .finish_non_exhaustive()
    }
}

/// A single unit of workflow work.
#[async_trait]
pub trait Stage: Send + Sync {
    /// Transform the state. Total: business failures land in `state.error`,
    /// never in a `Result`.
    async fn run(&self, state: WorkflowState, ctx: &StageContext) -> WorkflowState;
}
