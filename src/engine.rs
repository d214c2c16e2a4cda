//! The workflow executor: drives the transition table over a thread's state.
//!
//! One executor owns many workflow threads. A drive loop runs
//! validate → stage → route → checkpoint until routing reaches the virtual
//! `End` stage (completed) or the await-input stage (suspended for a human
//! answer). Suspension is ordinary state: the latest checkpoint carries
//! everything needed, so a process restart between suspension and
//! resumption is invisible to the caller.

use std::mem;
use std::sync::Arc;

use miette::Diagnostic;
use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::checkpoint::{Checkpoint, Checkpointer, CheckpointerError};
use crate::config::RuntimeConfig;
use crate::routing::{StageId, TransitionTable, route_entry};
use crate::stages::StageContext;
use crate::state::{StateInvalidError, StatePatch, WorkflowState, validate};
use crate::tools::ToolRegistry;

/// Why a drive loop returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStatus {
    /// Routing reached `End`; the thread is finished (until re-entered).
    Completed,
    /// The run is parked awaiting a candidate answer; resume with
    /// [`StatePatch::answer`].
    Suspended,
}

/// Result of one drive: where the thread stopped and with what state.
#[derive(Clone, Debug)]
pub struct RunReport {
    pub thread_id: String,
    pub status: RunStatus,
    /// Step counter after the drive.
    pub step: u64,
    pub state: WorkflowState,
}

/// Executor failure. Business errors never surface here; they live in
/// `state.error` and route through the error handler.
#[derive(Debug, Error, Diagnostic)]
pub enum EngineError {
    #[error("unknown workflow thread: {thread_id}")]
    #[diagnostic(
        code(jobflow::engine::unknown_thread),
        help("Threads exist once started; check the id or the checkpoint store.")
    )]
    UnknownThread { thread_id: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Invalid(#[from] StateInvalidError),

    #[error(transparent)]
    #[diagnostic(code(jobflow::engine::checkpointer))]
    Checkpointer(#[from] CheckpointerError),

    #[error("no transition registered for stage {id}")]
    #[diagnostic(
        code(jobflow::engine::missing_stage),
        help("The transition table must cover every stage routing can name.")
    )]
    MissingStage { id: StageId },

    #[error("step budget of {limit} exhausted without reaching a terminal stage")]
    #[diagnostic(
        code(jobflow::engine::step_limit),
        help("A routing cycle is not making progress; inspect the checkpoint history.")
    )]
    StepLimitExceeded { limit: u64 },
}

struct ThreadSession {
    state: WorkflowState,
    next_stage: StageId,
    step: u64,
}

/// Drives workflow threads over a [`TransitionTable`].
///
/// `&mut self` on the entry points serializes execution per engine; one
/// thread is never driven concurrently with itself.
pub struct WorkflowEngine {
    table: TransitionTable,
    tools: Arc<ToolRegistry>,
    checkpointer: Arc<dyn Checkpointer>,
    config: RuntimeConfig,
    sessions: FxHashMap<String, ThreadSession>,
}

impl std::fmt::Debug for WorkflowEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowEngine")
            .field("sessions", &self.sessions.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl WorkflowEngine {
    #[must_use]
    pub fn new(
        table: TransitionTable,
        tools: Arc<ToolRegistry>,
        checkpointer: Arc<dyn Checkpointer>,
        config: RuntimeConfig,
    ) -> Self {
        Self {
            table,
            tools,
            checkpointer,
            config,
            sessions: FxHashMap::default(),
        }
    }

    /// The standard wiring with the given tools and checkpoint store.
    #[must_use]
    pub fn standard(tools: Arc<ToolRegistry>, checkpointer: Arc<dyn Checkpointer>) -> Self {
        Self::new(
            TransitionTable::standard(),
            tools,
            checkpointer,
            RuntimeConfig::default(),
        )
    }

    /// Start a fresh thread from `initial` and drive it until it completes
    /// or suspends.
    #[instrument(skip(self, initial), err)]
    pub async fn start(&mut self, initial: WorkflowState) -> Result<RunReport, EngineError> {
        let thread_id = Uuid::new_v4().to_string();
        info!(%thread_id, "starting workflow thread");
        let session = ThreadSession {
            next_stage: route_entry(&initial),
            state: initial,
            step: 0,
        };
        self.sessions.insert(thread_id.clone(), session);
        self.drive(&thread_id).await
    }

    /// Resume a thread: apply the caller's patch and drive on.
    ///
    /// Threads absent from memory are restored from their latest
    /// checkpoint, so resumption works across process restarts. A thread
    /// whose stored next stage is `End` re-enters via the entry routing
    /// after the patch, which is how a finished phase hands over to the
    /// next one.
    #[instrument(skip(self, patch), err)]
    pub async fn resume(
        &mut self,
        thread_id: &str,
        patch: StatePatch,
    ) -> Result<RunReport, EngineError> {
        if !self.sessions.contains_key(thread_id) {
            self.restore(thread_id).await?;
        }
        let session = self
            .sessions
            .get_mut(thread_id)
            .ok_or_else(|| EngineError::UnknownThread {
                thread_id: thread_id.to_string(),
            })?;

        patch.apply(&mut session.state);
        if session.next_stage == StageId::End {
            session.next_stage = route_entry(&session.state);
        }
        info!(%thread_id, next = %session.next_stage, "resuming workflow thread");
        self.drive(thread_id).await
    }

    /// Human-readable snapshot of where a thread stands.
    pub async fn status(&mut self, thread_id: &str) -> Result<String, EngineError> {
        if !self.sessions.contains_key(thread_id) {
            self.restore(thread_id).await?;
        }
        let session = self
            .sessions
            .get(thread_id)
            .ok_or_else(|| EngineError::UnknownThread {
                thread_id: thread_id.to_string(),
            })?;

        let state = &session.state;
        let mut lines = vec![
            format!("Thread {thread_id} at step {}", session.step),
            format!("Current step: {}", state.current_step),
        ];
        if let Some(resume) = &state.resume_data {
            lines.push(format!("Resume: {}", resume.name));
        }
        if let Some(jobs) = &state.job_results {
            lines.push(format!("Jobs found: {}", jobs.len()));
        }
        if let Some(job) = &state.selected_job {
            lines.push(format!("Selected job: {} at {}", job.title, job.company));
        }
        if let Some(session) = &state.interview_session {
            lines.push(format!(
                "Interview: {}/{} answered ({:.0}%)",
                session.responses.len(),
                session.questions.len(),
                session.progress_percentage()
            ));
        }
        if let Some(error) = &state.last_error {
            lines.push(format!("Last error: {error}"));
        }
        Ok(lines.join("\n"))
    }

    /// Threads known to the checkpoint store.
    pub async fn list_threads(&self) -> Result<Vec<String>, EngineError> {
        Ok(self.checkpointer.list_threads().await?)
    }

    async fn restore(&mut self, thread_id: &str) -> Result<(), EngineError> {
        let Some(checkpoint) = self.checkpointer.load_latest(thread_id).await? else {
            return Ok(());
        };
        debug!(%thread_id, step = checkpoint.step, "restored thread from checkpoint");
        self.sessions.insert(
            thread_id.to_string(),
            ThreadSession {
                state: checkpoint.state,
                next_stage: checkpoint.next_stage,
                step: checkpoint.step,
            },
        );
        Ok(())
    }

    /// The interpreter loop.
    ///
    /// Checkpoints are written after a stage completes, and only then; the
    /// snapshot records the *routed* next stage, so replaying from it never
    /// re-runs the completed stage.
    async fn drive(&mut self, thread_id: &str) -> Result<RunReport, EngineError> {
        let limit = self.config.max_steps_per_run;
        let start_step = self
            .sessions
            .get(thread_id)
            .map(|s| s.step)
            .unwrap_or_default();

        loop {
            let session = self
                .sessions
                .get_mut(thread_id)
                .ok_or_else(|| EngineError::UnknownThread {
                    thread_id: thread_id.to_string(),
                })?;

            if session.next_stage == StageId::End {
                info!(%thread_id, step = session.step, "workflow thread complete");
                return Ok(RunReport {
                    thread_id: thread_id.to_string(),
                    status: RunStatus::Completed,
                    step: session.step,
                    state: session.state.clone(),
                });
            }
            if session.step - start_step >= limit {
                return Err(EngineError::StepLimitExceeded { limit });
            }

            validate(&session.state)?;

            let id = session.next_stage;
            let transition = self
                .table
                .get(id)
                .ok_or(EngineError::MissingStage { id })?
                .clone();
            session.step += 1;
            let step = session.step;
            debug!(%thread_id, stage = %id, step, "executing stage");

            let ctx = StageContext {
                thread_id: thread_id.to_string(),
                step,
                tools: Arc::clone(&self.tools),
            };
            let state = mem::take(&mut session.state);
            let new_state = transition.stage.run(state, &ctx).await;
            let routed = (transition.route)(&new_state);
            debug!(%thread_id, stage = %id, next = %routed, "stage routed");

            session.state = new_state;
            session.next_stage = routed;

            self.checkpointer
                .save(Checkpoint::new(
                    thread_id,
                    step,
                    session.state.clone(),
                    routed,
                ))
                .await?;

            if routed == StageId::AwaitInput {
                info!(%thread_id, step, "workflow thread suspended awaiting input");
                return Ok(RunReport {
                    thread_id: thread_id.to_string(),
                    status: RunStatus::Suspended,
                    step,
                    state: session.state.clone(),
                });
            }
        }
    }
}
