//! The shared workflow state and its structural validator.
//!
//! [`WorkflowState`] is the single record threaded through every stage. It is
//! passed by value between stages (never mutated in place by two stages at
//! once) and serialized wholesale into checkpoints. [`Step`] is the closed
//! set of workflow positions; any other value is rejected at the serde
//! boundary.
//!
//! Two failure channels coexist and must not be confused:
//!
//! - [`StateInvalidError`] — structural: the state has the wrong shape for
//!   persistence or execution. Never persisted; surfaced to the caller as a
//!   rejected request.
//! - [`WorkflowState::error`] — business: a tool call failed or a
//!   precondition was unmet. Persisted, flagged to the user, and cleared by
//!   the error-handling stage.

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::interview::InterviewSessionState;
use crate::models::{
    CandidateAnswer, InterviewQuestion, JobListing, JobQuery, MatchAnalysis, ResumeData,
};

/// Canonical "where are we" marker. Closed set; serde rejects unknown values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    #[default]
    ResumeUpload,
    ResumeAnalysis,
    JobSearch,
    JobSelection,
    MatchAnalysis,
    InterviewPrep,
    InterviewActive,
    AwaitingResponse,
    InterviewComplete,
    Complete,
    Error,
}

impl Step {
    /// Stable wire form, matching the serde encoding.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::ResumeUpload => "resume_upload",
            Step::ResumeAnalysis => "resume_analysis",
            Step::JobSearch => "job_search",
            Step::JobSelection => "job_selection",
            Step::MatchAnalysis => "match_analysis",
            Step::InterviewPrep => "interview_prep",
            Step::InterviewActive => "interview_active",
            Step::AwaitingResponse => "awaiting_response",
            Step::InterviewComplete => "interview_complete",
            Step::Complete => "complete",
            Step::Error => "error",
        }
    }

    /// Steps a caller can re-enter after an error was surfaced: they mark the
    /// stage that can fix the unmet precondition.
    #[must_use]
    pub fn is_reentry_marker(&self) -> bool {
        matches!(
            self,
            Step::ResumeUpload
                | Step::JobSearch
                | Step::JobSelection
                | Step::InterviewPrep
                | Step::InterviewActive
        )
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Session policy supplied by the caller.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPreferences {
    /// Questions to generate; clamped to 5..=20, default 10.
    pub question_count: Option<usize>,
    pub interview_type: Option<String>,
    /// Continue straight into job search after resume validation.
    pub auto_job_search: bool,
    /// What to do once a job is selected.
    pub next_action: NextAction,
    /// Continue into question generation after match analysis.
    pub proceed_to_interview: bool,
    /// Index into `job_results` for job selection; clamped to range.
    pub job_index: Option<usize>,
}

/// Post-selection policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextAction {
    #[default]
    Analysis,
    Interview,
}

/// The single mutable record threaded through every stage.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowState {
    /// Raw uploaded resume text; input to the parse stage.
    pub resume_text: Option<String>,
    pub resume_data: Option<ResumeData>,
    pub job_query: Option<JobQuery>,
    /// `None` = not searched yet; `Some(vec![])` = searched, no results.
    /// The two are distinct and route differently.
    pub job_results: Option<Vec<JobListing>>,
    pub selected_job: Option<JobListing>,
    pub match_analysis: Option<MatchAnalysis>,
    pub interview_questions: Vec<InterviewQuestion>,
    pub interview_session: Option<InterviewSessionState>,
    /// Candidate answer supplied while suspended at `awaiting_response`;
    /// consumed (cleared) by the conduct stage.
    pub pending_answer: Option<CandidateAnswer>,
    pub current_step: Step,
    /// Business error: persisted, user-visible, cleared by the error handler.
    pub error: Option<String>,
    /// Most recently surfaced error, kept for `status` after `error` clears.
    pub last_error: Option<String>,
    /// Set by the error handler when an error surfaces, consumed by the
    /// completion stage; distinguishes "failed this run" from the historical
    /// `last_error` so an old failure never blocks a later clean completion.
    pub error_surfaced: bool,
    /// Append-only user-facing transcript.
    pub messages: Vec<String>,
    pub user_preferences: UserPreferences,
}

impl WorkflowState {
    /// Fresh state positioned at resume upload.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh state carrying raw resume text.
    #[must_use]
    pub fn with_resume_text(text: impl Into<String>) -> Self {
        Self {
            resume_text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Record a business error and the step that can fix it.
    pub(crate) fn fail(mut self, message: impl Into<String>, reentry: Step) -> Self {
        self.error = Some(message.into());
        self.current_step = reentry;
        self
    }

    /// Append a user-facing transcript line.
    pub(crate) fn notify(&mut self, line: impl Into<String>) {
        self.messages.push(line.into());
    }
}

/// Caller-supplied input merged into a checkpointed state on resumption.
///
/// Present fields override the checkpointed value; absent fields leave it
/// untouched. Merging happens in the executor, never in the checkpoint
/// store.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatePatch {
    pub resume_text: Option<String>,
    pub job_query: Option<JobQuery>,
    pub user_preferences: Option<UserPreferences>,
    pub answer: Option<CandidateAnswer>,
    /// Explicit phase selection for re-entry (e.g. move a completed session
    /// on to job search).
    pub current_step: Option<Step>,
}

impl StatePatch {
    #[must_use]
    pub fn answer(answer: CandidateAnswer) -> Self {
        Self {
            answer: Some(answer),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply this patch on top of `state`: caller fields win.
    pub fn apply(self, state: &mut WorkflowState) {
        if let Some(text) = self.resume_text {
            state.resume_text = Some(text);
        }
        if let Some(query) = self.job_query {
            state.job_query = Some(query);
        }
        if let Some(prefs) = self.user_preferences {
            state.user_preferences = prefs;
        }
        if let Some(answer) = self.answer {
            state.pending_answer = Some(answer);
        }
        if let Some(step) = self.current_step {
            state.current_step = step;
        }
    }
}

/// Structural validation failure. Never persisted.
#[derive(Debug, Error, Diagnostic)]
pub enum StateInvalidError {
    /// `job_query` is present but a required field is empty.
    #[error("job query missing required field: {field}")]
    #[diagnostic(
        code(jobflow::state::query_field),
        help("A job query must carry non-empty keywords and location.")
    )]
    QueryMissingField { field: &'static str },

    /// An interview session exists with no questions.
    #[error("interview session has an empty question set")]
    #[diagnostic(
        code(jobflow::state::empty_questions),
        help("Sessions are created from a validated, non-empty question list.")
    )]
    EmptyQuestionSet,

    /// The step marker promises a session that is not there.
    #[error("current step {step} requires an interview session")]
    #[diagnostic(code(jobflow::state::session_missing))]
    SessionMissing { step: Step },

    /// Responses are not ordered by strictly increasing question index.
    #[error("interview responses out of order at index {position}")]
    #[diagnostic(
        code(jobflow::state::response_order),
        help("Responses are append-only, one per question, in question order.")
    )]
    ResponseOutOfOrder { position: usize },

    /// A score escaped its 0..=10 range.
    #[error("{what} score {value} outside 0..=10")]
    #[diagnostic(code(jobflow::state::score_range))]
    ScoreOutOfRange { what: &'static str, value: f64 },

    /// A recorded answer duration is negative.
    #[error("negative response duration: {value}")]
    #[diagnostic(code(jobflow::state::negative_duration))]
    NegativeDuration { value: f64 },
}

/// Structural validation pass, run before every stage invocation and before
/// any snapshot reaches the checkpoint store.
pub fn validate(state: &WorkflowState) -> Result<(), StateInvalidError> {
    if let Some(query) = &state.job_query {
        if query.keywords.trim().is_empty() {
            return Err(StateInvalidError::QueryMissingField { field: "keywords" });
        }
        if query.location.trim().is_empty() {
            return Err(StateInvalidError::QueryMissingField { field: "location" });
        }
    }

    if matches!(
        state.current_step,
        Step::InterviewActive | Step::AwaitingResponse
    ) && state.interview_session.is_none()
    {
        return Err(StateInvalidError::SessionMissing {
            step: state.current_step,
        });
    }

    if let Some(session) = &state.interview_session {
        if session.questions.is_empty() {
            return Err(StateInvalidError::EmptyQuestionSet);
        }
        let mut previous: Option<usize> = None;
        for (position, response) in session.responses.iter().enumerate() {
            if previous.is_some_and(|p| response.question_index <= p) {
                return Err(StateInvalidError::ResponseOutOfOrder { position });
            }
            previous = Some(response.question_index);
            for (what, score) in [
                ("confidence", response.confidence_score),
                ("accuracy", response.accuracy_score),
            ] {
                if let Some(value) = score
                    && !(0.0..=10.0).contains(&value)
                {
                    return Err(StateInvalidError::ScoreOutOfRange { what, value });
                }
            }
            if let Some(value) = response.time_taken_seconds
                && value < 0.0
            {
                return Err(StateInvalidError::NegativeDuration { value });
            }
        }
    }

    Ok(())
}
