//! Stage identifiers, routing policy, and the transition table.
//!
//! All branching lives here as pure functions of the state; stages never
//! decide where the run goes next. The table maps every [`StageId`] to its
//! stage implementation and the routing function consulted after it runs,
//! which keeps the whole control flow inspectable in one place.

use std::fmt;
use std::sync::Arc;

use miette::Diagnostic;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::stages::{
    AdvanceQuestion, AnalyzeMatch, AnalyzeResume, AwaitInput, CheckProgress, Complete,
    ConductQuestion, ErrorHandler, FinalizeInterview, GenerateQuestions, InitializeSession,
    NoResults, ParseResume, SearchJobs, SelectJob, Stage, ValidateResume,
};
use crate::state::{NextAction, Step, WorkflowState};

/// Identifier of one stage in the transition table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageId {
    ParseResume,
    AnalyzeResume,
    ValidateResume,
    SearchJobs,
    SelectJob,
    AnalyzeMatch,
    NoResults,
    GenerateQuestions,
    InitializeSession,
    ConductQuestion,
    AwaitInput,
    CheckProgress,
    AdvanceQuestion,
    FinalizeInterview,
    ErrorHandler,
    Complete,
    /// Virtual terminal: never executed, never in the table.
    End,
}

impl StageId {
    /// Stable string form for persistence.
    #[must_use]
    pub fn encode(&self) -> &'static str {
        match self {
            StageId::ParseResume => "parse_resume",
            StageId::AnalyzeResume => "analyze_resume",
            StageId::ValidateResume => "validate_resume",
            StageId::SearchJobs => "search_jobs",
            StageId::SelectJob => "select_job",
            StageId::AnalyzeMatch => "analyze_match",
            StageId::NoResults => "no_results",
            StageId::GenerateQuestions => "generate_questions",
            StageId::InitializeSession => "initialize_session",
            StageId::ConductQuestion => "conduct_question",
            StageId::AwaitInput => "await_input",
            StageId::CheckProgress => "check_progress",
            StageId::AdvanceQuestion => "advance_question",
            StageId::FinalizeInterview => "finalize_interview",
            StageId::ErrorHandler => "error_handler",
            StageId::Complete => "complete",
            StageId::End => "end",
        }
    }

    /// Inverse of [`StageId::encode`]; `None` for unknown strings.
    #[must_use]
    pub fn decode(s: &str) -> Option<Self> {
        Some(match s {
            "parse_resume" => StageId::ParseResume,
            "analyze_resume" => StageId::AnalyzeResume,
            "validate_resume" => StageId::ValidateResume,
            "search_jobs" => StageId::SearchJobs,
            "select_job" => StageId::SelectJob,
            "analyze_match" => StageId::AnalyzeMatch,
            "no_results" => StageId::NoResults,
            "generate_questions" => StageId::GenerateQuestions,
            "initialize_session" => StageId::InitializeSession,
            "conduct_question" => StageId::ConductQuestion,
            "await_input" => StageId::AwaitInput,
            "check_progress" => StageId::CheckProgress,
            "advance_question" => StageId::AdvanceQuestion,
            "finalize_interview" => StageId::FinalizeInterview,
            "error_handler" => StageId::ErrorHandler,
            "complete" => StageId::Complete,
            "end" => StageId::End,
            _ => return None,
        })
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.encode())
    }
}

/// Routing policy consulted after a stage runs.
pub type RoutingFn = fn(&WorkflowState) -> StageId;

/// Map a fresh or resumed state to its first stage.
///
/// Pure function of `current_step` and the data the step promises; an unmet
/// promise (e.g. `job_selection` with no search results) falls back to the
/// stage that can establish it.
pub fn route_entry(state: &WorkflowState) -> StageId {
    if state.error.is_some() {
        return StageId::ErrorHandler;
    }
    match state.current_step {
        Step::ResumeUpload => StageId::ParseResume,
        Step::ResumeAnalysis => {
            if state.resume_data.is_some() {
                StageId::AnalyzeResume
            } else {
                StageId::ParseResume
            }
        }
        Step::JobSearch => {
            if state.resume_data.is_some() {
                StageId::SearchJobs
            } else {
                StageId::ParseResume
            }
        }
        Step::JobSelection => {
            if state.job_results.is_some() {
                StageId::SelectJob
            } else {
                StageId::SearchJobs
            }
        }
        Step::MatchAnalysis => {
            if state.selected_job.is_some() {
                StageId::AnalyzeMatch
            } else {
                StageId::SelectJob
            }
        }
        Step::InterviewPrep => {
            if state.selected_job.is_some() {
                StageId::GenerateQuestions
            } else if state.resume_data.is_some() {
                StageId::SearchJobs
            } else {
                StageId::ParseResume
            }
        }
        Step::InterviewActive | Step::AwaitingResponse => StageId::ConductQuestion,
        Step::InterviewComplete | Step::Complete => StageId::Complete,
        Step::Error => StageId::ErrorHandler,
    }
}

fn route_after_parse(state: &WorkflowState) -> StageId {
    if state.error.is_some() {
        StageId::ErrorHandler
    } else {
        StageId::AnalyzeResume
    }
}

fn route_after_analyze(_state: &WorkflowState) -> StageId {
    StageId::ValidateResume
}

fn route_after_validate(state: &WorkflowState) -> StageId {
    if state.error.is_some() || state.resume_data.is_none() {
        StageId::ErrorHandler
    } else if state.user_preferences.auto_job_search && state.job_query.is_some() {
        StageId::SearchJobs
    } else {
        StageId::Complete
    }
}

fn route_after_search(state: &WorkflowState) -> StageId {
    if state.error.is_some() {
        return StageId::ErrorHandler;
    }
    match &state.job_results {
        Some(jobs) if jobs.is_empty() => StageId::NoResults,
        Some(_) => StageId::SelectJob,
        None => StageId::ErrorHandler,
    }
}

fn route_after_no_results(_state: &WorkflowState) -> StageId {
    StageId::Complete
}

fn route_after_select(state: &WorkflowState) -> StageId {
    if state.error.is_some() || state.selected_job.is_none() {
        StageId::ErrorHandler
    } else if state.user_preferences.next_action == NextAction::Interview {
        StageId::GenerateQuestions
    } else {
        StageId::AnalyzeMatch
    }
}

fn route_after_match(state: &WorkflowState) -> StageId {
    if state.error.is_some() || state.match_analysis.is_none() {
        StageId::ErrorHandler
    } else if state.user_preferences.proceed_to_interview {
        StageId::GenerateQuestions
    } else {
        StageId::Complete
    }
}

fn route_after_generate(state: &WorkflowState) -> StageId {
    if state.error.is_some() {
        StageId::ErrorHandler
    } else {
        StageId::InitializeSession
    }
}

fn route_after_initialize(state: &WorkflowState) -> StageId {
    if state.error.is_some() {
        StageId::ErrorHandler
    } else {
        StageId::ConductQuestion
    }
}

fn route_after_conduct(state: &WorkflowState) -> StageId {
    if state.current_step == Step::AwaitingResponse {
        StageId::AwaitInput
    } else if state.error.is_some() {
        StageId::ErrorHandler
    } else {
        StageId::CheckProgress
    }
}

fn route_after_await(_state: &WorkflowState) -> StageId {
    StageId::ConductQuestion
}

/// Decide between asking again, advancing, and finalizing.
///
/// Index at or past the end of the question set always finalizes; an
/// overflow is never an error.
fn route_check_progress(state: &WorkflowState) -> StageId {
    let Some(session) = &state.interview_session else {
        return StageId::ErrorHandler;
    };
    if session.current_question_index >= session.questions.len() {
        StageId::FinalizeInterview
    } else if session.responses.len() > session.current_question_index {
        StageId::AdvanceQuestion
    } else {
        StageId::ConductQuestion
    }
}

fn route_after_advance(_state: &WorkflowState) -> StageId {
    StageId::ConductQuestion
}

fn route_after_finalize(_state: &WorkflowState) -> StageId {
    StageId::Complete
}

fn route_after_error(_state: &WorkflowState) -> StageId {
    StageId::Complete
}

fn route_after_complete(_state: &WorkflowState) -> StageId {
    StageId::End
}

/// One table row: the stage implementation plus its follow-up routing.
#[derive(Clone)]
pub struct Transition {
    pub stage: Arc<dyn Stage>,
    pub route: RoutingFn,
}

/// Transition table construction failure.
#[derive(Debug, Error, Diagnostic)]
pub enum TableError {
    #[error("stage registered twice: {id}")]
    #[diagnostic(code(jobflow::routing::duplicate))]
    Duplicate { id: StageId },

    #[error("the virtual End stage cannot carry an implementation")]
    #[diagnostic(code(jobflow::routing::end_not_executable))]
    EndNotExecutable,
}

/// The complete control-flow map of the workflow.
#[derive(Clone, Default)]
pub struct TransitionTable {
    transitions: FxHashMap<StageId, Transition>,
}

impl std::fmt::Debug for TransitionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<&'static str> = self.transitions.keys().map(StageId::encode).collect();
        ids.sort_unstable();
        f.debug_struct("TransitionTable").field("stages", &ids).finish()
    }
}

impl TransitionTable {
    #[must_use]
    pub fn builder() -> TransitionTableBuilder {
        TransitionTableBuilder::default()
    }

    /// The full workflow wiring: resume intake, job phase, interview loop.
    #[must_use]
    pub fn standard() -> Self {
        // The builder only errors on duplicates or an End row; the wiring
        // below has neither, so this cannot fail.
        Self::builder()
            .stage(StageId::ParseResume, Arc::new(ParseResume), route_after_parse)
            .stage(StageId::AnalyzeResume, Arc::new(AnalyzeResume), route_after_analyze)
            .stage(StageId::ValidateResume, Arc::new(ValidateResume), route_after_validate)
            .stage(StageId::SearchJobs, Arc::new(SearchJobs), route_after_search)
            .stage(StageId::NoResults, Arc::new(NoResults), route_after_no_results)
            .stage(StageId::SelectJob, Arc::new(SelectJob), route_after_select)
            .stage(StageId::AnalyzeMatch, Arc::new(AnalyzeMatch), route_after_match)
            .stage(
                StageId::GenerateQuestions,
                Arc::new(GenerateQuestions),
                route_after_generate,
            )
            .stage(
                StageId::InitializeSession,
                Arc::new(InitializeSession),
                route_after_initialize,
            )
            .stage(
                StageId::ConductQuestion,
                Arc::new(ConductQuestion),
                route_after_conduct,
            )
            .stage(StageId::AwaitInput, Arc::new(AwaitInput), route_after_await)
            .stage(StageId::CheckProgress, Arc::new(CheckProgress), route_check_progress)
            .stage(
                StageId::AdvanceQuestion,
                Arc::new(AdvanceQuestion),
                route_after_advance,
            )
            .stage(
                StageId::FinalizeInterview,
                Arc::new(FinalizeInterview),
                route_after_finalize,
            )
            .stage(StageId::ErrorHandler, Arc::new(ErrorHandler), route_after_error)
            .stage(StageId::Complete, Arc::new(Complete), route_after_complete)
            .build_unchecked()
    }

    #[must_use]
    pub fn get(&self, id: StageId) -> Option<&Transition> {
        self.transitions.get(&id)
    }

    #[must_use]
    pub fn contains(&self, id: StageId) -> bool {
        self.transitions.contains_key(&id)
    }

    pub fn stage_ids(&self) -> impl Iterator<Item = StageId> + '_ {
        self.transitions.keys().copied()
    }
}

/// Builder enforcing one row per stage and no executable `End`.
#[derive(Default)]
pub struct TransitionTableBuilder {
    rows: Vec<(StageId, Transition)>,
}

impl TransitionTableBuilder {
    #[must_use]
    pub fn stage(mut self, id: StageId, stage: Arc<dyn Stage>, route: RoutingFn) -> Self {
        self.rows.push((id, Transition { stage, route }));
        self
    }

    pub fn build(self) -> Result<TransitionTable, TableError> {
        let mut transitions = FxHashMap::default();
        for (id, transition) in self.rows {
            if id == StageId::End {
                return Err(TableError::EndNotExecutable);
            }
            if transitions.insert(id, transition).is_some() {
                return Err(TableError::Duplicate { id });
            }
        }
        Ok(TransitionTable { transitions })
    }

    /// Build a wiring known to be well-formed.
    ///
    /// Falls back to an empty table if the wiring is malformed, which the
    /// executor reports as a missing stage on first use.
    fn build_unchecked(self) -> TransitionTable {
        self.build().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{JobListing, JobQuery, ResumeData};

    fn state_with_resume() -> WorkflowState {
        let mut state = WorkflowState::new();
        state.resume_data = Some(ResumeData {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            ..Default::default()
        });
        state
    }

    #[test]
    fn stage_id_round_trips() {
        for id in [
            StageId::ParseResume,
            StageId::ConductQuestion,
            StageId::FinalizeInterview,
            StageId::End,
        ] {
            assert_eq!(StageId::decode(id.encode()), Some(id));
        }
        assert_eq!(StageId::decode("bogus"), None);
    }

    #[test]
    fn entry_routes_error_first() {
        let mut state = state_with_resume();
        state.current_step = Step::JobSearch;
        state.error = Some("boom".to_string());
        assert_eq!(route_entry(&state), StageId::ErrorHandler);
    }

    #[test]
    fn entry_falls_back_when_promise_unmet() {
        let mut state = WorkflowState::new();
        state.current_step = Step::JobSelection;
        assert_eq!(route_entry(&state), StageId::SearchJobs);
        state.current_step = Step::JobSearch;
        assert_eq!(route_entry(&state), StageId::ParseResume);
    }

    #[test]
    fn search_routing_distinguishes_empty_from_missing() {
        let mut state = state_with_resume();
        state.job_query = Some(JobQuery::new("rust", "Berlin"));
        state.job_results = Some(vec![]);
        assert_eq!(route_after_search(&state), StageId::NoResults);
        state.job_results = Some(vec![JobListing::default()]);
        assert_eq!(route_after_search(&state), StageId::SelectJob);
        state.job_results = None;
        assert_eq!(route_after_search(&state), StageId::ErrorHandler);
    }

    #[test]
    fn standard_table_covers_every_executable_stage() {
        let table = TransitionTable::standard();
        for id in [
            StageId::ParseResume,
            StageId::AnalyzeResume,
            StageId::ValidateResume,
            StageId::SearchJobs,
            StageId::SelectJob,
            StageId::AnalyzeMatch,
            StageId::NoResults,
            StageId::GenerateQuestions,
            StageId::InitializeSession,
            StageId::ConductQuestion,
            StageId::AwaitInput,
            StageId::CheckProgress,
            StageId::AdvanceQuestion,
            StageId::FinalizeInterview,
            StageId::ErrorHandler,
            StageId::Complete,
        ] {
            assert!(table.contains(id), "missing {id}");
        }
        assert!(!table.contains(StageId::End));
    }

    #[test]
    fn builder_rejects_duplicates_and_end() {
        let dup = TransitionTable::builder()
            .stage(StageId::Complete, Arc::new(Complete), route_after_complete)
            .stage(StageId::Complete, Arc::new(Complete), route_after_complete)
            .build();
        assert!(matches!(dup, Err(TableError::Duplicate { .. })));

        let end = TransitionTable::builder()
            .stage(StageId::End, Arc::new(Complete), route_after_complete)
            .build();
        assert!(matches!(end, Err(TableError::EndNotExecutable)));
    }
}
