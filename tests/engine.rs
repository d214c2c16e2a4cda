mod common;

use std::sync::Arc;

use jobflow::checkpoint::{Checkpointer, InMemoryCheckpointer};
use jobflow::engine::{RunStatus, WorkflowEngine};
use jobflow::state::{Step, StatePatch, WorkflowState};
use jobflow::tools::{self, ToolRegistry};

use common::fixtures::{
    analysis_json, happy_registry, intake_state, jobs_json, resume_json, resume_missing_email,
};
use common::tools::{FailingTool, StaticTool};

fn engine_with(
    registry: ToolRegistry,
) -> (WorkflowEngine, Arc<InMemoryCheckpointer>) {
    let store = Arc::new(InMemoryCheckpointer::new());
    let engine = WorkflowEngine::standard(
        Arc::new(registry),
        Arc::clone(&store) as Arc<dyn Checkpointer>,
    );
    (engine, store)
}

#[tokio::test]
async fn empty_search_completes_without_error() {
    let registry = ToolRegistry::new()
        .with(tools::EXTRACT_RESUME, StaticTool::new(resume_json()))
        .with(tools::ANALYZE_RESUME_QUALITY, StaticTool::new(analysis_json()))
        .with(tools::SEARCH_JOBS, StaticTool::new(jobs_json(0)));
    let (mut engine, _) = engine_with(registry);

    let report = engine.start(intake_state()).await.unwrap();

    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.state.error, None);
    assert_eq!(report.state.last_error, None);
    assert_eq!(report.state.job_results, Some(vec![]));
    // An unproductive search is still a finished run.
    assert_eq!(report.state.current_step, Step::Complete);
    assert!(
        report
            .state
            .messages
            .iter()
            .any(|m| m.contains("No jobs found")),
        "expected a no-results notice, got {:?}",
        report.state.messages
    );
}

#[tokio::test]
async fn missing_email_surfaces_error_and_keeps_reentry_marker() {
    let registry = ToolRegistry::new()
        .with(tools::EXTRACT_RESUME, StaticTool::new(resume_missing_email()))
        .with(tools::ANALYZE_RESUME_QUALITY, StaticTool::new(analysis_json()));
    let (mut engine, store) = engine_with(registry);

    let report = engine
        .start(WorkflowState::with_resume_text("no email here"))
        .await
        .unwrap();

    assert_eq!(report.status, RunStatus::Completed);
    // The error was surfaced and cleared; its text survives in last_error.
    assert_eq!(report.state.error, None);
    let last = report.state.last_error.as_deref().unwrap();
    assert!(last.contains("email"), "got {last}");
    // Resumption re-enters the stage that can fix the precondition.
    assert_eq!(report.state.current_step, Step::ResumeUpload);

    let history = store.list(&report.thread_id).await.unwrap();
    assert!(!history.is_empty());
    assert_eq!(history.last().unwrap().state, report.state);
}

#[tokio::test]
async fn match_tool_failure_falls_back_to_neutral_score() {
    let mut registry = happy_registry(2, 5);
    registry.register(tools::ANALYZE_JOB_MATCH, FailingTool::new("provider down"));
    let (mut engine, _) = engine_with(registry);

    let report = engine.start(intake_state()).await.unwrap();

    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.state.error, None);
    let analysis = report.state.match_analysis.unwrap();
    assert_eq!(analysis.match_score, 50.0);
    assert!(!analysis.recommendations.is_empty());
}

#[tokio::test]
async fn out_of_range_job_index_selects_first_listing() {
    let (mut engine, _) = engine_with(happy_registry(3, 5));
    let mut state = intake_state();
    state.user_preferences.job_index = Some(99);

    let report = engine.start(state).await.unwrap();

    assert_eq!(report.status, RunStatus::Completed);
    let selected = report.state.selected_job.unwrap();
    assert_eq!(selected.title, "Backend Engineer 0");
}

#[tokio::test]
async fn missing_tool_fails_closed_into_the_error_path() {
    // No search_jobs registered: the search stage must fail loudly, not skip.
    let registry = ToolRegistry::new()
        .with(tools::EXTRACT_RESUME, StaticTool::new(resume_json()))
        .with(tools::ANALYZE_RESUME_QUALITY, StaticTool::new(analysis_json()));
    let (mut engine, _) = engine_with(registry);

    let report = engine.start(intake_state()).await.unwrap();

    assert_eq!(report.status, RunStatus::Completed);
    let last = report.state.last_error.as_deref().unwrap();
    assert!(last.contains("unknown tool"), "got {last}");
    assert_eq!(report.state.current_step, Step::JobSearch);
}

#[tokio::test]
async fn finished_intake_hands_over_to_the_job_phase_on_resume() {
    let (mut engine, _) = engine_with(happy_registry(2, 5));
    let mut first = WorkflowState::with_resume_text("Ada Lovelace\nada@example.com");
    first.job_query = None;
    // No auto search: intake completes on its own.
    let report = engine.start(first).await.unwrap();
    assert_eq!(report.status, RunStatus::Completed);
    assert!(report.state.selected_job.is_none());

    let patch = StatePatch {
        job_query: Some(jobflow::models::JobQuery::new("backend rust", "Berlin")),
        current_step: Some(Step::JobSearch),
        ..Default::default()
    };
    let resumed = engine.resume(&report.thread_id, patch).await.unwrap();

    assert_eq!(resumed.status, RunStatus::Completed);
    assert!(resumed.state.selected_job.is_some());
    assert!(resumed.state.match_analysis.is_some());
}

#[tokio::test]
async fn clean_rerun_completes_despite_an_earlier_failure() {
    let (mut engine, _) = engine_with(happy_registry(0, 5));

    // First run fails before any tool is reached.
    let report = engine.start(WorkflowState::with_resume_text("")).await.unwrap();
    assert!(report.state.last_error.is_some());
    assert_eq!(report.state.current_step, Step::ResumeUpload);

    // The retry succeeds end to end; the old failure stays historical and
    // must not block the completion stamp.
    let patch = StatePatch {
        resume_text: Some("Ada Lovelace\nada@example.com".to_string()),
        ..Default::default()
    };
    let resumed = engine.resume(&report.thread_id, patch).await.unwrap();

    assert_eq!(resumed.status, RunStatus::Completed);
    assert_eq!(resumed.state.error, None);
    assert_eq!(resumed.state.current_step, Step::Complete);
    assert!(resumed.state.last_error.is_some());
    assert!(
        resumed.state.messages.iter().any(|m| m == "Workflow complete."),
        "expected a completion notice, got {:?}",
        resumed.state.messages
    );
}

#[tokio::test]
async fn resuming_an_unknown_thread_is_an_error() {
    let (mut engine, _) = engine_with(happy_registry(1, 5));
    let err = engine
        .resume("no-such-thread", StatePatch::default())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("unknown workflow thread"));
}

#[tokio::test]
async fn status_reports_progress_and_errors() {
    let (mut engine, _) = engine_with(happy_registry(2, 5));
    let report = engine.start(intake_state()).await.unwrap();

    let status = engine.status(&report.thread_id).await.unwrap();
    assert!(status.contains("Resume: Ada Lovelace"));
    assert!(status.contains("Jobs found: 2"));
    assert!(status.contains("Selected job: Backend Engineer 0"));
}
