mod common;

use jobflow::checkpoint::{Checkpoint, Checkpointer, InMemoryCheckpointer};
use jobflow::routing::StageId;
use jobflow::state::{Step, WorkflowState};

fn sample_state(step: Step) -> WorkflowState {
    let mut state = WorkflowState::with_resume_text("Ada Lovelace\nada@example.com");
    state.current_step = step;
    state.messages.push("Resume for Ada Lovelace parsed and validated.".to_string());
    state
}

#[tokio::test]
async fn save_and_load_roundtrip() {
    let store = InMemoryCheckpointer::new();
    let checkpoint = Checkpoint::new(
        "thread-1",
        3,
        sample_state(Step::JobSearch),
        StageId::SearchJobs,
    );
    store.save(checkpoint.clone()).await.unwrap();

    let loaded = store.load_latest("thread-1").await.unwrap().unwrap();
    assert_eq!(loaded.step, 3);
    assert_eq!(loaded.next_stage, StageId::SearchJobs);
    assert_eq!(loaded.state, checkpoint.state);
}

#[tokio::test]
async fn history_is_ordered_and_latest_wins() {
    let store = InMemoryCheckpointer::new();
    for step in [1u64, 3, 2] {
        store
            .save(Checkpoint::new(
                "thread-1",
                step,
                sample_state(Step::JobSearch),
                StageId::SelectJob,
            ))
            .await
            .unwrap();
    }

    let history = store.list("thread-1").await.unwrap();
    let steps: Vec<u64> = history.iter().map(|c| c.step).collect();
    assert_eq!(steps, vec![1, 2, 3]);
    assert_eq!(store.load_latest("thread-1").await.unwrap().unwrap().step, 3);
}

#[tokio::test]
async fn list_threads_covers_every_saved_thread() {
    let store = InMemoryCheckpointer::new();
    for id in ["alpha", "beta"] {
        store
            .save(Checkpoint::new(id, 1, WorkflowState::new(), StageId::Complete))
            .await
            .unwrap();
    }
    let mut ids = store.list_threads().await.unwrap();
    ids.sort();
    assert_eq!(ids, vec!["alpha", "beta"]);
}

#[cfg(feature = "sqlite")]
mod sqlite {
    use super::*;
    use jobflow::checkpoint::sqlite::SqliteCheckpointer;
    use std::sync::Arc;

    async fn temp_store() -> (SqliteCheckpointer, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());
        let store = SqliteCheckpointer::connect(&url).await.unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn durable_roundtrip_preserves_state_and_stage() {
        let (store, _dir) = temp_store().await;
        let checkpoint = Checkpoint::new(
            "thread-1",
            5,
            sample_state(Step::InterviewPrep),
            StageId::GenerateQuestions,
        );
        store.save(checkpoint.clone()).await.unwrap();

        let loaded = store.load_latest("thread-1").await.unwrap().unwrap();
        assert_eq!(loaded.step, 5);
        assert_eq!(loaded.next_stage, StageId::GenerateQuestions);
        assert_eq!(loaded.state, checkpoint.state);
    }

    #[tokio::test]
    async fn same_step_resave_supersedes() {
        let (store, _dir) = temp_store().await;
        let mut state = sample_state(Step::JobSearch);
        store
            .save(Checkpoint::new("t", 1, state.clone(), StageId::SearchJobs))
            .await
            .unwrap();
        state.messages.push("retried".to_string());
        store
            .save(Checkpoint::new("t", 1, state.clone(), StageId::SearchJobs))
            .await
            .unwrap();

        let history = store.list("t").await.unwrap();
        assert_eq!(history.len(), 1);
        assert!(history[0].state.messages.iter().any(|m| m == "retried"));
    }

    #[tokio::test]
    async fn unknown_thread_loads_none() {
        let (store, _dir) = temp_store().await;
        assert!(store.load_latest("missing").await.unwrap().is_none());
        assert!(store.list("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn engine_resumes_through_the_durable_store() {
        use crate::common::fixtures::{happy_registry, interview_state};
        use jobflow::engine::{RunStatus, WorkflowEngine};
        use jobflow::models::CandidateAnswer;
        use jobflow::state::StatePatch;

        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("flow.db").display());
        let registry = Arc::new(happy_registry(2, 3));

        let report = {
            let store = Arc::new(SqliteCheckpointer::connect(&url).await.unwrap());
            let mut engine =
                WorkflowEngine::standard(Arc::clone(&registry), store as Arc<dyn Checkpointer>);
            engine.start(interview_state()).await.unwrap()
        };
        assert_eq!(report.status, RunStatus::Suspended);

        // Simulated restart: new pool, new engine, same database file.
        let store = Arc::new(SqliteCheckpointer::connect(&url).await.unwrap());
        let mut engine =
            WorkflowEngine::standard(Arc::clone(&registry), store as Arc<dyn Checkpointer>);
        let resumed = engine
            .resume(
                &report.thread_id,
                StatePatch::answer(CandidateAnswer::from_audio(vec![9])),
            )
            .await
            .unwrap();

        assert_eq!(resumed.status, RunStatus::Suspended);
        let session = resumed.state.interview_session.as_ref().unwrap();
        assert_eq!(session.responses.len(), 1);
    }
}
