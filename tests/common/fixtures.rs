//! Canned payloads and registries for engine scenarios.

use jobflow::models::JobQuery;
use jobflow::state::{NextAction, WorkflowState};
use jobflow::tools::{self, ToolRegistry};
use serde_json::{Value, json};

use super::tools::StaticTool;

pub fn resume_json() -> Value {
    json!({
        "name": "Ada Lovelace",
        "email": "ada@example.com",
        "phone": "+44 20 7946 0000",
        "summary": "Backend engineer with a systems focus.",
        "skills": ["Rust", "SQL", "Distributed systems"],
        "education": ["BSc Mathematics"],
        "experience": ["Analytical Engines Ltd, Senior Engineer"]
    })
}

pub fn resume_missing_email() -> Value {
    let mut resume = resume_json();
    resume["email"] = json!("");
    resume
}

pub fn analysis_json() -> Value {
    json!({
        "overall_assessment": "Strong technical resume",
        "strengths": ["Clear experience section"],
        "weaknesses": [],
        "content_improvements": [],
        "format_suggestions": [],
        "ats_optimization": []
    })
}

pub fn jobs_json(count: usize) -> Value {
    let jobs: Vec<Value> = (0..count)
        .map(|i| {
            json!({
                "title": format!("Backend Engineer {i}"),
                "company": format!("Company {i}"),
                "location": "Berlin",
                "description": "Build and run backend services.",
                "url": format!("https://jobs.example.com/{i}")
            })
        })
        .collect();
    json!({ "jobs": jobs })
}

pub fn match_json(score: f64) -> Value {
    json!({
        "match_score": score,
        "key_matches": ["Rust experience"],
        "gaps": [],
        "recommendations": ["Highlight systems work"]
    })
}

pub fn questions_json(count: usize) -> Value {
    let questions: Vec<Value> = (0..count)
        .map(|i| {
            json!({
                "question": format!("Question {i}?"),
                "category": "Technical",
                "difficulty": "Medium",
                "suggested_answer": null,
                "key_points": ["clarity"]
            })
        })
        .collect();
    json!({ "questions": questions })
}

pub fn feedback_json(confidence: f64, accuracy: f64) -> Value {
    json!({
        "evaluation": "Reasonable answer",
        "strengths": ["Structured"],
        "weaknesses": [],
        "suggestions": ["Add a concrete example"],
        "confidence_score": confidence,
        "accuracy_score": accuracy
    })
}

/// Registry where every tool succeeds with a plausible payload.
pub fn happy_registry(job_count: usize, question_count: usize) -> ToolRegistry {
    ToolRegistry::new()
        .with(tools::EXTRACT_RESUME, StaticTool::new(resume_json()))
        .with(
            tools::ANALYZE_RESUME_QUALITY,
            StaticTool::new(analysis_json()),
        )
        .with(tools::SEARCH_JOBS, StaticTool::new(jobs_json(job_count)))
        .with(tools::ANALYZE_JOB_MATCH, StaticTool::new(match_json(82.0)))
        .with(
            tools::GENERATE_INTERVIEW_QUESTIONS,
            StaticTool::new(questions_json(question_count)),
        )
        .with(
            tools::GENERATE_QUESTION_AUDIO,
            StaticTool::new(json!({ "audio": [] })),
        )
        .with(
            tools::TRANSCRIBE_CANDIDATE_RESPONSE,
            StaticTool::new(json!({ "text": "I would shard by tenant id." })),
        )
        .with(
            tools::GENERATE_INTERVIEW_FEEDBACK,
            StaticTool::new(feedback_json(7.0, 8.0)),
        )
}

/// State that drives intake straight into the job phase.
pub fn intake_state() -> WorkflowState {
    let mut state = WorkflowState::with_resume_text("Ada Lovelace\nada@example.com\n...");
    state.job_query = Some(JobQuery::new("backend rust", "Berlin"));
    state.user_preferences.auto_job_search = true;
    state
}

/// Intake state that continues all the way into the interview loop.
pub fn interview_state() -> WorkflowState {
    let mut state = intake_state();
    state.user_preferences.next_action = NextAction::Interview;
    state
}
