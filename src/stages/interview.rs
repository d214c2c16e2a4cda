//! Interview loop stages: question generation, session lifecycle, and the
//! conduct/await/advance cycle that suspends for each candidate answer.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tracing::{debug, warn};

use crate::interview::{InterviewFeedback, InterviewSessionState, QuestionResponse};
use crate::state::{Step, WorkflowState};
use crate::tools;
use crate::tools::schema::{GeneratedQuestions, Transcription};

use super::{Stage, StageContext};

const MIN_QUESTIONS: usize = 5;
const MAX_QUESTIONS: usize = 20;
const DEFAULT_QUESTIONS: usize = 10;
const DEFAULT_INTERVIEW_TYPE: &str = "Technical Interview";

/// Generate the question set for the selected job.
pub struct GenerateQuestions;

#[async_trait]
impl Stage for GenerateQuestions {
    async fn run(&self, mut state: WorkflowState, ctx: &StageContext) -> WorkflowState {
        let Some(job) = state.selected_job.clone() else {
            return state.fail("No job selected for question generation", Step::JobSelection);
        };
        // The resume only enriches question generation; absent is fine.
        let resume = state.resume_data.clone();

        let count = state
            .user_preferences
            .question_count
            .unwrap_or(DEFAULT_QUESTIONS)
            .clamp(MIN_QUESTIONS, MAX_QUESTIONS);
        let interview_type = state
            .user_preferences
            .interview_type
            .clone()
            .unwrap_or_else(|| DEFAULT_INTERVIEW_TYPE.to_string());

        let result = ctx
            .tools
            .invoke_as::<GeneratedQuestions>(
                tools::GENERATE_INTERVIEW_QUESTIONS,
                json!({
                    "resume": resume,
                    "job": job,
                    "interview_type": interview_type,
                    "question_count": count,
                }),
            )
            .await;
        match result {
            Ok(generated) if !generated.questions.is_empty() => {
                debug!(count = generated.questions.len(), "questions generated");
                state.interview_questions = generated.questions;
                state.current_step = Step::InterviewPrep;
                state.error = None;
                state
            }
            Ok(_) => state.fail(
                "Question generation returned an empty set",
                Step::InterviewPrep,
            ),
            Err(e) => state.fail(
                format!("Question generation failed: {e}"),
                Step::InterviewPrep,
            ),
        }
    }
}

/// Create the live session from the generated question set.
pub struct InitializeSession;

#[async_trait]
impl Stage for InitializeSession {
    async fn run(&self, mut state: WorkflowState, _ctx: &StageContext) -> WorkflowState {
        if state.interview_questions.is_empty() {
            return state.fail("No questions to start an interview with", Step::InterviewPrep);
        }
        let Some(job) = &state.selected_job else {
            return state.fail("No job selected for the interview", Step::JobSelection);
        };

        let interview_type = state
            .user_preferences
            .interview_type
            .clone()
            .unwrap_or_else(|| DEFAULT_INTERVIEW_TYPE.to_string());
        let session = InterviewSessionState::begin(
            job.title.clone(),
            job.company.clone(),
            interview_type,
            state.interview_questions.clone(),
        );
        state.notify(format!(
            "Interview started: {} questions for {} at {}",
            session.questions.len(),
            session.job_title,
            session.company_name
        ));
        state.interview_session = Some(session);
        state.current_step = Step::InterviewActive;
        state.error = None;
        state
    }
}

/// Ask the current question or record the pending answer.
///
/// With no pending answer this stage only marks the state
/// `awaiting_response`; the executor suspends and the repeat invocation on
/// resumption does the recording. Running it twice without an answer is a
/// no-op, so a crash between checkpoint and suspension is harmless.
pub struct ConductQuestion;

#[async_trait]
impl Stage for ConductQuestion {
    async fn run(&self, mut state: WorkflowState, ctx: &StageContext) -> WorkflowState {
        let Some(session) = state.interview_session.clone() else {
            return state.fail("No active interview session", Step::InterviewPrep);
        };
        let index = session.current_question_index;
        let Some(question) = session.questions.get(index) else {
            // Past the last question: progress routing finalizes from here.
            // A stale supplied answer has no question to attach to.
            state.pending_answer = None;
            state.current_step = Step::InterviewActive;
            return state;
        };

        let Some(answer) = state.pending_answer.take() else {
            // Presentation half: synthesize audio best-effort, then suspend.
            let audio = ctx
                .tools
                .invoke(
                    tools::GENERATE_QUESTION_AUDIO,
                    json!({ "question": question.question, "category": question.category }),
                )
                .await;
            if let Err(e) = audio {
                warn!(error = %e, index, "question audio unavailable");
            }
            state.current_step = Step::AwaitingResponse;
            return state;
        };

        // Recording half: transcription is mandatory, feedback is not.
        let transcription = ctx
            .tools
            .invoke_as::<Transcription>(
                tools::TRANSCRIBE_CANDIDATE_RESPONSE,
                json!({ "audio": answer.audio }),
            )
            .await;
        let transcribed = match transcription {
            Ok(t) => t.text,
            Err(e) => {
                return state.fail(
                    format!("Could not transcribe the answer: {e}"),
                    Step::InterviewActive,
                );
            }
        };

        let feedback = ctx
            .tools
            .invoke_as::<InterviewFeedback>(
                tools::GENERATE_INTERVIEW_FEEDBACK,
                json!({
                    "question": question.question,
                    "category": question.category,
                    "answer": transcribed,
                    "job_title": session.job_title,
                    "interview_type": session.interview_type,
                    "suggested_answer": question.suggested_answer,
                    "key_points": question.key_points,
                }),
            )
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, index, "feedback unavailable, recording neutral scores");
                InterviewFeedback::neutral(format!("Feedback unavailable: {e}"))
            });

        let response = QuestionResponse {
            question_index: index,
            question_text: question.question.clone(),
            transcribed_text: transcribed,
            time_taken_seconds: answer.time_taken_seconds,
            feedback: feedback.to_formatted_string(),
            confidence_score: Some(feedback.confidence_score),
            accuracy_score: Some(feedback.accuracy_score),
            timestamp: Utc::now(),
        };
        debug!(index, "answer recorded");
        if let Some(session) = state.interview_session.as_mut() {
            session.responses.push(response);
        }
        state.current_step = Step::InterviewActive;
        state.error = None;
        state
    }
}

/// Holding stage the executor suspends in front of; a no-op when replayed
/// on resumption.
pub struct AwaitInput;

#[async_trait]
impl Stage for AwaitInput {
    async fn run(&self, state: WorkflowState, _ctx: &StageContext) -> WorkflowState {
        state
    }
}

/// Pure routing anchor between answers; the decision lives in the routing
/// function, not here.
pub struct CheckProgress;

#[async_trait]
impl Stage for CheckProgress {
    async fn run(&self, state: WorkflowState, _ctx: &StageContext) -> WorkflowState {
        state
    }
}

/// Move to the next question after an answer was recorded.
pub struct AdvanceQuestion;

#[async_trait]
impl Stage for AdvanceQuestion {
    async fn run(&self, mut state: WorkflowState, _ctx: &StageContext) -> WorkflowState {
        if let Some(session) = state.interview_session.as_mut() {
            session.current_question_index += 1;
            debug!(index = session.current_question_index, "advanced to next question");
        }
        state
    }
}

/// Close the session and summarize the results.
pub struct FinalizeInterview;

#[async_trait]
impl Stage for FinalizeInterview {
    async fn run(&self, mut state: WorkflowState, _ctx: &StageContext) -> WorkflowState {
        let Some(session) = state.interview_session.as_mut() else {
            return state.fail("No interview session to finalize", Step::InterviewPrep);
        };
        session.is_active = false;
        session.ended_at = Some(Utc::now());

        let answered = session.responses.len();
        let total = session.questions.len();
        let mut summary = format!("Interview complete: {answered}/{total} questions answered.");
        if let Some(confidence) = session.average_confidence() {
            summary.push_str(&format!(" Average confidence {confidence:.1}/10."));
        }
        if let Some(accuracy) = session.average_accuracy() {
            summary.push_str(&format!(" Average accuracy {accuracy:.1}/10."));
        }
        state.notify(summary);
        state.current_step = Step::InterviewComplete;
        state.error = None;
        state
    }
}
