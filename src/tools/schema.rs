//! Parameter and result shapes agreed between stages and tools.
//!
//! Results reuse the records in [`crate::models`] and [`crate::interview`]
//! directly; this module adds the parameter envelopes and the few
//! result-only shapes that have no other home. Everything here is plain
//! serde with `#[serde(default)]` so tool providers can evolve additively.

use serde::{Deserialize, Serialize};

use crate::models::{InterviewQuestion, JobListing, ResumeData};

/// Parameters for `extract_resume`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractResumeParams {
    pub resume_text: String,
}

/// Parameters for `analyze_resume_quality`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzeResumeParams {
    pub resume: ResumeData,
}

/// `search_jobs` takes a [`crate::models::JobQuery`] directly; its result is
/// this envelope.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchJobsResult {
    pub jobs: Vec<JobListing>,
}

/// Parameters for `analyze_job_match`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzeMatchParams {
    pub resume: ResumeData,
    pub job: JobListing,
}

/// Parameters for `generate_interview_questions`. The resume only enriches
/// the questions and may be absent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateQuestionsParams {
    pub resume: Option<ResumeData>,
    pub job: JobListing,
    pub interview_type: String,
    pub question_count: usize,
}

/// Result of `generate_interview_questions`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratedQuestions {
    pub questions: Vec<InterviewQuestion>,
}

/// Parameters for `generate_question_audio`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestionAudioParams {
    pub question: String,
    pub category: String,
}

/// Parameters for `transcribe_candidate_response`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscribeParams {
    pub audio: Vec<u8>,
}

/// Result of `transcribe_candidate_response`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transcription {
    pub text: String,
}

/// Parameters for `generate_interview_feedback`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackParams {
    pub question: String,
    pub category: String,
    pub answer: String,
    pub job_title: String,
    pub interview_type: String,
    pub suggested_answer: Option<String>,
    pub key_points: Vec<String>,
}
