//! Typed payloads exchanged between stages and the tool gateway.
//!
//! These records are the structured results of external tool calls (resume
//! extraction, job search, match analysis, question generation). They are
//! plain serde structs; all workflow behavior lives in [`crate::stages`].

use serde::{Deserialize, Serialize};

/// Structured resume produced by the `extract_resume` tool.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResumeData {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub summary: Option<String>,
    pub skills: Vec<String>,
    pub education: Vec<String>,
    pub experience: Vec<String>,
    /// Optional quality feedback attached by the resume-analysis stage.
    pub analysis: Option<ResumeAnalysis>,
}

/// Quality feedback for a parsed resume.
///
/// This is optional enrichment: when the analysis tool is unavailable the
/// workflow substitutes [`ResumeAnalysis::placeholder`] instead of stalling.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResumeAnalysis {
    pub overall_assessment: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub content_improvements: Vec<String>,
    pub format_suggestions: Vec<String>,
    pub ats_optimization: Vec<String>,
}

impl ResumeAnalysis {
    /// Fixed fallback used when the quality-analysis tool fails.
    pub fn placeholder() -> Self {
        Self {
            overall_assessment: "Analysis unavailable".to_string(),
            strengths: vec!["Resume parsed successfully".to_string()],
            weaknesses: vec!["Could not generate detailed analysis".to_string()],
            ..Default::default()
        }
    }
}

/// Parameters for a job search.
///
/// `keywords` and `location` are required by state validation whenever a
/// query is present; `platform` and `count` carry defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JobQuery {
    pub keywords: String,
    pub location: String,
    #[serde(default = "JobQuery::default_platform")]
    pub platform: String,
    #[serde(default = "JobQuery::default_count")]
    pub count: usize,
}

impl JobQuery {
    pub fn new(keywords: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            keywords: keywords.into(),
            location: location.into(),
            platform: Self::default_platform(),
            count: Self::default_count(),
        }
    }

    fn default_platform() -> String {
        "LinkedIn".to_string()
    }

    fn default_count() -> usize {
        10
    }
}

/// One job listing returned by the search tool.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobListing {
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub description: String,
    pub url: Option<String>,
}

/// Resume-to-job compatibility analysis.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchAnalysis {
    /// Compatibility score in 0..=100.
    pub match_score: f64,
    pub key_matches: Vec<String>,
    pub gaps: Vec<String>,
    pub recommendations: Vec<String>,
}

impl MatchAnalysis {
    /// Fixed fallback returned when the match-analysis tool fails; the
    /// workflow advances on it rather than blocking interview prep.
    pub fn fallback(detail: impl Into<String>) -> Self {
        Self {
            match_score: 50.0,
            key_matches: vec!["Basic qualifications met".to_string()],
            gaps: vec![detail.into()],
            recommendations: vec!["Review job requirements manually".to_string()],
        }
    }
}

/// One generated interview question.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterviewQuestion {
    pub question: String,
    pub category: String,
    pub difficulty: Option<String>,
    pub suggested_answer: Option<String>,
    pub key_points: Vec<String>,
}

impl InterviewQuestion {
    pub fn new(question: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            category: category.into(),
            ..Default::default()
        }
    }
}

/// A candidate's spoken answer, supplied by the caller while the workflow is
/// suspended at `awaiting_response`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateAnswer {
    /// Raw audio bytes; transcription happens behind the tool gateway.
    pub audio: Vec<u8>,
    /// Seconds the candidate took to answer, if the caller measured it.
    pub time_taken_seconds: Option<f64>,
}

impl CandidateAnswer {
    pub fn from_audio(audio: Vec<u8>) -> Self {
        Self {
            audio,
            time_taken_seconds: None,
        }
    }
}
