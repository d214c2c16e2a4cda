//! Interview session sub-state: questions, append-only responses, and
//! derived progress/score statistics.
//!
//! One [`InterviewSessionState`] exists per interview attempt (one job, one
//! question set); starting a new interview supersedes the previous session
//! wholesale. Responses are append-only and ordered by question index; the
//! state validator in [`crate::state`] enforces both.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::InterviewQuestion;

/// Live interview session state.
///
/// Derived values are computed on demand and never stored, so a checkpoint
/// round-trip cannot drift from the underlying responses.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InterviewSessionState {
    pub job_title: String,
    pub company_name: String,
    pub interview_type: String,
    /// Question set for this attempt; validated non-empty.
    pub questions: Vec<InterviewQuestion>,
    /// Append-only, ordered by `question_index`.
    pub responses: Vec<QuestionResponse>,
    /// Monotonically non-decreasing; advanced only by the advance stage.
    pub current_question_index: usize,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl InterviewSessionState {
    /// Fresh session positioned at the first question.
    pub fn begin(
        job_title: impl Into<String>,
        company_name: impl Into<String>,
        interview_type: impl Into<String>,
        questions: Vec<InterviewQuestion>,
    ) -> Self {
        Self {
            job_title: job_title.into(),
            company_name: company_name.into(),
            interview_type: interview_type.into(),
            questions,
            responses: Vec::new(),
            current_question_index: 0,
            started_at: Utc::now(),
            ended_at: None,
            is_active: true,
        }
    }

    /// Percentage of questions answered, in 0..=100.
    ///
    /// Exactly `0.0` before the first response and `100.0` once every
    /// question has one.
    pub fn progress_percentage(&self) -> f64 {
        if self.questions.is_empty() {
            return 0.0;
        }
        (self.responses.len() as f64 / self.questions.len() as f64) * 100.0
    }

    /// Mean confidence over responses that carry a score; `None` when no
    /// response has been scored (never zero-filled).
    pub fn average_confidence(&self) -> Option<f64> {
        Self::mean(self.responses.iter().filter_map(|r| r.confidence_score))
    }

    /// Mean accuracy over responses that carry a score; `None` when no
    /// response has been scored.
    pub fn average_accuracy(&self) -> Option<f64> {
        Self::mean(self.responses.iter().filter_map(|r| r.accuracy_score))
    }

    fn mean(scores: impl Iterator<Item = f64>) -> Option<f64> {
        let (sum, n) = scores.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
        (n > 0).then(|| sum / n as f64)
    }
}

/// A single recorded answer. Immutable once appended to a session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuestionResponse {
    pub question_index: usize,
    pub question_text: String,
    pub transcribed_text: String,
    /// Seconds taken to answer, when the caller measured it. Never negative.
    pub time_taken_seconds: Option<f64>,
    /// Formatted feedback text shown to the candidate.
    pub feedback: String,
    /// 0..=10 when the feedback tool scored the answer.
    pub confidence_score: Option<f64>,
    /// 0..=10 when the feedback tool scored the answer.
    pub accuracy_score: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

/// Structured feedback for one answer, as returned by the
/// `generate_interview_feedback` tool.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterviewFeedback {
    pub evaluation: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub suggestions: Vec<String>,
    pub confidence_score: f64,
    pub accuracy_score: f64,
}

impl InterviewFeedback {
    /// Neutral fallback recorded when the feedback tool fails; scoring is
    /// optional enrichment and must not stall the interview.
    pub fn neutral(detail: impl Into<String>) -> Self {
        Self {
            evaluation: detail.into(),
            strengths: vec!["Response recorded".to_string()],
            weaknesses: vec!["Feedback unavailable".to_string()],
            suggestions: vec!["Continue to the next question".to_string()],
            confidence_score: 5.0,
            accuracy_score: 5.0,
        }
    }

    /// Render as display text for [`QuestionResponse::feedback`].
    pub fn to_formatted_string(&self) -> String {
        let mut out = format!("Evaluation:\n{}\n", self.evaluation);
        for (title, items) in [
            ("Strengths", &self.strengths),
            ("Weaknesses", &self.weaknesses),
            ("Suggestions", &self.suggestions),
        ] {
            if !items.is_empty() {
                out.push_str(&format!("\n{title}:\n"));
                for item in items {
                    out.push_str(&format!("- {item}\n"));
                }
            }
        }
        out.push_str(&format!(
            "\nConfidence: {:.1}/10\nAccuracy: {:.1}/10",
            self.confidence_score, self.accuracy_score
        ));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with(questions: usize, scored: &[(f64, f64)]) -> InterviewSessionState {
        let mut s = InterviewSessionState::begin(
            "Backend Engineer",
            "Acme",
            "Technical Interview",
            (0..questions)
                .map(|i| InterviewQuestion::new(format!("q{i}"), "General"))
                .collect(),
        );
        for (i, (c, a)) in scored.iter().enumerate() {
            s.responses.push(QuestionResponse {
                question_index: i,
                question_text: format!("q{i}"),
                transcribed_text: "answer".to_string(),
                time_taken_seconds: None,
                feedback: String::new(),
                confidence_score: Some(*c),
                accuracy_score: Some(*a),
                timestamp: Utc::now(),
            });
        }
        s
    }

    #[test]
    fn progress_bounds() {
        let s = session_with(4, &[]);
        assert_eq!(s.progress_percentage(), 0.0);
        let s = session_with(4, &[(5.0, 5.0), (6.0, 6.0), (7.0, 7.0), (8.0, 8.0)]);
        assert_eq!(s.progress_percentage(), 100.0);
    }

    #[test]
    fn averages_skip_unscored() {
        let mut s = session_with(3, &[(4.0, 8.0)]);
        s.responses.push(QuestionResponse {
            question_index: 1,
            question_text: "q1".to_string(),
            transcribed_text: "answer".to_string(),
            time_taken_seconds: None,
            feedback: String::new(),
            confidence_score: None,
            accuracy_score: None,
            timestamp: Utc::now(),
        });
        assert_eq!(s.average_confidence(), Some(4.0));
        assert_eq!(s.average_accuracy(), Some(8.0));
    }

    #[test]
    fn averages_none_when_unscored() {
        let s = session_with(2, &[]);
        assert_eq!(s.average_confidence(), None);
        assert_eq!(s.average_accuracy(), None);
    }

    #[test]
    fn feedback_rendering_includes_scores() {
        let fb = InterviewFeedback::neutral("no detail");
        let text = fb.to_formatted_string();
        assert!(text.contains("Confidence: 5.0/10"));
        assert!(text.contains("Strengths"));
    }
}
