//! Resume intake stages: parse, quality analysis, validation.

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, warn};

use crate::models::{ResumeAnalysis, ResumeData};
use crate::state::{Step, WorkflowState};
use crate::tools;

use super::{Stage, StageContext};

/// Turn raw resume text into structured [`ResumeData`] via `extract_resume`.
pub struct ParseResume;

#[async_trait]
impl Stage for ParseResume {
    async fn run(&self, mut state: WorkflowState, ctx: &StageContext) -> WorkflowState {
        let Some(text) = state.resume_text.clone() else {
            return state.fail("No resume text provided", Step::ResumeUpload);
        };
        if text.trim().is_empty() {
            return state.fail("No resume text provided", Step::ResumeUpload);
        }

        let result = ctx
            .tools
            .invoke_as::<ResumeData>(tools::EXTRACT_RESUME, json!({ "resume_text": text }))
            .await;
        match result {
            Ok(resume) => {
                debug!(name = %resume.name, "resume extracted");
                state.resume_data = Some(resume);
                state.current_step = Step::ResumeAnalysis;
                state.error = None;
                state
            }
            Err(e) => state.fail(format!("Resume extraction failed: {e}"), Step::ResumeUpload),
        }
    }
}

/// Attach quality feedback to a parsed resume.
///
/// Analysis is enrichment: when the tool fails, a fixed placeholder is
/// attached and the workflow continues without a business error.
pub struct AnalyzeResume;

#[async_trait]
impl Stage for AnalyzeResume {
    async fn run(&self, mut state: WorkflowState, ctx: &StageContext) -> WorkflowState {
        let Some(resume) = state.resume_data.clone() else {
            return state.fail("No parsed resume to analyze", Step::ResumeUpload);
        };

        let result = ctx
            .tools
            .invoke_as::<ResumeAnalysis>(tools::ANALYZE_RESUME_QUALITY, json!({ "resume": resume }))
            .await;
        let analysis = match result {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!(error = %e, "resume quality analysis unavailable, using placeholder");
                ResumeAnalysis::placeholder()
            }
        };
        if let Some(parsed) = state.resume_data.as_mut() {
            parsed.analysis = Some(analysis);
        }
        state
    }
}

/// Check the parsed resume carries the minimum fields downstream stages
/// rely on: contact identity and at least one skill.
pub struct ValidateResume;

#[async_trait]
impl Stage for ValidateResume {
    async fn run(&self, mut state: WorkflowState, _ctx: &StageContext) -> WorkflowState {
        let Some(resume) = &state.resume_data else {
            return state.fail("No parsed resume to validate", Step::ResumeUpload);
        };

        let mut missing = Vec::new();
        if resume.name.trim().is_empty() {
            missing.push("name");
        }
        if resume.email.trim().is_empty() {
            missing.push("email");
        }
        if resume.skills.is_empty() {
            missing.push("skills");
        }
        if !missing.is_empty() {
            return state.fail(
                format!("Resume is missing required fields: {}", missing.join(", ")),
                Step::ResumeUpload,
            );
        }

        state.notify(format!("Resume for {} parsed and validated.", resume.name));
        state.current_step = Step::JobSearch;
        state.error = None;
        state
    }
}
