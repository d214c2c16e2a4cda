//! Tool gateway: the single boundary between workflow stages and external
//! capability (LLM extraction, job boards, audio synthesis/transcription).
//!
//! Stages never talk to a provider directly. They call
//! [`ToolRegistry::invoke`] with a tool name and a JSON payload and get a
//! JSON payload back. Unknown tool names fail closed with
//! [`ToolError::UnknownTool`]. Typed parameter/result shapes live in
//! [`schema`]; stages decode results at the call site and apply their
//! fallback policy when a call fails.

pub mod schema;

use std::sync::Arc;

use async_trait::async_trait;
use miette::Diagnostic;
use rustc_hash::FxHashMap;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument};

/// Resume extraction: raw text in, structured [`crate::models::ResumeData`] out.
pub const EXTRACT_RESUME: &str = "extract_resume";
/// Resume quality analysis: [`crate::models::ResumeAnalysis`] out.
pub const ANALYZE_RESUME_QUALITY: &str = "analyze_resume_quality";
/// Job search: [`crate::models::JobQuery`] in, listing array out.
pub const SEARCH_JOBS: &str = "search_jobs";
/// Resume-to-job compatibility: [`crate::models::MatchAnalysis`] out.
pub const ANALYZE_JOB_MATCH: &str = "analyze_job_match";
/// Question generation: question array out.
pub const GENERATE_INTERVIEW_QUESTIONS: &str = "generate_interview_questions";
/// Text-to-speech for one question; result is advisory only.
pub const GENERATE_QUESTION_AUDIO: &str = "generate_question_audio";
/// Speech-to-text for a candidate answer.
pub const TRANSCRIBE_CANDIDATE_RESPONSE: &str = "transcribe_candidate_response";
/// Per-answer feedback: [`crate::interview::InterviewFeedback`] out.
pub const GENERATE_INTERVIEW_FEEDBACK: &str = "generate_interview_feedback";

/// One external capability behind the gateway.
///
/// Implementations own their transport (HTTP client, LLM SDK, local model).
/// The contract is JSON in, JSON out; shape agreements live in [`schema`].
#[async_trait]
pub trait Tool: Send + Sync {
    async fn call(&self, params: Value) -> Result<Value, ToolError>;
}

/// Tool invocation failure.
#[derive(Debug, Error, Diagnostic)]
pub enum ToolError {
    /// The requested tool is not registered. Fails closed: no fallback
    /// masks a wiring mistake.
    #[error("unknown tool: {name}")]
    #[diagnostic(
        code(jobflow::tools::unknown),
        help("Register the tool before wiring stages that call it.")
    )]
    UnknownTool { name: String },

    /// The tool ran and reported failure (provider error, timeout, refusal).
    #[error("tool {name} failed: {message}")]
    #[diagnostic(code(jobflow::tools::failed))]
    Failed { name: String, message: String },

    /// The tool returned a payload the caller could not decode.
    #[error("tool {name} returned a malformed payload: {source}")]
    #[diagnostic(
        code(jobflow::tools::malformed),
        help("The tool's result shape must match the schema module.")
    )]
    Malformed {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ToolError {
    pub fn failed(name: impl Into<String>, message: impl Into<String>) -> Self {
        ToolError::Failed {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Name-to-implementation map shared by all stages.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: FxHashMap<String, Arc<dyn Tool>>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ToolRegistry").field("tools", &names).finish()
    }
}

impl ToolRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a tool under `name`.
    pub fn register(&mut self, name: impl Into<String>, tool: Arc<dyn Tool>) -> &mut Self {
        self.tools.insert(name.into(), tool);
        self
    }

    /// Builder-style registration.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, tool: Arc<dyn Tool>) -> Self {
        self.register(name, tool);
        self
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Invoke `name` with `params`. Unknown names fail closed.
    #[instrument(skip(self, params), fields(tool = name))]
    pub async fn invoke(&self, name: &str, params: Value) -> Result<Value, ToolError> {
        let tool = self.tools.get(name).ok_or_else(|| ToolError::UnknownTool {
            name: name.to_string(),
        })?;
        debug!("invoking tool");
        tool.call(params).await
    }

    /// Invoke and decode the result into `T` in one step.
    pub async fn invoke_as<T: serde::de::DeserializeOwned>(
        &self,
        name: &str,
        params: Value,
    ) -> Result<T, ToolError> {
        let value = self.invoke(name, params).await?;
        serde_json::from_value(value).map_err(|source| ToolError::Malformed {
            name: name.to_string(),
            source,
        })
    }
}
