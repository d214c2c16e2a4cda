//! Job stages: search, selection, match analysis, and the no-results path.

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, warn};

use crate::models::MatchAnalysis;
use crate::state::{Step, WorkflowState};
use crate::tools;
use crate::tools::schema::SearchJobsResult;

use super::{Stage, StageContext};

/// Run the job search for the current query.
pub struct SearchJobs;

#[async_trait]
impl Stage for SearchJobs {
    async fn run(&self, mut state: WorkflowState, ctx: &StageContext) -> WorkflowState {
        let Some(query) = state.job_query.clone() else {
            return state.fail("No job query provided", Step::JobSearch);
        };

        let result = ctx
            .tools
            .invoke_as::<SearchJobsResult>(tools::SEARCH_JOBS, json!(query))
            .await;
        match result {
            Ok(found) => {
                debug!(count = found.jobs.len(), "job search complete");
                state.job_results = Some(found.jobs);
                state.current_step = Step::JobSelection;
                state.error = None;
                state
            }
            Err(e) => state.fail(format!("Job search failed: {e}"), Step::JobSearch),
        }
    }
}

/// Terminal handling for a search that came back empty.
///
/// An empty search is a successful, unproductive outcome, not a failure: the
/// error slot stays clear and the run completes with a user-facing message.
pub struct NoResults;

#[async_trait]
impl Stage for NoResults {
    async fn run(&self, mut state: WorkflowState, _ctx: &StageContext) -> WorkflowState {
        let (keywords, location) = state
            .job_query
            .as_ref()
            .map(|q| (q.keywords.clone(), q.location.clone()))
            .unwrap_or_default();
        state.notify(format!(
            "No jobs found for '{keywords}' in '{location}'. Try broader keywords or a different location."
        ));
        state.error = None;
        state
    }
}

/// Pick one listing out of the search results.
///
/// An absent or out-of-range `user_preferences.job_index` falls back to the
/// first listing; a bad index never fails the run.
pub struct SelectJob;

#[async_trait]
impl Stage for SelectJob {
    async fn run(&self, mut state: WorkflowState, _ctx: &StageContext) -> WorkflowState {
        let Some(results) = &state.job_results else {
            return state.fail("No job search results to select from", Step::JobSearch);
        };
        if results.is_empty() {
            return state.fail("No job search results to select from", Step::JobSearch);
        }

        let index = state
            .user_preferences
            .job_index
            .filter(|&i| i < results.len())
            .unwrap_or(0);
        let job = results[index].clone();
        debug!(index, title = %job.title, company = %job.company, "job selected");
        state.notify(format!("Selected: {} at {}", job.title, job.company));
        state.selected_job = Some(job);
        state.current_step = Step::MatchAnalysis;
        state.error = None;
        state
    }
}

/// Score resume-to-job compatibility.
///
/// The match tool failing degrades to [`MatchAnalysis::fallback`] (score 50)
/// so interview prep is never blocked on analysis availability.
pub struct AnalyzeMatch;

#[async_trait]
impl Stage for AnalyzeMatch {
    async fn run(&self, mut state: WorkflowState, ctx: &StageContext) -> WorkflowState {
        let Some(resume) = state.resume_data.clone() else {
            return state.fail("No parsed resume for match analysis", Step::ResumeUpload);
        };
        let Some(job) = state.selected_job.clone() else {
            return state.fail("No job selected for match analysis", Step::JobSelection);
        };

        let result = ctx
            .tools
            .invoke_as::<MatchAnalysis>(
                tools::ANALYZE_JOB_MATCH,
                json!({ "resume": resume, "job": job }),
            )
            .await;
        let analysis = match result {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!(error = %e, "match analysis unavailable, using fallback");
                MatchAnalysis::fallback(format!("Detailed analysis unavailable: {e}"))
            }
        };
        state.notify(format!("Match score: {:.0}/100", analysis.match_score));
        state.match_analysis = Some(analysis);
        state.current_step = Step::InterviewPrep;
        state.error = None;
        state
    }
}
