//! # Jobflow: Stage-driven Career Coaching Workflow Engine
//!
//! Jobflow drives a multi-phase career workflow — resume intake, job search
//! and match analysis, and a turn-based interview simulation — as an
//! explicit state machine with durable checkpoints and human-in-the-loop
//! suspension.
//!
//! ## Core Concepts
//!
//! - **State**: one typed [`state::WorkflowState`] record threaded through
//!   every stage and serialized wholesale into checkpoints
//! - **Stages**: total async units of work; failures become business errors
//!   in the state, never panics or dead ends
//! - **Routing**: all branching as pure functions over the state, wired
//!   into one inspectable [`routing::TransitionTable`]
//! - **Engine**: the interpreter loop that validates, executes, routes, and
//!   checkpoints until the run completes or suspends for a candidate answer
//! - **Tools**: every external capability (LLM extraction, job boards,
//!   audio) behind one JSON-in/JSON-out gateway
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use jobflow::checkpoint::InMemoryCheckpointer;
//! use jobflow::engine::{RunStatus, WorkflowEngine};
//! use jobflow::models::CandidateAnswer;
//! use jobflow::state::{StatePatch, WorkflowState};
//! use jobflow::tools::ToolRegistry;
//!
//! # async fn example(tools: ToolRegistry) -> Result<(), Box<dyn std::error::Error>> {
//! let mut engine = WorkflowEngine::standard(
//!     Arc::new(tools),
//!     Arc::new(InMemoryCheckpointer::new()),
//! );
//!
//! // Drive resume intake to completion.
//! let report = engine
//!     .start(WorkflowState::with_resume_text("...resume text..."))
//!     .await?;
//!
//! // Later: answer an interview question on a suspended thread.
//! if report.status == RunStatus::Suspended {
//!     let answer = CandidateAnswer::from_audio(vec![/* audio bytes */]);
//!     engine.resume(&report.thread_id, StatePatch::answer(answer)).await?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Guide
//!
//! - [`state`] - The workflow state record, step markers, and validation
//! - [`models`] - Typed payloads exchanged with the tool gateway
//! - [`interview`] - Interview session sub-state and derived statistics
//! - [`tools`] - The tool gateway and its parameter/result shapes
//! - [`stages`] - The stage trait and every stage implementation
//! - [`routing`] - Stage identifiers, routing policy, the transition table
//! - [`engine`] - The executor: start, resume, status
//! - [`checkpoint`] - Snapshot persistence (in-memory and SQLite)
//! - [`config`] - Runtime configuration
//! - [`telemetry`] - Tracing subscriber setup

pub mod checkpoint;
pub mod config;
pub mod engine;
pub mod interview;
pub mod models;
pub mod routing;
pub mod stages;
pub mod state;
pub mod telemetry;
pub mod tools;
