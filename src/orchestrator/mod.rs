//! Orchestrator module
//!
//! The research pipeline: planning, step execution, analysis, report
//! synthesis and history. Each stage is a small component over the backend
//! traits in [`crate::backends`]; [`pipeline::ResearchOrchestrator`] composes
//! them into one streamed run.

pub mod analyzer;
pub mod config;
pub mod constants;
pub mod dispatcher;
pub mod executor;
pub mod history;
pub mod pipeline;
pub mod plan_parser;
pub mod planner;
pub mod prompts;
pub mod report;
pub mod types;
pub mod utils;
