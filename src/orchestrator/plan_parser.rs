//! Plan parsing
//!
//! Turns raw generative output into a [`ResearchPlan`], and builds the
//! deterministic default plan used whenever generation cannot be trusted.

use crate::orchestrator::types::{ResearchPlan, ResearchStep, SearchTool};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Why generated text could not be turned into a plan
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanFormatError {
    /// No JSON object could be extracted
    #[error("plan response is not valid JSON: {0}")]
    InvalidJson(String),

    /// The object has no `research_plan` array
    #[error("plan response has no research_plan array")]
    MissingPlanArray,

    /// A step entry could not be read
    #[error("plan step {index} is malformed: {message}")]
    InvalidStep {
        /// 0-based index of the entry
        index: usize,
        /// Deserialization error
        message: String,
    },

    /// The plan array was empty
    #[error("plan contains no steps")]
    EmptyPlan,
}

/// Parse generated text into a plan.
///
/// If the text contains a fenced code block, only its content is parsed.
/// Missing optional step fields take their defaults. An empty
/// `research_plan` array parses successfully into an empty plan.
pub fn parse(raw: &str) -> Result<ResearchPlan, PlanFormatError> {
    let candidate = extract_fenced_block(raw).unwrap_or(raw).trim();
    let value: Value = serde_json::from_str(candidate)
        .map_err(|e| PlanFormatError::InvalidJson(e.to_string()))?;

    let entries = value
        .get("research_plan")
        .and_then(Value::as_array)
        .ok_or(PlanFormatError::MissingPlanArray)?;

    let steps = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            ResearchStep::deserialize(entry).map_err(|e| PlanFormatError::InvalidStep {
                index,
                message: e.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ResearchPlan::new(steps))
}

/// Content of the first fenced block, language tag stripped.
/// An unterminated fence runs to the end of the text.
fn extract_fenced_block(raw: &str) -> Option<&str> {
    let start = raw.find("```")?;
    let after_fence = &raw[start + 3..];
    let body = after_fence.trim_start_matches(|c: char| c.is_ascii_alphanumeric() || c == '_');
    let end = body.find("```").unwrap_or(body.len());
    Some(&body[..end])
}

/// Deterministic three-step plan derived from the query
pub fn default_plan(query: &str) -> ResearchPlan {
    let step = |number: u32, title: &str, description: &str, queries: [String; 2], outcome: &str| {
        ResearchStep {
            step: number,
            title: title.to_string(),
            description: description.to_string(),
            tool: SearchTool::Comprehensive,
            search_queries: queries.to_vec(),
            expected_outcome: outcome.to_string(),
        }
    };

    ResearchPlan::new(vec![
        step(
            1,
            "Background research",
            &format!("Collect basic information and background on {}", query),
            [query.to_string(), format!("{} background", query)],
            "Understand the basic concepts and context",
        ),
        step(
            2,
            "In-depth analysis",
            &format!("Analyze the key aspects of {} in depth", query),
            [
                format!("{} analysis", query),
                format!("{} latest developments", query),
            ],
            "Identify the key issues and current developments",
        ),
        step(
            3,
            "Comprehensive evaluation",
            &format!("Evaluate {} and draw conclusions", query),
            [format!("{} evaluation", query), format!("{} summary", query)],
            "Reach an overall assessment",
        ),
    ])
}
