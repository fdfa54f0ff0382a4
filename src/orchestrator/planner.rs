//! Plan generation
//!
//! One generation attempt, then either the generated plan or the default
//! plan. Progress is reported as a stream of `planning_step` events ending
//! in exactly one `plan` event.

use crate::backends::{GenerationError, GenerativeBackend};
use crate::orchestrator::plan_parser::{self, PlanFormatError};
use crate::orchestrator::prompts;
use crate::orchestrator::types::{PlanningPhase, ProgressEvent, ResearchPlan};
use crate::orchestrator::utils::hash_query;
use async_stream::stream;
use futures_util::{pin_mut, Stream, StreamExt};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Why a generated plan was not used
#[derive(Error, Debug)]
pub enum PlanningError {
    /// The generative backend failed
    #[error("plan generation failed: {0}")]
    Generation(#[from] GenerationError),

    /// The output was not a usable plan
    #[error("plan output unusable: {0}")]
    Format(#[from] PlanFormatError),
}

/// Which path produced the plan
#[derive(Debug, Clone, PartialEq)]
pub enum PlanOutcome {
    /// The generative backend's plan was used
    Generated(ResearchPlan),
    /// The default plan was used
    Fallback {
        /// The default plan
        plan: ResearchPlan,
        /// Why generation was not used
        reason: String,
    },
}

impl PlanOutcome {
    /// Resolve a generation attempt into an outcome
    pub fn resolve(query: &str, attempt: Result<ResearchPlan, PlanningError>) -> Self {
        match attempt {
            Ok(plan) => PlanOutcome::Generated(plan),
            Err(e) => PlanOutcome::Fallback {
                plan: plan_parser::default_plan(query),
                reason: e.to_string(),
            },
        }
    }

    /// The resolved plan
    pub fn plan(&self) -> &ResearchPlan {
        match self {
            PlanOutcome::Generated(plan) => plan,
            PlanOutcome::Fallback { plan, .. } => plan,
        }
    }

    /// Consume into the resolved plan
    pub fn into_plan(self) -> ResearchPlan {
        match self {
            PlanOutcome::Generated(plan) => plan,
            PlanOutcome::Fallback { plan, .. } => plan,
        }
    }

    /// True when the default plan was used
    pub fn is_fallback(&self) -> bool {
        matches!(self, PlanOutcome::Fallback { .. })
    }
}

/// Parse generated text and check it is executable.
///
/// An empty plan is rejected. Step numbers are rewritten to index + 1.
pub fn parse_and_validate(raw: &str) -> Result<ResearchPlan, PlanFormatError> {
    let mut plan = plan_parser::parse(raw)?;
    if plan.is_empty() {
        return Err(PlanFormatError::EmptyPlan);
    }
    if plan.renumber() {
        debug!(steps = plan.len(), "Renumbered generated plan steps");
    }
    Ok(plan)
}

/// Generates research plans
pub struct Planner {
    generative: Arc<dyn GenerativeBackend>,
    max_output_tokens: u32,
}

impl Planner {
    /// Create a planner
    pub fn new(generative: Arc<dyn GenerativeBackend>, max_output_tokens: u32) -> Self {
        Self {
            generative,
            max_output_tokens,
        }
    }

    /// Stream planning progress for `query`.
    ///
    /// Emits `planning_step` events for each phase and ends with one `plan`
    /// event. Never fails: any generation or parse error switches to the
    /// default plan.
    pub fn plan_stream<'a>(&'a self, query: &'a str) -> impl Stream<Item = ProgressEvent> + Send + 'a {
        stream! {
            let query_hash = hash_query(query);

            yield ProgressEvent::planning_step(
                PlanningPhase::AnalyzingTopic,
                "Analyzing research topic...",
                None,
            );

            let prompt = prompts::planning_prompt(query);
            yield ProgressEvent::planning_step(
                PlanningPhase::CallingAi,
                "Asking the model for a research plan...",
                None,
            );

            let attempt = match self.generative.complete(&prompt, self.max_output_tokens).await {
                Ok(raw) => {
                    yield ProgressEvent::planning_step(
                        PlanningPhase::ParsingPlan,
                        "Parsing research plan...",
                        None,
                    );
                    parse_and_validate(&raw).map_err(PlanningError::from)
                }
                Err(e) => Err(PlanningError::from(e)),
            };

            let outcome = PlanOutcome::resolve(query, attempt);
            match &outcome {
                PlanOutcome::Generated(plan) => {
                    info!(query_hash = %query_hash, steps = plan.len(), "Generated research plan");
                    yield ProgressEvent::planning_step(
                        PlanningPhase::PlanReady,
                        format!("Generated {} research steps", plan.len()),
                        Some(plan.clone()),
                    );
                }
                PlanOutcome::Fallback { plan, reason } => {
                    warn!(query_hash = %query_hash, reason = %reason, "Plan generation failed, using default plan");
                    yield ProgressEvent::planning_step(
                        PlanningPhase::FallbackPlan,
                        "Plan generation failed, using the default plan...",
                        None,
                    );
                    yield ProgressEvent::planning_step(
                        PlanningPhase::DefaultReady,
                        format!("Default plan ready with {} research steps", plan.len()),
                        Some(plan.clone()),
                    );
                }
            }

            yield ProgressEvent::plan(outcome.into_plan());
        }
    }

    /// Run planning to completion and return the plan
    pub async fn plan(&self, query: &str) -> ResearchPlan {
        let events = self.plan_stream(query);
        pin_mut!(events);
        let mut plan = None;
        while let Some(event) = events.next().await {
            if let Some(resolved) = event.plan_payload() {
                plan = Some(resolved.clone());
            }
        }
        plan.unwrap_or_else(|| plan_parser::default_plan(query))
    }
}
