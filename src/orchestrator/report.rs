//! Report synthesis
//!
//! Builds the final report from completed steps. The generative path is
//! tried once; any failure, or having nothing worth synthesizing, falls back
//! to a deterministic Markdown report that never fails.

use crate::backends::{GenerationError, GenerativeBackend};
use crate::orchestrator::constants::{
    BLOCK_SEPARATOR, NO_RELEVANT_RESULTS, NO_RESULTS_FOUND, TRUNCATION_MARKER,
};
use crate::orchestrator::prompts;
use crate::orchestrator::types::StepResult;
use crate::orchestrator::utils::truncate_with_marker;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Why the generative report was not used
#[derive(Error, Debug)]
pub enum ReportGenerationError {
    /// No completed step has a substantive analysis
    #[error("no completed steps with findings to report")]
    NoFindings,

    /// The generative backend failed
    #[error("report generation failed: {0}")]
    Generation(#[from] GenerationError),

    /// The backend returned only whitespace
    #[error("generative backend returned an empty report")]
    EmptyReport,
}

/// Which path produced the report
#[derive(Debug, Clone, PartialEq)]
pub enum ReportOutcome {
    /// Generated by the backend
    Generated(String),
    /// Deterministic fallback
    Fallback {
        /// Fallback report text
        report: String,
        /// Why the generative path was not used
        reason: String,
    },
}

impl ReportOutcome {
    /// Report text
    pub fn report(&self) -> &str {
        match self {
            ReportOutcome::Generated(report) => report,
            ReportOutcome::Fallback { report, .. } => report,
        }
    }

    /// Consume into the report text
    pub fn into_report(self) -> String {
        match self {
            ReportOutcome::Generated(report) => report,
            ReportOutcome::Fallback { report, .. } => report,
        }
    }

    /// True when the fallback was used
    pub fn is_fallback(&self) -> bool {
        matches!(self, ReportOutcome::Fallback { .. })
    }
}

/// Synthesizes final reports
pub struct ReportSynthesizer {
    generative: Arc<dyn GenerativeBackend>,
    char_budget: usize,
    max_output_tokens: u32,
}

impl ReportSynthesizer {
    /// Create a synthesizer
    pub fn new(
        generative: Arc<dyn GenerativeBackend>,
        char_budget: usize,
        max_output_tokens: u32,
    ) -> Self {
        Self {
            generative,
            char_budget,
            max_output_tokens,
        }
    }

    /// Findings block over completed steps, truncated to the budget
    pub fn findings_block(&self, results: &[StepResult]) -> (String, bool) {
        let findings: String = results
            .iter()
            .filter(|r| r.is_completed())
            .map(|r| format!("**{}**:\n{}", r.title, r.analysis))
            .collect::<Vec<_>>()
            .join(BLOCK_SEPARATOR);
        truncate_with_marker(&findings, self.char_budget, TRUNCATION_MARKER)
    }

    /// One generative attempt
    pub async fn generate(
        &self,
        results: &[StepResult],
        query: &str,
    ) -> Result<String, ReportGenerationError> {
        if !results.iter().any(has_findings) {
            return Err(ReportGenerationError::NoFindings);
        }

        let (findings, truncated) = self.findings_block(results);
        debug!(truncated, "Built report prompt");

        let report = self
            .generative
            .complete(&prompts::report_prompt(query, &findings), self.max_output_tokens)
            .await?;
        if report.trim().is_empty() {
            return Err(ReportGenerationError::EmptyReport);
        }
        Ok(report)
    }

    /// Generated report, or the fallback on any failure
    pub async fn synthesize_outcome(&self, results: &[StepResult], query: &str) -> ReportOutcome {
        match self.generate(results, query).await {
            Ok(report) => ReportOutcome::Generated(report),
            Err(e) => {
                warn!(error = %e, "Report generation failed, using fallback report");
                ReportOutcome::Fallback {
                    report: simple_report(results, query),
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Report text, generated or fallback
    pub async fn synthesize(&self, results: &[StepResult], query: &str) -> String {
        self.synthesize_outcome(results, query).await.into_report()
    }
}

fn has_findings(result: &StepResult) -> bool {
    result.is_completed()
        && !result.analysis.trim().is_empty()
        && result.analysis != NO_RESULTS_FOUND
        && result.analysis != NO_RELEVANT_RESULTS
}

/// Deterministic Markdown report stamped with the current time
pub fn simple_report(results: &[StepResult], query: &str) -> String {
    simple_report_at(results, query, Utc::now())
}

/// Deterministic Markdown report stamped with `generated_at`
///
/// Lists every completed step's title and verbatim analysis.
pub fn simple_report_at(results: &[StepResult], query: &str, generated_at: DateTime<Utc>) -> String {
    let mut report = format!("# {} - Research Report\n\n## Main Findings\n\n", query);
    for result in results.iter().filter(|r| r.is_completed()) {
        report.push_str(&format!("**{}**: {}\n\n", result.title, result.analysis));
    }
    report.push_str(&format!(
        "## Conclusion\n\nBased on the research above, \"{}\" was analyzed from multiple angles.\n\n*Report generated at: {}*\n",
        query,
        generated_at.format("%Y-%m-%d %H:%M:%S")
    ));
    report
}
