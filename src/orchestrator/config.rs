//! Orchestrator configuration
//!
//! Budgets and limits for the research pipeline.

use crate::error::AppError;
use crate::orchestrator::constants::TRUNCATION_MARKER;
use crate::orchestrator::utils::char_len;
use serde::Serialize;

/// Research pipeline configuration
#[derive(Debug, Clone, Serialize)]
pub struct ResearchConfig {
    /// Maximum documents included in a step analysis prompt
    pub max_analysis_items: usize,
    /// Character budget for the documents block of an analysis prompt
    pub analysis_char_budget: usize,
    /// Character budget for the findings block of the report prompt
    pub report_char_budget: usize,
    /// Sources extracted per origin for each sub-query
    pub max_sources_per_origin: usize,
    /// Output token cap for plan generation
    pub plan_max_tokens: u32,
    /// Output token cap for step analysis
    pub analysis_max_tokens: u32,
    /// Output token cap for report generation
    pub report_max_tokens: u32,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            max_analysis_items: 5,
            analysis_char_budget: 2500,
            report_char_budget: 1500,
            max_sources_per_origin: 3,
            plan_max_tokens: 2000,
            analysis_max_tokens: 1500,
            report_max_tokens: 2000,
        }
    }
}

impl ResearchConfig {
    /// Load from environment, falling back to defaults per field
    ///
    /// Reads `RESEARCH_MAX_ANALYSIS_ITEMS`, `RESEARCH_ANALYSIS_CHAR_BUDGET`,
    /// `RESEARCH_REPORT_CHAR_BUDGET` and `RESEARCH_MAX_SOURCES_PER_ORIGIN`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_analysis_items: env_parse("RESEARCH_MAX_ANALYSIS_ITEMS")
                .unwrap_or(defaults.max_analysis_items),
            analysis_char_budget: env_parse("RESEARCH_ANALYSIS_CHAR_BUDGET")
                .unwrap_or(defaults.analysis_char_budget),
            report_char_budget: env_parse("RESEARCH_REPORT_CHAR_BUDGET")
                .unwrap_or(defaults.report_char_budget),
            max_sources_per_origin: env_parse("RESEARCH_MAX_SOURCES_PER_ORIGIN")
                .unwrap_or(defaults.max_sources_per_origin),
            ..defaults
        }
    }

    /// Validate limits
    ///
    /// Both character budgets must leave room for the truncation marker.
    ///
    /// # Returns
    /// * `Ok(())` - Configuration is usable
    /// * `Err(AppError)` - If any limit is out of range
    pub fn validate(&self) -> Result<(), AppError> {
        let marker_len = char_len(TRUNCATION_MARKER);
        if self.max_analysis_items == 0 {
            return Err(AppError::Config(
                "max_analysis_items must be > 0".to_string(),
            ));
        }
        if self.max_sources_per_origin == 0 {
            return Err(AppError::Config(
                "max_sources_per_origin must be > 0".to_string(),
            ));
        }
        if self.analysis_char_budget <= marker_len {
            return Err(AppError::Config(format!(
                "analysis_char_budget must be > {}",
                marker_len
            )));
        }
        if self.report_char_budget <= marker_len {
            return Err(AppError::Config(format!(
                "report_char_budget must be > {}",
                marker_len
            )));
        }
        if self.plan_max_tokens == 0 || self.analysis_max_tokens == 0 || self.report_max_tokens == 0
        {
            return Err(AppError::Config(
                "output token caps must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
