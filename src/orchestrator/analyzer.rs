//! Step analysis
//!
//! Condenses a step's merged retrieval results into one prompt and asks the
//! generative backend for an analysis. Analysis never fails: a backend error
//! degrades to a short message naming the step and the number of items found.

use crate::backends::GenerativeBackend;
use crate::orchestrator::constants::{BLOCK_SEPARATOR, NO_RESULTS_FOUND, TRUNCATION_MARKER};
use crate::orchestrator::prompts;
use crate::orchestrator::types::OriginResults;
use crate::orchestrator::utils::{char_len, truncate_with_marker};
use std::sync::Arc;
use tracing::{debug, warn};

/// Bounded documents block for an analysis prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisBlock {
    /// Prompt text, at most the budget in characters
    pub text: String,
    /// Documents included whole
    pub items_used: usize,
    /// Whether anything was dropped or cut
    pub truncated: bool,
}

/// Produces step analyses through the generative backend
pub struct StepAnalyzer {
    generative: Arc<dyn GenerativeBackend>,
    max_items: usize,
    char_budget: usize,
    max_output_tokens: u32,
}

impl StepAnalyzer {
    /// Create an analyzer
    pub fn new(
        generative: Arc<dyn GenerativeBackend>,
        max_items: usize,
        char_budget: usize,
        max_output_tokens: u32,
    ) -> Self {
        Self {
            generative,
            max_items,
            char_budget,
            max_output_tokens,
        }
    }

    /// Analyze a step's merged results
    ///
    /// # Arguments
    /// * `step_title` - Title of the step, used in the prompt
    /// * `merged` - Results of all sub-queries, merged per origin
    ///
    /// # Returns
    /// * `String` - The generated analysis, [`NO_RESULTS_FOUND`] for an empty
    ///   set, or a degraded message if generation failed
    pub async fn analyze(&self, step_title: &str, merged: &OriginResults) -> String {
        let documents = format_documents(merged);
        if documents.is_empty() {
            return NO_RESULTS_FOUND.to_string();
        }

        let block = build_analysis_block(&documents, self.max_items, self.char_budget);
        debug!(
            items_found = documents.len(),
            items_used = block.items_used,
            truncated = block.truncated,
            "Built analysis prompt"
        );

        let prompt = prompts::analysis_prompt(step_title, &block.text);
        match self.generative.complete(&prompt, self.max_output_tokens).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, items_found = documents.len(), "Step analysis failed, using degraded text");
                degraded_analysis(step_title, documents.len())
            }
        }
    }
}

/// Message used when the generative backend cannot analyze a step
pub fn degraded_analysis(step_title: &str, items_found: usize) -> String {
    format!(
        "Unable to generate an analysis for step '{}', but {} relevant results were found.",
        step_title, items_found
    )
}

/// One formatted document per item, origins in order
pub fn format_documents(merged: &OriginResults) -> Vec<String> {
    merged
        .iter()
        .flat_map(|(origin, items)| {
            items.iter().map(move |item| {
                format!(
                    "Title: {}\nSource: {}\nLink: {}\nContent: {}",
                    item.title, origin, item.link, item.snippet
                )
            })
        })
        .collect()
}

/// Fit documents into `budget` characters, at most `max_items` of them.
///
/// Documents are dropped whole. Only when the very first document alone
/// exceeds the budget is it cut mid-text. When anything is dropped or cut
/// the truncation marker is appended, and the total (marker included) never
/// exceeds `budget`.
pub fn build_analysis_block(documents: &[String], max_items: usize, budget: usize) -> AnalysisBlock {
    let separator_len = char_len(BLOCK_SEPARATOR);
    let marker_len = char_len(TRUNCATION_MARKER);

    let mut kept: Vec<(&str, usize)> = Vec::new();
    let mut used = 0;
    let mut truncated = documents.len() > max_items;

    for doc in documents.iter().take(max_items) {
        let len = char_len(doc) + separator_len;
        if used + len > budget {
            truncated = true;
            break;
        }
        used += len;
        kept.push((doc.as_str(), len));
    }

    if truncated {
        while used + marker_len > budget {
            match kept.pop() {
                Some((_, len)) => used -= len,
                None => break,
            }
        }
    }

    if kept.is_empty() {
        let Some(first) = documents.first() else {
            return AnalysisBlock {
                text: String::new(),
                items_used: 0,
                truncated: false,
            };
        };
        let (text, _) = truncate_with_marker(first, budget, TRUNCATION_MARKER);
        return AnalysisBlock {
            text,
            items_used: 0,
            truncated: true,
        };
    }

    let mut text = String::new();
    for (doc, _) in &kept {
        text.push_str(doc);
        text.push_str(BLOCK_SEPARATOR);
    }
    if truncated {
        text.push_str(TRUNCATION_MARKER);
    }
    AnalysisBlock {
        text,
        items_used: kept.len(),
        truncated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::GenerationError;
    use crate::orchestrator::types::SearchItem;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingBackend {
        prompts: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl GenerativeBackend for RecordingBackend {
        async fn complete(&self, prompt: &str, _max: u32) -> Result<String, GenerationError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            if self.fail {
                Err(GenerationError::Connection("down".to_string()))
            } else {
                Ok("analysis text".to_string())
            }
        }
    }

    fn backend(fail: bool) -> Arc<RecordingBackend> {
        Arc::new(RecordingBackend {
            prompts: Mutex::new(Vec::new()),
            fail,
        })
    }

    fn results(count: usize, snippet_len: usize) -> OriginResults {
        let items = (0..count)
            .map(|i| {
                SearchItem::new(
                    format!("title {}", i),
                    format!("http://example.com/{}", i),
                    "x".repeat(snippet_len),
                )
            })
            .collect();
        OriginResults::single("web", items)
    }

    #[tokio::test]
    async fn test_empty_results_skip_backend() {
        let generative = backend(false);
        let analyzer = StepAnalyzer::new(generative.clone(), 5, 2500, 100);
        let mut empty = OriginResults::new();
        empty.insert("web", vec![]);
        empty.insert("wikipedia", vec![]);

        assert_eq!(analyzer.analyze("Step", &empty).await, NO_RESULTS_FOUND);
        assert!(generative.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failure_degrades_with_count() {
        let analyzer = StepAnalyzer::new(backend(true), 5, 2500, 100);
        let text = analyzer.analyze("History", &results(7, 10)).await;
        assert_eq!(text, degraded_analysis("History", 7));
        assert!(text.contains("History"));
        assert!(text.contains('7'));
    }

    #[tokio::test]
    async fn test_prompt_respects_item_cap() {
        let generative = backend(false);
        let analyzer = StepAnalyzer::new(generative.clone(), 5, 100_000, 100);
        let text = analyzer.analyze("Step", &results(9, 10)).await;
        assert_eq!(text, "analysis text");

        let prompts = generative.prompts.lock().unwrap();
        assert!(prompts[0].contains("title 4"));
        assert!(!prompts[0].contains("title 5"));
        assert!(prompts[0].contains(TRUNCATION_MARKER));
    }

    #[test]
    fn test_block_fits_without_marker() {
        let docs = format_documents(&results(2, 10));
        let block = build_analysis_block(&docs, 5, 2500);
        assert!(!block.truncated);
        assert_eq!(block.items_used, 2);
        assert!(!block.text.contains(TRUNCATION_MARKER));
    }

    #[test]
    fn test_block_drops_whole_items_within_budget() {
        let docs = format_documents(&results(5, 600));
        let block = build_analysis_block(&docs, 5, 2500);
        assert!(block.truncated);
        assert!(block.items_used < 5);
        assert!(char_len(&block.text) <= 2500);
        assert!(block.text.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn test_block_cuts_oversized_first_item() {
        let docs = format_documents(&results(3, 5000));
        let block = build_analysis_block(&docs, 5, 2500);
        assert!(block.truncated);
        assert_eq!(block.items_used, 0);
        assert_eq!(char_len(&block.text), 2500);
        assert!(block.text.starts_with("Title: title 0"));
        assert!(block.text.ends_with(TRUNCATION_MARKER));
    }
}
