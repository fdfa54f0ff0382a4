//! Step execution
//!
//! Runs one research step: every sub-query in order, then one analysis over
//! the merged results. Progress is streamed as
//! `(search_progress search_result)* analysis_progress step_complete`.

use crate::orchestrator::analyzer::StepAnalyzer;
use crate::orchestrator::constants::NO_RELEVANT_RESULTS;
use crate::orchestrator::dispatcher::{merge_result_maps, SearchDispatcher};
use crate::orchestrator::types::{ProgressEvent, ResearchStep, StepResult};
use async_stream::stream;
use futures_util::{pin_mut, Stream, StreamExt};
use tracing::{info, warn};

/// Executes research steps
pub struct StepExecutor {
    dispatcher: SearchDispatcher,
    analyzer: StepAnalyzer,
}

impl StepExecutor {
    /// Create an executor
    pub fn new(dispatcher: SearchDispatcher, analyzer: StepAnalyzer) -> Self {
        Self {
            dispatcher,
            analyzer,
        }
    }

    /// Stream the execution of `step`.
    ///
    /// A dispatch failure stops the remaining sub-queries, skips analysis and
    /// marks the step failed with the error text as its analysis. The final
    /// event is always `step_complete` carrying the result.
    pub fn run_step<'a>(
        &'a self,
        step: &'a ResearchStep,
    ) -> impl Stream<Item = ProgressEvent> + Send + 'a {
        stream! {
            let mut result = StepResult::start(step);
            let total = step.search_queries.len();
            let mut failure = None;

            for (index, query) in step.search_queries.iter().enumerate() {
                yield ProgressEvent::search_progress(query, index + 1, total);

                match self.dispatcher.dispatch_query(step.tool, query).await {
                    Ok(found) => {
                        let sources = self.dispatcher.extract_sources(&found, query);
                        let result_count = found.total_items();
                        result.search_sources.extend(sources.iter().cloned());
                        result.search_results.insert(query.clone(), found);
                        yield ProgressEvent::search_result(query, sources, result_count);
                    }
                    Err(e) => {
                        warn!(step = step.step, error = %e, "Search dispatch failed, failing step");
                        let message = e.to_string();
                        yield ProgressEvent::search_failed(query, &message);
                        failure = Some(message);
                        break;
                    }
                }
            }

            match failure {
                Some(message) => {
                    yield ProgressEvent::analysis_skipped();
                    result.fail(message);
                }
                None => {
                    yield ProgressEvent::analysis_progress();
                    let analysis = if result.search_results.is_empty() {
                        NO_RELEVANT_RESULTS.to_string()
                    } else {
                        let merged = merge_result_maps(result.search_results.values());
                        self.analyzer.analyze(&step.title, &merged).await
                    };
                    result.complete(analysis);
                }
            }

            info!(
                step = result.step,
                status = ?result.status(),
                sources = result.search_sources.len(),
                "Research step finished"
            );
            yield ProgressEvent::step_complete(result);
        }
    }

    /// Run `step` to completion and return its result
    pub async fn execute_step(&self, step: &ResearchStep) -> StepResult {
        let events = self.run_step(step);
        pin_mut!(events);
        let mut outcome = None;
        while let Some(event) = events.next().await {
            if let Some(result) = event.step_result_payload() {
                outcome = Some(result.clone());
            }
        }
        outcome.unwrap_or_else(|| {
            let mut result = StepResult::start(step);
            result.fail("step ended without a result".to_string());
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{
        GenerationError, GenerativeBackend, RetrievalBackend, RetrievalError,
    };
    use crate::orchestrator::constants::NO_RESULTS_FOUND;
    use crate::orchestrator::types::{
        EventKind, OriginResults, SearchItem, SearchTool, StepStatus,
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct EchoBackend;

    #[async_trait]
    impl GenerativeBackend for EchoBackend {
        async fn complete(&self, _prompt: &str, _max: u32) -> Result<String, GenerationError> {
            Ok("analysis".to_string())
        }
    }

    /// Fails on the query "bad", empty results on "empty"
    struct ScriptedRetrieval {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RetrievalBackend for ScriptedRetrieval {
        async fn comprehensive(&self, query: &str) -> Result<OriginResults, RetrievalError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match query {
                "bad" => Err(RetrievalError::Request {
                    provider: "stub".to_string(),
                    message: "boom".to_string(),
                }),
                "empty" => Ok(OriginResults::single("web", vec![])),
                _ => Ok(OriginResults::single(
                    "web",
                    vec![SearchItem::new(query, format!("http://{}", query), "text")],
                )),
            }
        }

        async fn web(&self, query: &str) -> Result<Vec<SearchItem>, RetrievalError> {
            Ok(vec![SearchItem::new(query, "http://web", "")])
        }

        async fn encyclopedic(&self, _query: &str) -> Result<Vec<SearchItem>, RetrievalError> {
            Ok(vec![])
        }
    }

    fn executor(retrieval: Arc<ScriptedRetrieval>) -> StepExecutor {
        let generative: Arc<dyn GenerativeBackend> = Arc::new(EchoBackend);
        StepExecutor::new(
            SearchDispatcher::new(retrieval, 3),
            StepAnalyzer::new(generative, 5, 2500, 100),
        )
    }

    fn step(queries: &[&str]) -> ResearchStep {
        ResearchStep {
            step: 1,
            title: "Step one".to_string(),
            description: String::new(),
            tool: SearchTool::Comprehensive,
            search_queries: queries.iter().map(|q| q.to_string()).collect(),
            expected_outcome: String::new(),
        }
    }

    fn retrieval() -> Arc<ScriptedRetrieval> {
        Arc::new(ScriptedRetrieval {
            calls: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_successful_step_event_order() {
        let executor = executor(retrieval());
        let step = step(&["a", "b"]);
        let kinds: Vec<EventKind> = executor
            .run_step(&step)
            .map(|e| e.kind)
            .collect()
            .await;
        assert_eq!(
            kinds,
            vec![
                EventKind::SearchProgress,
                EventKind::SearchResult,
                EventKind::SearchProgress,
                EventKind::SearchResult,
                EventKind::AnalysisProgress,
                EventKind::StepComplete
            ]
        );

        let result = executor.execute_step(&step).await;
        assert_eq!(result.status(), StepStatus::Completed);
        assert_eq!(result.analysis, "analysis");
        assert_eq!(result.search_results.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(result.search_sources.len(), 2);
    }

    #[tokio::test]
    async fn test_failure_stops_remaining_queries() {
        let retrieval = retrieval();
        let executor = executor(retrieval.clone());
        let result = executor.execute_step(&step(&["a", "bad", "c"])).await;

        assert_eq!(result.status(), StepStatus::Failed);
        assert_eq!(
            result.analysis,
            RetrievalError::Request {
                provider: "stub".to_string(),
                message: "boom".to_string()
            }
            .to_string()
        );
        assert_eq!(retrieval.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_results_and_no_queries() {
        let executor = executor(retrieval());

        let result = executor.execute_step(&step(&["empty"])).await;
        assert_eq!(result.status(), StepStatus::Completed);
        assert_eq!(result.analysis, NO_RESULTS_FOUND);

        let result = executor.execute_step(&step(&[])).await;
        assert_eq!(result.status(), StepStatus::Completed);
        assert_eq!(result.analysis, NO_RELEVANT_RESULTS);
    }
}
