//! Research pipeline
//!
//! Drives one research run end to end: plan, execute each step in plan
//! order, synthesize the report, record the run in history. The run is a
//! lazily evaluated stream; dropping it cancels the run at the next await
//! point and nothing is written to history.
//!
//! Event grammar of a run:
//!
//! ```text
//! planning planning_step* plan
//!   ( step_start (search_progress search_result)* analysis_progress step_complete )*
//! report_generating ( report_complete | error )
//! ```

use crate::backends::{GenerativeBackend, RetrievalBackend};
use crate::orchestrator::analyzer::StepAnalyzer;
use crate::orchestrator::config::ResearchConfig;
use crate::orchestrator::constants::REPORT_FAILED_PREFIX;
use crate::orchestrator::dispatcher::SearchDispatcher;
use crate::orchestrator::executor::StepExecutor;
use crate::orchestrator::history::HistoryStore;
use crate::orchestrator::plan_parser;
use crate::orchestrator::planner::Planner;
use crate::orchestrator::report::ReportSynthesizer;
use crate::orchestrator::types::{ProgressEvent, ResearchRecord, StepResult};
use crate::orchestrator::utils::hash_query;
use async_stream::stream;
use futures_util::{pin_mut, FutureExt, Stream, StreamExt};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Runs research queries end to end
pub struct ResearchOrchestrator {
    planner: Planner,
    executor: StepExecutor,
    synthesizer: ReportSynthesizer,
    history: HistoryStore,
}

impl ResearchOrchestrator {
    /// Wire the pipeline stages over the given backends
    ///
    /// # Arguments
    /// * `generative` - Backend used for planning, analysis and reporting
    /// * `retrieval` - Backend used for every search
    /// * `config` - Budgets and limits
    /// * `history` - Store that receives one record per completed run
    pub fn new(
        generative: Arc<dyn GenerativeBackend>,
        retrieval: Arc<dyn RetrievalBackend>,
        config: &ResearchConfig,
        history: HistoryStore,
    ) -> Self {
        Self {
            planner: Planner::new(generative.clone(), config.plan_max_tokens),
            executor: StepExecutor::new(
                SearchDispatcher::new(retrieval, config.max_sources_per_origin),
                StepAnalyzer::new(
                    generative.clone(),
                    config.max_analysis_items,
                    config.analysis_char_budget,
                    config.analysis_max_tokens,
                ),
            ),
            synthesizer: ReportSynthesizer::new(
                generative,
                config.report_char_budget,
                config.report_max_tokens,
            ),
            history,
        }
    }

    /// History store shared with this pipeline
    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Stream a research run for `query`.
    ///
    /// Planning and step failures are absorbed into the events; the run still
    /// ends in `report_complete`. Only a failure of report synthesis itself
    /// or of the history store ends the run with an `error` event, and in
    /// that case no record is appended.
    pub fn run(self: Arc<Self>, query: String) -> impl Stream<Item = ProgressEvent> + Send + 'static {
        stream! {
            let query_hash = hash_query(&query);
            let started = Instant::now();
            info!(query_hash = %query_hash, "Starting research run");
            yield ProgressEvent::planning();

            let mut resolved = None;
            {
                let planning = self.planner.plan_stream(&query);
                pin_mut!(planning);
                while let Some(event) = planning.next().await {
                    if let Some(plan) = event.plan_payload() {
                        resolved = Some(plan.clone());
                    }
                    yield event;
                }
            }
            let plan = match resolved {
                Some(plan) => plan,
                None => {
                    let plan = plan_parser::default_plan(&query);
                    yield ProgressEvent::plan(plan.clone());
                    plan
                }
            };

            let mut results: Vec<StepResult> = Vec::with_capacity(plan.len());
            for step in plan.iter() {
                yield ProgressEvent::step_start(step);

                let mut finished = None;
                {
                    let step_events = self.executor.run_step(step);
                    pin_mut!(step_events);
                    while let Some(event) = step_events.next().await {
                        if let Some(result) = event.step_result_payload() {
                            finished = Some(result.clone());
                        }
                        yield event;
                    }
                }
                if let Some(result) = finished {
                    results.push(result);
                }
            }

            yield ProgressEvent::report_generating();

            let synthesis = AssertUnwindSafe(self.synthesizer.synthesize_outcome(&results, &query))
                .catch_unwind()
                .await;
            let outcome = match synthesis {
                Ok(outcome) => outcome,
                Err(panic) => {
                    let reason = panic_message(&*panic);
                    error!(query_hash = %query_hash, reason = %reason, "Report synthesis aborted");
                    yield ProgressEvent::error(format!("{}: {}", REPORT_FAILED_PREFIX, reason));
                    return;
                }
            };

            let fallback_report = outcome.is_fallback();
            let record = ResearchRecord::new(query.clone(), plan, results, outcome.into_report());
            match self.history.append(record.clone()) {
                Ok(total) => {
                    info!(
                        query_hash = %query_hash,
                        steps = record.results.len(),
                        fallback_report,
                        history_total = total,
                        duration_ms = started.elapsed().as_millis() as u64,
                        "Research run complete"
                    );
                    yield ProgressEvent::report_complete(record);
                }
                Err(e) => {
                    error!(query_hash = %query_hash, error = %e, "Failed to record research run");
                    yield ProgressEvent::error(format!("{}: {}", REPORT_FAILED_PREFIX, e));
                }
            }
        }
    }

    /// Run to completion and collect every event
    pub async fn run_to_completion(self: Arc<Self>, query: String) -> Vec<ProgressEvent> {
        self.run(query).collect().await
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{GenerationError, RetrievalError};
    use crate::orchestrator::types::{EventKind, OriginResults, SearchItem};
    use async_trait::async_trait;

    const PLAN: &str = r#"{"research_plan": [
        {"step": 1, "title": "One", "search_queries": ["a"]},
        {"step": 2, "title": "Two", "search_queries": ["b"]}
    ]}"#;

    /// Returns the plan for planning prompts, panics on report prompts
    struct PanickyReportBackend;

    #[async_trait]
    impl GenerativeBackend for PanickyReportBackend {
        async fn complete(&self, prompt: &str, _max: u32) -> Result<String, GenerationError> {
            if prompt.contains("research_plan") {
                Ok(PLAN.to_string())
            } else if prompt.starts_with("Write a research report") {
                panic!("report backend exploded");
            } else {
                Ok("analysis".to_string())
            }
        }
    }

    struct OneResult;

    #[async_trait]
    impl RetrievalBackend for OneResult {
        async fn comprehensive(&self, query: &str) -> Result<OriginResults, RetrievalError> {
            Ok(OriginResults::single(
                "web",
                vec![SearchItem::new(query, "http://x", "text")],
            ))
        }

        async fn web(&self, _query: &str) -> Result<Vec<SearchItem>, RetrievalError> {
            Ok(vec![])
        }

        async fn encyclopedic(&self, _query: &str) -> Result<Vec<SearchItem>, RetrievalError> {
            Ok(vec![])
        }
    }

    fn orchestrator(history: HistoryStore) -> Arc<ResearchOrchestrator> {
        Arc::new(ResearchOrchestrator::new(
            Arc::new(PanickyReportBackend),
            Arc::new(OneResult),
            &ResearchConfig::default(),
            history,
        ))
    }

    #[tokio::test]
    async fn test_report_panic_ends_with_error_and_no_record() {
        let history = HistoryStore::new();
        let events = orchestrator(history.clone())
            .run_to_completion("topic".to_string())
            .await;

        let last = events.last().unwrap();
        assert_eq!(last.kind, EventKind::Error);
        assert!(last.message.starts_with(REPORT_FAILED_PREFIX));
        assert!(last.message.contains("report backend exploded"));
        assert_eq!(
            events.iter().filter(|e| e.kind == EventKind::StepComplete).count(),
            2
        );
        assert!(history.is_empty().unwrap());
    }

    struct UnavailableBackend;

    #[async_trait]
    impl GenerativeBackend for UnavailableBackend {
        async fn complete(&self, _prompt: &str, _max: u32) -> Result<String, GenerationError> {
            Err(GenerationError::MissingApiKey)
        }
    }

    #[tokio::test]
    async fn test_poisoned_history_ends_with_error() {
        let history = HistoryStore::new();
        let poisoner = history.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.records.write().unwrap();
            panic!("poison");
        })
        .join();

        let orchestrator = Arc::new(ResearchOrchestrator::new(
            Arc::new(UnavailableBackend),
            Arc::new(OneResult),
            &ResearchConfig::default(),
            history,
        ));
        let events = orchestrator.run_to_completion("topic".to_string()).await;

        let last = events.last().unwrap();
        assert_eq!(last.kind, EventKind::Error);
        assert!(last.message.starts_with(REPORT_FAILED_PREFIX));
        assert!(events.iter().all(|e| e.kind != EventKind::ReportComplete));
        assert_eq!(
            events.iter().filter(|e| e.kind == EventKind::ReportGenerating).count(),
            1
        );
    }

    #[test]
    fn test_panic_message_extraction() {
        let payload: Box<dyn Any + Send> = Box::new("static message");
        assert_eq!(panic_message(payload.as_ref()), "static message");
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned message"));
        assert_eq!(panic_message(payload.as_ref()), "owned message");
        let payload: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }
}
