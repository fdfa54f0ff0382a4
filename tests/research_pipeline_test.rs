//! Integration tests for the research pipeline
//!
//! These tests drive full runs over stub backends and verify:
//! 1. Event grammar and ordering
//! 2. Fallback plan and fallback report paths
//! 3. Step failure isolation
//! 4. History recording, cancellation and concurrent runs

mod common;

use common::{assert_event_grammar, PromptKind, ScriptedGenerative, StubRetrieval};
use deep_research_backend::orchestrator::config::ResearchConfig;
use deep_research_backend::orchestrator::constants::NO_RESULTS_FOUND;
use deep_research_backend::orchestrator::history::HistoryStore;
use deep_research_backend::orchestrator::pipeline::ResearchOrchestrator;
use deep_research_backend::orchestrator::plan_parser::default_plan;
use deep_research_backend::orchestrator::report::simple_report_at;
use deep_research_backend::orchestrator::types::{
    EventData, EventKind, PlanningPhase, ProgressEvent, ResearchRecord, StepStatus,
};
use futures_util::StreamExt;
use std::sync::atomic::Ordering;
use std::sync::Arc;

fn orchestrator(
    generative: Arc<ScriptedGenerative>,
    retrieval: Arc<StubRetrieval>,
    history: HistoryStore,
) -> Arc<ResearchOrchestrator> {
    Arc::new(ResearchOrchestrator::new(
        generative,
        retrieval,
        &ResearchConfig::default(),
        history,
    ))
}

fn final_record(events: &[ProgressEvent]) -> ResearchRecord {
    let last = events.last().expect("run produced no events");
    assert_eq!(last.kind, EventKind::ReportComplete, "last event: {:?}", last);
    last.record_payload().expect("report_complete without record").clone()
}

fn without_timestamp(report: &str) -> String {
    report
        .lines()
        .filter(|line| !line.starts_with("*Report generated at:"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Test 1: Happy path with a generated plan
///
/// Verifies:
/// - Event grammar
/// - Exactly one plan event, matching the record's plan
/// - One result per step, in plan order
/// - Generated report is used and recorded once
#[tokio::test]
async fn test_generated_plan_full_run() {
    let generative = Arc::new(ScriptedGenerative::healthy());
    let retrieval = Arc::new(StubRetrieval::with_results());
    let history = HistoryStore::new();

    let events = orchestrator(generative.clone(), retrieval.clone(), history.clone())
        .run_to_completion("solid state batteries".to_string())
        .await;

    assert_event_grammar(&events);
    let plans: Vec<_> = events.iter().filter_map(|e| e.plan_payload()).collect();
    assert_eq!(plans.len(), 1);

    let record = final_record(&events);
    assert_eq!(&record.plan, plans[0]);
    assert_eq!(record.plan.len(), 3);
    assert_eq!(record.results.len(), 3);
    for (step, result) in record.plan.iter().zip(record.results.iter()) {
        assert_eq!(step.step, result.step);
        assert_eq!(step.title, result.title);
        assert_eq!(result.status(), StepStatus::Completed);
        assert_eq!(result.analysis, "Solid analysis.");
    }
    assert_eq!(record.report, "# Generated report");
    assert_eq!(record.query, "solid state batteries");

    assert_eq!(generative.calls(PromptKind::Plan), 1);
    assert_eq!(generative.calls(PromptKind::Analysis), 3);
    assert_eq!(generative.calls(PromptKind::Report), 1);
    assert_eq!(retrieval.calls.load(Ordering::SeqCst), 5);
    assert_eq!(
        retrieval.seen_queries(),
        vec!["origins one", "origins two", "state one", "state two", "outlook one"]
    );

    let stored = history.list().unwrap();
    assert_eq!(stored, vec![record]);
}

/// Test 2: Retrieval returns nothing for every query
///
/// Verifies:
/// - Every step completes with the no-results analysis
/// - Analysis never reaches the generative backend
/// - Report falls back and lists every step title
#[tokio::test]
async fn test_empty_retrieval_produces_fallback_report() {
    let generative = Arc::new(ScriptedGenerative::healthy());
    let retrieval = Arc::new(StubRetrieval::empty());

    let events = orchestrator(generative.clone(), retrieval, HistoryStore::new())
        .run_to_completion("dark matter".to_string())
        .await;

    assert_event_grammar(&events);
    let record = final_record(&events);
    assert!(record
        .results
        .iter()
        .all(|r| r.status() == StepStatus::Completed && r.analysis == NO_RESULTS_FOUND));

    assert_eq!(generative.calls(PromptKind::Analysis), 0);
    assert_eq!(generative.calls(PromptKind::Report), 0);
    assert!(record.report.starts_with("# dark matter - Research Report"));
    for step in record.plan.iter() {
        assert!(record.report.contains(&step.title), "missing {}", step.title);
    }
}

/// Test 3: Generative backend is down for the whole run
///
/// Verifies:
/// - Planning goes through the fallback phases
/// - The plan equals the default plan
/// - Steps still complete with degraded analyses
/// - The report equals the fallback report (timestamp aside)
#[tokio::test]
async fn test_failing_generative_backend_uses_fallbacks() {
    let generative = Arc::new(ScriptedGenerative::unavailable());
    let retrieval = Arc::new(StubRetrieval::with_results());
    let history = HistoryStore::new();

    let events = orchestrator(generative, retrieval, history.clone())
        .run_to_completion("quantum computing".to_string())
        .await;

    assert_event_grammar(&events);
    let phases: Vec<PlanningPhase> = events
        .iter()
        .filter_map(|e| match &e.data {
            EventData::PlanningStep { step, .. } => Some(*step),
            _ => None,
        })
        .collect();
    assert!(phases.contains(&PlanningPhase::FallbackPlan));
    assert!(phases.contains(&PlanningPhase::DefaultReady));
    assert!(!phases.contains(&PlanningPhase::PlanReady));

    let record = final_record(&events);
    assert_eq!(record.plan, default_plan("quantum computing"));
    assert!(record.results.iter().all(|r| r.is_completed()));
    assert!(record.results[0].analysis.contains(&record.results[0].title));

    let expected = simple_report_at(&record.results, "quantum computing", record.timestamp);
    assert_eq!(without_timestamp(&record.report), without_timestamp(&expected));
    assert_eq!(history.len().unwrap(), 1);
}

/// Test 4: One query fails mid-plan
///
/// Verifies:
/// - The failing step is marked failed with the error text
/// - Remaining queries of that step are skipped
/// - Later steps still run and the run ends in report_complete
#[tokio::test]
async fn test_failing_query_fails_only_its_step() {
    let generative = Arc::new(ScriptedGenerative::healthy());
    let retrieval = Arc::new(StubRetrieval::failing_on(&["state one"]));

    let events = orchestrator(generative, retrieval.clone(), HistoryStore::new())
        .run_to_completion("fusion".to_string())
        .await;

    assert_event_grammar(&events);
    let record = final_record(&events);

    let statuses: Vec<StepStatus> = record.results.iter().map(|r| r.status()).collect();
    assert_eq!(
        statuses,
        vec![StepStatus::Completed, StepStatus::Failed, StepStatus::Completed]
    );
    assert_eq!(
        record.results[1].analysis,
        StubRetrieval::failure_for("state one").to_string()
    );

    let seen = retrieval.seen_queries();
    assert!(!seen.contains(&"state two".to_string()));
    assert!(seen.contains(&"outlook one".to_string()));

    let failed_event = events
        .iter()
        .find(|e| e.kind == EventKind::StepComplete && e.step_result_payload().map(|r| r.step) == Some(2))
        .unwrap();
    assert!(failed_event.message.contains("Current state"));
}

/// Test 5: Dropping the stream cancels the run
///
/// Verifies:
/// - No retrieval happens after the consumer stops at the plan event
/// - Nothing is appended to history
#[tokio::test]
async fn test_dropping_stream_cancels_run() {
    let generative = Arc::new(ScriptedGenerative::healthy());
    let retrieval = Arc::new(StubRetrieval::with_results());
    let history = HistoryStore::new();

    {
        let events = orchestrator(generative, retrieval.clone(), history.clone())
            .run("cancel me".to_string());
        futures_util::pin_mut!(events);
        while let Some(event) = events.next().await {
            if event.kind == EventKind::Plan {
                break;
            }
        }
    }

    assert_eq!(retrieval.calls.load(Ordering::SeqCst), 0);
    assert!(history.is_empty().unwrap());
}

/// Test 6: Concurrent runs share one history
#[tokio::test]
async fn test_concurrent_runs_append_independently() {
    let history = HistoryStore::new();
    let pipeline = orchestrator(
        Arc::new(ScriptedGenerative::healthy()),
        Arc::new(StubRetrieval::with_results()),
        history.clone(),
    );

    let (first, second) = tokio::join!(
        pipeline.clone().run_to_completion("first topic".to_string()),
        pipeline.clone().run_to_completion("second topic".to_string()),
    );
    assert_event_grammar(&first);
    assert_event_grammar(&second);

    let mut queries: Vec<String> = history
        .list()
        .unwrap()
        .into_iter()
        .map(|r| r.query)
        .collect();
    queries.sort();
    assert_eq!(queries, vec!["first topic", "second topic"]);
}

/// Test 7: An unparsable plan falls back without a parse-phase error
#[tokio::test]
async fn test_unparsable_plan_falls_back() {
    let generative = Arc::new(ScriptedGenerative::new(
        Some("I'd rather write prose than JSON."),
        Some("analysis"),
        Some("report"),
    ));
    let events = orchestrator(
        generative,
        Arc::new(StubRetrieval::with_results()),
        HistoryStore::new(),
    )
    .run_to_completion("tidal energy".to_string())
    .await;

    assert_event_grammar(&events);
    let record = final_record(&events);
    assert_eq!(record.plan, default_plan("tidal energy"));
    assert_eq!(record.report, "report");
}
