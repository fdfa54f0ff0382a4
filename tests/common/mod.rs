//! Stub backends shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use deep_research_backend::backends::{
    GenerationError, GenerativeBackend, RetrievalBackend, RetrievalError,
};
use deep_research_backend::orchestrator::types::{EventKind, OriginResults, ProgressEvent, SearchItem};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Three-step plan wrapped in a fenced block, the way models usually answer
pub const FENCED_PLAN: &str = r#"Here is the plan:
```json
{
  "research_plan": [
    {"step": 1, "title": "Origins", "description": "History", "search_queries": ["origins one", "origins two"], "tool": "comprehensive_search", "expected_outcome": "Timeline"},
    {"step": 2, "title": "Current state", "description": "Today", "search_queries": ["state one", "state two"], "tool": "comprehensive_search", "expected_outcome": "Snapshot"},
    {"step": 3, "title": "Outlook", "description": "Future", "search_queries": ["outlook one"], "tool": "comprehensive_search", "expected_outcome": "Forecast"}
  ]
}
```"#;

/// Which kind of prompt the pipeline sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Plan,
    Analysis,
    Report,
}

pub fn classify(prompt: &str) -> PromptKind {
    if prompt.contains("\"research_plan\"") {
        PromptKind::Plan
    } else if prompt.starts_with("Write a research report") {
        PromptKind::Report
    } else {
        PromptKind::Analysis
    }
}

/// Generative stub with one canned answer per prompt kind; `None` fails
pub struct ScriptedGenerative {
    pub plan: Option<String>,
    pub analysis: Option<String>,
    pub report: Option<String>,
    pub plan_calls: AtomicUsize,
    pub analysis_calls: AtomicUsize,
    pub report_calls: AtomicUsize,
}

impl ScriptedGenerative {
    pub fn new(plan: Option<&str>, analysis: Option<&str>, report: Option<&str>) -> Self {
        Self {
            plan: plan.map(str::to_string),
            analysis: analysis.map(str::to_string),
            report: report.map(str::to_string),
            plan_calls: AtomicUsize::new(0),
            analysis_calls: AtomicUsize::new(0),
            report_calls: AtomicUsize::new(0),
        }
    }

    /// Always succeeds
    pub fn healthy() -> Self {
        Self::new(Some(FENCED_PLAN), Some("Solid analysis."), Some("# Generated report"))
    }

    /// Always fails
    pub fn unavailable() -> Self {
        Self::new(None, None, None)
    }

    pub fn calls(&self, kind: PromptKind) -> usize {
        match kind {
            PromptKind::Plan => self.plan_calls.load(Ordering::SeqCst),
            PromptKind::Analysis => self.analysis_calls.load(Ordering::SeqCst),
            PromptKind::Report => self.report_calls.load(Ordering::SeqCst),
        }
    }
}

#[async_trait]
impl GenerativeBackend for ScriptedGenerative {
    async fn complete(&self, prompt: &str, _max_output_tokens: u32) -> Result<String, GenerationError> {
        let (answer, counter) = match classify(prompt) {
            PromptKind::Plan => (&self.plan, &self.plan_calls),
            PromptKind::Analysis => (&self.analysis, &self.analysis_calls),
            PromptKind::Report => (&self.report, &self.report_calls),
        };
        counter.fetch_add(1, Ordering::SeqCst);
        answer
            .clone()
            .ok_or_else(|| GenerationError::Connection("stub backend unavailable".to_string()))
    }
}

/// Retrieval stub: one web item per query, nothing when `empty`, and an
/// error for every query listed in `failing`
pub struct StubRetrieval {
    pub empty: bool,
    pub failing: HashSet<String>,
    pub queries: std::sync::Mutex<Vec<String>>,
    pub calls: AtomicUsize,
}

impl StubRetrieval {
    pub fn with_results() -> Self {
        Self {
            empty: false,
            failing: HashSet::new(),
            queries: std::sync::Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn empty() -> Self {
        Self {
            empty: true,
            ..Self::with_results()
        }
    }

    pub fn failing_on(queries: &[&str]) -> Self {
        Self {
            failing: queries.iter().map(|q| q.to_string()).collect(),
            ..Self::with_results()
        }
    }

    pub fn failure_for(query: &str) -> RetrievalError {
        RetrievalError::Request {
            provider: "stub".to_string(),
            message: format!("no route for {}", query),
        }
    }

    pub fn seen_queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    fn items(&self, query: &str) -> Result<Vec<SearchItem>, RetrievalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.to_string());
        if self.failing.contains(query) {
            return Err(Self::failure_for(query));
        }
        if self.empty {
            return Ok(Vec::new());
        }
        Ok(vec![SearchItem::new(
            format!("About {}", query),
            format!("https://example.com/{}", query.replace(' ', "-")),
            format!("Findings for {}", query),
        )])
    }
}

#[async_trait]
impl RetrievalBackend for StubRetrieval {
    async fn comprehensive(&self, query: &str) -> Result<OriginResults, RetrievalError> {
        let mut results = OriginResults::new();
        results.insert("web", self.items(query)?);
        results.insert("wikipedia", Vec::new());
        Ok(results)
    }

    async fn web(&self, query: &str) -> Result<Vec<SearchItem>, RetrievalError> {
        self.items(query)
    }

    async fn encyclopedic(&self, query: &str) -> Result<Vec<SearchItem>, RetrievalError> {
        self.items(query)
    }
}

/// Check a run's events against the progress grammar:
///
/// planning planning_step* plan
///   (step_start (search_progress search_result)* analysis_progress step_complete)*
/// report_generating (report_complete | error)
pub fn assert_event_grammar(events: &[ProgressEvent]) {
    let kinds: Vec<EventKind> = events.iter().map(|e| e.kind).collect();
    let mut i = 0;
    let expect = |i: &mut usize, kind: EventKind| {
        assert_eq!(kinds.get(*i), Some(&kind), "unexpected event at {}: {:?}", i, kinds);
        *i += 1;
    };

    expect(&mut i, EventKind::Planning);
    while kinds.get(i) == Some(&EventKind::PlanningStep) {
        i += 1;
    }
    expect(&mut i, EventKind::Plan);

    while kinds.get(i) == Some(&EventKind::StepStart) {
        i += 1;
        while kinds.get(i) == Some(&EventKind::SearchProgress) {
            i += 1;
            expect(&mut i, EventKind::SearchResult);
        }
        expect(&mut i, EventKind::AnalysisProgress);
        expect(&mut i, EventKind::StepComplete);
    }

    expect(&mut i, EventKind::ReportGenerating);
    assert!(
        matches!(kinds.get(i), Some(EventKind::ReportComplete) | Some(EventKind::Error)),
        "run must end in report_complete or error: {:?}",
        kinds
    );
    assert_eq!(i + 1, kinds.len(), "events after the terminal event: {:?}", kinds);
}
