//! Research data model
//!
//! Typed records for plans, step results, history records and the progress
//! events streamed to callers. Every payload that crosses the event stream is
//! one of the closed set of shapes in [`EventData`].

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Retrieval tool requested by a research step
///
/// Serialized with the names the planning prompt offers the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum SearchTool {
    /// Multi-origin search (general web + encyclopedic) in one round trip
    #[default]
    #[serde(rename = "comprehensive_search")]
    Comprehensive,
    /// General web search only
    #[serde(rename = "web_search")]
    PrimaryWeb,
    /// Encyclopedic search only
    #[serde(rename = "wikipedia_search")]
    Encyclopedic,
}

impl SearchTool {
    /// Resolve a tool name as written by the planner model.
    ///
    /// Unknown names resolve to [`SearchTool::Comprehensive`].
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "primary_web" | "web" | "web_search" | "google_search" => SearchTool::PrimaryWeb,
            "encyclopedic" | "wikipedia" | "wikipedia_search" => SearchTool::Encyclopedic,
            _ => SearchTool::Comprehensive,
        }
    }

    /// Wire name, as offered in the planning prompt
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchTool::Comprehensive => "comprehensive_search",
            SearchTool::PrimaryWeb => "web_search",
            SearchTool::Encyclopedic => "wikipedia_search",
        }
    }
}

fn deserialize_tool<'de, D>(deserializer: D) -> Result<SearchTool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .map(SearchTool::from_name)
        .unwrap_or_default())
}

/// Step numbers are renumbered after parsing, so anything that is not a
/// non-negative integer (`"1"`, `1.0`, `null`) becomes 0 instead of failing.
fn deserialize_step_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(serde_json::Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or_default())
}

/// One planned unit of investigation
///
/// Missing fields in a generated plan deserialize to their empty defaults
/// instead of failing the whole plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchStep {
    /// 1-based position in the plan
    #[serde(default, deserialize_with = "deserialize_step_number")]
    pub step: u32,
    /// Short title of the step
    #[serde(default)]
    pub title: String,
    /// What the step investigates
    #[serde(default)]
    pub description: String,
    /// Retrieval tool used for every sub-query of this step
    #[serde(default, deserialize_with = "deserialize_tool")]
    pub tool: SearchTool,
    /// Sub-queries, executed in order
    #[serde(default)]
    pub search_queries: Vec<String>,
    /// What the step is expected to yield
    #[serde(default)]
    pub expected_outcome: String,
}

/// Ordered list of research steps. Plan order is execution order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResearchPlan {
    /// Steps in execution order
    pub steps: Vec<ResearchStep>,
}

impl ResearchPlan {
    /// Wrap a list of steps
    pub fn new(steps: Vec<ResearchStep>) -> Self {
        Self { steps }
    }

    /// Number of steps
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// True when the plan has no steps
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Iterate over steps in plan order
    pub fn iter(&self) -> std::slice::Iter<'_, ResearchStep> {
        self.steps.iter()
    }

    /// Rewrite step numbers so they equal index + 1.
    ///
    /// Returns true if any number changed.
    pub fn renumber(&mut self) -> bool {
        let mut changed = false;
        for (index, step) in self.steps.iter_mut().enumerate() {
            let expected = index as u32 + 1;
            if step.step != expected {
                step.step = expected;
                changed = true;
            }
        }
        changed
    }
}

/// A raw retrieval result item
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchItem {
    /// Result title
    #[serde(default)]
    pub title: String,
    /// Result URL
    #[serde(default)]
    pub link: String,
    /// Short excerpt of the result content
    #[serde(default)]
    pub snippet: String,
}

impl SearchItem {
    /// Create a new item
    pub fn new(
        title: impl Into<String>,
        link: impl Into<String>,
        snippet: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            snippet: snippet.into(),
        }
    }

    /// An item can be cited only when it has both a title and a link
    pub fn is_citable(&self) -> bool {
        !self.title.trim().is_empty() && !self.link.trim().is_empty()
    }
}

/// String-keyed map that keeps first-insertion order and serializes as a JSON object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V> OrderedMap<V> {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, replacing an existing key in place
    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Look up a value by key
    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Mutable value for `key`, inserting `V::default()` at the end when absent
    pub fn entry_or_default(&mut self, key: &str) -> &mut V
    where
        V: Default,
    {
        let index = match self.entries.iter().position(|(k, _)| k == key) {
            Some(index) => index,
            None => {
                self.entries.push((key.to_string(), V::default()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[index].1
    }

    /// Iterate over entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate over keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Iterate over values in insertion order
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when there are no keys
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> FromIterator<(String, V)> for OrderedMap<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        let mut map = OrderedMap::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Retrieval results for one query: origin tag -> ordered items
pub type OriginResults = OrderedMap<Vec<SearchItem>>;

/// Retrieval results for a whole step: sub-query -> origin results
pub type QueryResults = OrderedMap<OriginResults>;

impl OrderedMap<Vec<SearchItem>> {
    /// Results under a single origin tag
    pub fn single(origin: impl Into<String>, items: Vec<SearchItem>) -> Self {
        let mut map = OrderedMap::new();
        map.insert(origin, items);
        map
    }

    /// Total number of items across all origins
    pub fn total_items(&self) -> usize {
        self.values().map(Vec::len).sum()
    }
}

/// A citation-worthy source extracted from retrieval results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSource {
    /// Result title
    pub title: String,
    /// Result URL
    pub link: String,
    /// Origin tag (e.g. "web", "wikipedia")
    pub source: String,
    /// Sub-query that found it
    pub query: String,
}

/// Lifecycle status of a step result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Step is running
    Executing,
    /// Step finished (possibly with a degraded analysis)
    Completed,
    /// Search dispatch failed
    Failed,
}

/// Outcome of executing one research step
///
/// The status only moves `Executing -> Completed` or `Executing -> Failed`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepResult {
    /// Mirrors the source step number
    pub step: u32,
    /// Mirrors the source step title
    pub title: String,
    status: StepStatus,
    /// Raw retrieval results per sub-query
    pub search_results: QueryResults,
    /// Sources extracted across all sub-queries
    pub search_sources: Vec<SearchSource>,
    /// Natural-language analysis, or the error message when failed
    pub analysis: String,
    /// When the step started
    pub timestamp: DateTime<Utc>,
}

impl StepResult {
    /// Start a result for `step` with status `Executing`
    pub fn start(step: &ResearchStep) -> Self {
        Self {
            step: step.step,
            title: step.title.clone(),
            status: StepStatus::Executing,
            search_results: QueryResults::new(),
            search_sources: Vec::new(),
            analysis: String::new(),
            timestamp: Utc::now(),
        }
    }

    /// Current status
    pub fn status(&self) -> StepStatus {
        self.status
    }

    /// True when the step completed
    pub fn is_completed(&self) -> bool {
        self.status == StepStatus::Completed
    }

    /// Mark the step completed. Ignored unless currently executing.
    pub fn complete(&mut self, analysis: String) -> bool {
        if self.status != StepStatus::Executing {
            return false;
        }
        self.analysis = analysis;
        self.status = StepStatus::Completed;
        true
    }

    /// Mark the step failed. Ignored unless currently executing.
    pub fn fail(&mut self, message: String) -> bool {
        if self.status != StepStatus::Executing {
            return false;
        }
        self.analysis = message;
        self.status = StepStatus::Failed;
        true
    }
}

/// Summary of one completed research run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResearchRecord {
    /// The submitted query
    pub query: String,
    /// The plan that was executed
    pub plan: ResearchPlan,
    /// One result per plan step, in plan order
    pub results: Vec<StepResult>,
    /// Final report text
    pub report: String,
    /// When the run finished
    pub timestamp: DateTime<Utc>,
}

impl ResearchRecord {
    /// Build a record stamped with the current time
    pub fn new(
        query: String,
        plan: ResearchPlan,
        results: Vec<StepResult>,
        report: String,
    ) -> Self {
        Self {
            query,
            plan,
            results,
            report,
            timestamp: Utc::now(),
        }
    }
}

/// Event type tag, serialized as the `type` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Planning started
    Planning,
    /// Planning sub-phase
    PlanningStep,
    /// Resolved plan
    Plan,
    /// A step is about to execute
    StepStart,
    /// A sub-query search is starting
    SearchProgress,
    /// A sub-query search finished
    SearchResult,
    /// Step analysis is starting
    AnalysisProgress,
    /// A step finished
    StepComplete,
    /// Report synthesis started
    ReportGenerating,
    /// Run finished; carries the history record
    ReportComplete,
    /// Run aborted
    Error,
}

impl EventKind {
    /// Wire name of the event type
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Planning => "planning",
            EventKind::PlanningStep => "planning_step",
            EventKind::Plan => "plan",
            EventKind::StepStart => "step_start",
            EventKind::SearchProgress => "search_progress",
            EventKind::SearchResult => "search_result",
            EventKind::AnalysisProgress => "analysis_progress",
            EventKind::StepComplete => "step_complete",
            EventKind::ReportGenerating => "report_generating",
            EventKind::ReportComplete => "report_complete",
            EventKind::Error => "error",
        }
    }
}

/// Planning sub-phases reported through `planning_step` events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanningPhase {
    /// Looking at the topic
    AnalyzingTopic,
    /// Waiting on the generative backend
    CallingAi,
    /// Parsing the generated plan
    ParsingPlan,
    /// Generated plan accepted
    PlanReady,
    /// Generation failed, switching to the default plan
    FallbackPlan,
    /// Default plan ready
    DefaultReady,
}

/// Event payloads. Serialized untagged; `Empty` becomes `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EventData {
    /// No payload
    Empty,
    /// Planning phase marker, with the plan once one is available
    PlanningStep {
        /// Phase identifier
        step: PlanningPhase,
        /// Plan preview for the `plan_ready` / `default_ready` phases
        #[serde(skip_serializing_if = "Option::is_none")]
        plan_preview: Option<ResearchPlan>,
    },
    /// The resolved plan
    Plan(ResearchPlan),
    /// The step about to start
    Step(ResearchStep),
    /// Search progress within a step
    SearchProgress {
        /// Sub-query being searched
        query: String,
        /// 1-based index of the sub-query
        step: usize,
        /// Number of sub-queries in the step
        total: usize,
    },
    /// Search outcome for one sub-query
    SearchResult {
        /// Sub-query that was searched
        query: String,
        /// Sources extracted from the results
        sources: Vec<SearchSource>,
        /// Number of raw items returned across origins
        result_count: usize,
    },
    /// Finished step
    StepResult(Box<StepResult>),
    /// Finished run
    Record(Box<ResearchRecord>),
}

/// One message of the outbound progress stream
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressEvent {
    /// Event type
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Human-readable status line
    pub message: String,
    /// Type-dependent payload
    pub data: EventData,
}

impl ProgressEvent {
    /// Create an event
    pub fn new(kind: EventKind, message: impl Into<String>, data: EventData) -> Self {
        Self {
            kind,
            message: message.into(),
            data,
        }
    }

    /// Run start marker
    pub fn planning() -> Self {
        Self::new(
            EventKind::Planning,
            "Drafting research plan...",
            EventData::Empty,
        )
    }

    /// Planning phase marker
    pub fn planning_step(
        phase: PlanningPhase,
        message: impl Into<String>,
        plan_preview: Option<ResearchPlan>,
    ) -> Self {
        Self::new(
            EventKind::PlanningStep,
            message,
            EventData::PlanningStep {
                step: phase,
                plan_preview,
            },
        )
    }

    /// Resolved plan
    pub fn plan(plan: ResearchPlan) -> Self {
        Self::new(EventKind::Plan, "Research plan ready", EventData::Plan(plan))
    }

    /// Step start marker
    pub fn step_start(step: &ResearchStep) -> Self {
        Self::new(
            EventKind::StepStart,
            format!("Starting: {}", step.title),
            EventData::Step(step.clone()),
        )
    }

    /// Sub-query search starting
    pub fn search_progress(query: &str, index: usize, total: usize) -> Self {
        Self::new(
            EventKind::SearchProgress,
            format!("Searching: {}", query),
            EventData::SearchProgress {
                query: query.to_string(),
                step: index,
                total,
            },
        )
    }

    /// Sub-query search finished
    pub fn search_result(query: &str, sources: Vec<SearchSource>, result_count: usize) -> Self {
        Self::new(
            EventKind::SearchResult,
            format!("Found {} results", result_count),
            EventData::SearchResult {
                query: query.to_string(),
                sources,
                result_count,
            },
        )
    }

    /// Sub-query search failed; closes the search pair with no results
    pub fn search_failed(query: &str, error: &str) -> Self {
        Self::new(
            EventKind::SearchResult,
            format!("Search failed: {}", error),
            EventData::SearchResult {
                query: query.to_string(),
                sources: Vec::new(),
                result_count: 0,
            },
        )
    }

    /// Analysis starting
    pub fn analysis_progress() -> Self {
        Self::new(
            EventKind::AnalysisProgress,
            "Analyzing search results...",
            EventData::Empty,
        )
    }

    /// Analysis skipped because the step failed
    pub fn analysis_skipped() -> Self {
        Self::new(
            EventKind::AnalysisProgress,
            "Skipping analysis: search failed",
            EventData::Empty,
        )
    }

    /// Step finished
    pub fn step_complete(result: StepResult) -> Self {
        let message = match result.status() {
            StepStatus::Failed => format!("Step failed: {}", result.title),
            _ => format!("Completed: {}", result.title),
        };
        Self::new(
            EventKind::StepComplete,
            message,
            EventData::StepResult(Box::new(result)),
        )
    }

    /// Report synthesis starting
    pub fn report_generating() -> Self {
        Self::new(
            EventKind::ReportGenerating,
            "Generating final research report...",
            EventData::Empty,
        )
    }

    /// Run finished
    pub fn report_complete(record: ResearchRecord) -> Self {
        Self::new(
            EventKind::ReportComplete,
            "Research complete",
            EventData::Record(Box::new(record)),
        )
    }

    /// Run aborted
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(EventKind::Error, message, EventData::Empty)
    }

    /// Plan carried by a `plan` event
    pub fn plan_payload(&self) -> Option<&ResearchPlan> {
        match (&self.kind, &self.data) {
            (EventKind::Plan, EventData::Plan(plan)) => Some(plan),
            _ => None,
        }
    }

    /// Step result carried by a `step_complete` event
    pub fn step_result_payload(&self) -> Option<&StepResult> {
        match &self.data {
            EventData::StepResult(result) => Some(result),
            _ => None,
        }
    }

    /// Record carried by a `report_complete` event
    pub fn record_payload(&self) -> Option<&ResearchRecord> {
        match &self.data {
            EventData::Record(record) => Some(record),
            _ => None,
        }
    }

    /// True for `report_complete` and `error`
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, EventKind::ReportComplete | EventKind::Error)
    }
}
