//! Orchestrator constants
//!
//! Centralized constants used throughout the research pipeline.

/// Analysis text used when a step's merged results hold no items
pub const NO_RESULTS_FOUND: &str = "No results found";

/// Analysis text used when a step produced no retrieval results at all
pub const NO_RELEVANT_RESULTS: &str = "No relevant results";

/// Marker appended to truncated prompt context
pub const TRUNCATION_MARKER: &str = "...\n\n[content truncated]";

/// Separator placed after each formatted document and step finding
pub const BLOCK_SEPARATOR: &str = "\n\n";

/// Origin tag for general web results
pub const ORIGIN_WEB: &str = "web";

/// Origin tag for encyclopedic results
pub const ORIGIN_WIKIPEDIA: &str = "wikipedia";

/// Prefix of the `error` event emitted when report synthesis aborts
pub const REPORT_FAILED_PREFIX: &str = "Report generation failed";
