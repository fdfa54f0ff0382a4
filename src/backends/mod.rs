//! External collaborators
//!
//! The pipeline talks to two backends through the traits in this module: a
//! generative backend (prompt in, text out) and a retrieval backend (query in,
//! origin-tagged results out). Production implementations live in
//! [`deepseek`] and [`search`]; tests substitute their own.

pub mod deepseek;
pub mod deepseek_types;
pub mod error;
pub mod search;

use crate::orchestrator::types::{OriginResults, SearchItem};
use async_trait::async_trait;

pub use error::{GenerationError, RetrievalError};

/// Text generation backend
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Complete `prompt`, producing at most `max_output_tokens` tokens
    async fn complete(&self, prompt: &str, max_output_tokens: u32)
        -> Result<String, GenerationError>;
}

/// Search backend
///
/// Implementations may fail; the pipeline records a failed step when they do.
#[async_trait]
pub trait RetrievalBackend: Send + Sync {
    /// Multi-origin search, results grouped by origin tag
    async fn comprehensive(&self, query: &str) -> Result<OriginResults, RetrievalError>;

    /// General web search
    async fn web(&self, query: &str) -> Result<Vec<SearchItem>, RetrievalError>;

    /// Encyclopedic search
    async fn encyclopedic(&self, query: &str) -> Result<Vec<SearchItem>, RetrievalError>;
}
