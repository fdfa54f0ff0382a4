//! Backend error types

use thiserror::Error;

/// Errors from the generative (LLM) backend
#[derive(Error, Debug)]
pub enum GenerationError {
    /// No API key configured
    #[error("generative backend API key is not configured")]
    MissingApiKey,

    /// Request exceeded the configured timeout
    #[error("generative backend request timed out after {0} seconds")]
    Timeout(u64),

    /// Transport-level failure
    #[error("failed to connect to generative backend: {0}")]
    Connection(String),

    /// HTTP 429 from the provider
    #[error("generative backend rate limit exceeded (status {status}): {body}")]
    RateLimited {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },

    /// Any other non-success status
    #[error("generative backend returned status {status}: {body}")]
    Upstream {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },

    /// Body could not be parsed or held no content
    #[error("invalid response from generative backend: {0}")]
    InvalidResponse(String),
}

impl GenerationError {
    /// Transient failures worth retrying
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GenerationError::Timeout(_) | GenerationError::Connection(_)
        )
    }
}

/// Errors from the retrieval (search) backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RetrievalError {
    /// Request failed or timed out
    #[error("search request to {provider} failed: {message}")]
    Request {
        /// Provider name
        provider: String,
        /// Failure detail
        message: String,
    },

    /// Non-success HTTP status
    #[error("search provider {provider} returned status {status}")]
    Status {
        /// Provider name
        provider: String,
        /// HTTP status code
        status: u16,
    },

    /// Body could not be parsed
    #[error("invalid response from search provider {provider}: {message}")]
    InvalidResponse {
        /// Provider name
        provider: String,
        /// Parse error
        message: String,
    },
}
