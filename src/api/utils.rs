//! API utility functions

use crate::error::AppError;

/// Maximum query length in characters
pub const MAX_QUERY_LENGTH: usize = 10_000;

/// Validate a research query and return it trimmed
///
/// # Arguments
/// * `query` - Query string to validate
///
/// # Returns
/// * `Ok(&str)` - The trimmed query
/// * `Err(AppError)` - Query is empty or too long
pub fn validate_query(query: &str) -> Result<&str, AppError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidQuery("Query cannot be empty".to_string()));
    }
    if trimmed.chars().count() > MAX_QUERY_LENGTH {
        return Err(AppError::InvalidQuery(format!(
            "Query exceeds maximum length of {} characters",
            MAX_QUERY_LENGTH
        )));
    }
    Ok(trimmed)
}
