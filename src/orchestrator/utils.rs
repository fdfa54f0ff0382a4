//! Orchestrator utility functions
//!
//! Hashing for log correlation and character-safe truncation.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Compute a short hash for a research query
///
/// Returns an 8-character hexadecimal hash suitable for logging and tracing,
/// so raw queries never have to appear in logs.
///
/// # Arguments
/// * `query` - The query string to hash
///
/// # Returns
/// * `String` - 8-character hexadecimal hash
pub fn hash_query(query: &str) -> String {
    let mut hasher = DefaultHasher::new();
    query.hash(&mut hasher);
    format!("{:016x}", hasher.finish())[..8].to_string()
}

/// Number of Unicode scalar values in `text`
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Truncate `text` to at most `max_chars` characters, marker included.
///
/// Cuts on character boundaries only. When the text fits it is returned
/// unchanged and the flag is false.
///
/// # Arguments
/// * `text` - Text to truncate
/// * `max_chars` - Hard cap on the output length in characters
/// * `marker` - Appended after the cut
///
/// # Returns
/// * `(String, bool)` - The possibly truncated text and whether a cut happened
pub fn truncate_with_marker(text: &str, max_chars: usize, marker: &str) -> (String, bool) {
    if char_len(text) <= max_chars {
        return (text.to_string(), false);
    }
    let keep = max_chars.saturating_sub(char_len(marker));
    let mut truncated: String = text.chars().take(keep).collect();
    truncated.push_str(marker);
    (truncated, true)
}

/// Keep the first `max_chars` characters of `text`, appending `suffix` if anything was cut
pub fn clip_chars(text: &str, max_chars: usize, suffix: &str) -> String {
    if char_len(text) <= max_chars {
        return text.to_string();
    }
    let mut clipped: String = text.chars().take(max_chars).collect();
    clipped.push_str(suffix);
    clipped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_query_is_stable_and_short() {
        let a = hash_query("quantum computing");
        assert_eq!(a.len(), 8);
        assert_eq!(a, hash_query("quantum computing"));
        assert_ne!(a, hash_query("classical computing"));
    }

    #[test]
    fn test_truncate_keeps_short_text() {
        let (text, cut) = truncate_with_marker("hello", 10, "...");
        assert_eq!(text, "hello");
        assert!(!cut);
    }

    #[test]
    fn test_truncate_respects_cap_with_multibyte_text() {
        let input = "量子计算研究报告".repeat(20);
        let (text, cut) = truncate_with_marker(&input, 12, "...");
        assert!(cut);
        assert_eq!(char_len(&text), 12);
        assert!(text.ends_with("..."));
        assert!(text.starts_with("量子计算"));
    }

    #[test]
    fn test_clip_chars_appends_suffix_only_when_cut() {
        assert_eq!(clip_chars("abc", 5, "..."), "abc");
        assert_eq!(clip_chars("abcdef", 3, "..."), "abc...");
        assert_eq!(clip_chars("ééééé", 2, "…"), "éé…");
    }
}
