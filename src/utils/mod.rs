//! Common utilities and helper functions
//!
//! This module provides shared text helpers used across the relay.

pub mod error;

/// Truncate text to at most `max_chars` characters, appending `...` when cut
///
/// Counts characters, not bytes, so multi-byte text is never split mid-codepoint.
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

/// Join the first `count` whitespace-separated tokens of `text`
pub fn first_tokens(text: &str, count: usize) -> String {
    text.split_whitespace()
        .take(count)
        .collect::<Vec<_>>()
        .join(" ")
}
