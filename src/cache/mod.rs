//! Caching subsystem.
//!
//! [`ResponseCache`] holds replies produced by the model, keyed on the
//! normalized prompt and fronted by a raw-prompt memo. Canned replies from
//! the [`PatternMatcher`](crate::matcher::PatternMatcher) never land here;
//! they have to rotate.

pub mod response;

pub use response::{CacheConfig, ResponseCache};

/// Normalized cache key for a prompt: trimmed and lowercased.
///
/// Deterministic, so any casing/whitespace variant of a prompt maps to the
/// same dictionary entry.
pub fn cache_key(prompt: &str) -> String {
    prompt.trim().to_lowercase()
}
