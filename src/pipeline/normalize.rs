//! Prompt and reply normalization.

/// Reply substituted when the model produced nothing usable or the
/// pipeline itself failed.
pub const FALLBACK_TEMPLATE: &str = "I understand. Let me help you with that.";

/// Trim a prompt and cap it at `max_chars` characters before it goes to the model.
pub fn preprocess_prompt(prompt: &str, max_chars: usize) -> String {
    truncate_chars(prompt.trim(), max_chars).to_string()
}

/// Trim a generated reply and cap it at `max_chars` characters.
///
/// Blank output becomes [`FALLBACK_TEMPLATE`].
pub fn postprocess_reply(reply: &str, max_chars: usize) -> String {
    let trimmed = reply.trim();
    if trimmed.is_empty() {
        return FALLBACK_TEMPLATE.to_string();
    }
    let truncated = truncate_chars(trimmed, max_chars);
    if truncated.is_empty() {
        FALLBACK_TEMPLATE.to_string()
    } else {
        truncated.to_string()
    }
}

/// Longest prefix of `s` with at most `max_chars` characters.
fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
