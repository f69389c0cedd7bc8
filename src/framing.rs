//! Persona framing for raw user input.
//!
//! Front-ends wrap what the user typed in a short persona template before
//! handing it to the pipeline. Quote characters are stripped from the input
//! first so it cannot break out of the template.

use serde::Deserialize;

/// Placeholder replaced by the user's input.
pub const INPUT_PLACEHOLDER: &str = "{input}";

/// Template used when framing is enabled without a custom template.
pub const DEFAULT_TEMPLATE: &str = "You are Huginn, an AI assistant. User: {input} Huginn:";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FramingConfig {
    /// Template containing `{input}`. Default: [`DEFAULT_TEMPLATE`].
    pub template: String,
}

impl Default for FramingConfig {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

/// Remove single and double quotes from user input.
pub fn sanitize_input(input: &str) -> String {
    input.chars().filter(|c| !matches!(c, '"' | '\'')).collect()
}

/// Substitute sanitized `input` into `template`.
///
/// A template without the placeholder gets the input appended after a space.
pub fn frame_prompt(template: &str, input: &str) -> String {
    let input = sanitize_input(input);
    if template.contains(INPUT_PLACEHOLDER) {
        template.replace(INPUT_PLACEHOLDER, &input)
    } else {
        format!("{template} {input}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_are_stripped() {
        assert_eq!(sanitize_input(r#"say "hi" it's me"#), "say hi its me");
    }

    #[test]
    fn default_template_wraps_input() {
        assert_eq!(
            frame_prompt(DEFAULT_TEMPLATE, "what's up"),
            "You are Huginn, an AI assistant. User: whats up Huginn:"
        );
    }

    #[test]
    fn template_without_placeholder_appends() {
        assert_eq!(frame_prompt("Answer briefly:", "why?"), "Answer briefly: why?");
    }
}
