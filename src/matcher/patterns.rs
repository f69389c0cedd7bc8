//! Intent patterns and their canned replies.

use regex::Regex;
use serde::Deserialize;

use crate::{HuginnError, Result};

/// Built-in intent table, in priority order.
const BUILTIN: &[(&str, &[&str])] = &[
    (
        r"\b(hi|hello|hey)\b",
        &[
            "Hello! Ready to assist!",
            "Hi there! How can I help?",
            "Greetings! What can I do for you?",
        ],
    ),
    (
        r"\b(how are you|how's it going)\b",
        &[
            "Operating at peak efficiency!",
            "Ready to help!",
            "Functioning perfectly!",
        ],
    ),
    (
        r"\b(thanks|thank you)\b",
        &["You're welcome!", "Glad to help!", "Anytime!"],
    ),
    (
        r"\b(what is|what's|define)\b",
        &[
            "Let me explain: ",
            "Here's what you need to know: ",
            "Quick explanation: ",
        ],
    ),
    (
        r"\b(help|assist)\b",
        &[
            "I'll help with that: ",
            "Let me assist you: ",
            "Here's the solution: ",
        ],
    ),
];

/// Serializable form of a pattern, as written in config files.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PatternSpec {
    /// Regular expression, matched against the lowercased prompt.
    pub regex: String,
    /// Candidate replies, tried in order.
    pub replies: Vec<String>,
}

/// A compiled intent pattern with its candidate replies.
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
    replies: Vec<String>,
}

impl Pattern {
    /// Compile a pattern.
    ///
    /// Fails with `InvalidPattern` if the regex does not compile, there are
    /// no candidate replies, or a candidate is blank.
    pub fn new<I, S>(pattern: &str, replies: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let regex = Regex::new(pattern).map_err(|e| HuginnError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        let replies: Vec<String> = replies.into_iter().map(Into::into).collect();
        if replies.is_empty() {
            return Err(HuginnError::InvalidPattern {
                pattern: pattern.to_string(),
                message: "no candidate replies".to_string(),
            });
        }
        if replies.iter().any(|r| r.trim().is_empty()) {
            return Err(HuginnError::InvalidPattern {
                pattern: pattern.to_string(),
                message: "blank candidate reply".to_string(),
            });
        }
        Ok(Self { regex, replies })
    }

    /// Whether the pattern matches anywhere in `text`.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Candidate replies in priority order.
    pub fn replies(&self) -> &[String] {
        &self.replies
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

/// Ordered list of patterns. The first matching pattern wins.
#[derive(Debug, Clone, Default)]
pub struct PatternTable {
    patterns: Vec<Pattern>,
}

impl PatternTable {
    pub fn new(patterns: Vec<Pattern>) -> Self {
        Self { patterns }
    }

    /// A table with no patterns; every prompt goes past the matcher.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in greeting/thanks/help table.
    pub fn builtin() -> Self {
        let patterns = BUILTIN
            .iter()
            .map(|(regex, replies)| {
                Pattern::new(regex, replies.iter().copied()).expect("built-in pattern compiles")
            })
            .collect();
        Self { patterns }
    }

    /// Compile a table from config entries, keeping their order.
    pub fn from_specs(specs: &[PatternSpec]) -> Result<Self> {
        let patterns = specs
            .iter()
            .map(|spec| Pattern::new(&spec.regex, spec.replies.iter().cloned()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// First pattern matching `text`, if any.
    pub fn first_match(&self, text: &str) -> Option<&Pattern> {
        self.patterns.iter().find(|p| p.is_match(text))
    }

    /// Fail with `InvalidPattern` if any candidate reply is longer than
    /// `max_chars` characters.
    pub fn check_reply_length(&self, max_chars: usize) -> Result<()> {
        for pattern in &self.patterns {
            if let Some(reply) = pattern.replies.iter().find(|r| r.chars().count() > max_chars) {
                return Err(HuginnError::InvalidPattern {
                    pattern: pattern.as_str().to_string(),
                    message: format!(
                        "candidate reply has {} characters, limit is {max_chars}",
                        reply.chars().count()
                    ),
                });
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
