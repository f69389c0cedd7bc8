//! Pipeline reply types

use serde::{Deserialize, Serialize};

/// Which pipeline stage produced a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplySource {
    /// Served from the response cache.
    Cache,
    /// Canned reply from the pattern matcher.
    Quick,
    /// Generated by the model (or the gateway's error template).
    Model,
    /// Pipeline-level failure replaced by the fallback template.
    Fallback,
}

impl ReplySource {
    /// Label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplySource::Cache => "cache",
            ReplySource::Quick => "quick",
            ReplySource::Model => "model",
            ReplySource::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for ReplySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reply together with the stage that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub text: String,
    pub source: ReplySource,
}

impl Reply {
    pub fn new(text: impl Into<String>, source: ReplySource) -> Self {
        Self {
            text: text.into(),
            source,
        }
    }
}
