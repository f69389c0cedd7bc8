//! Decoding parameters for model generation.

use serde::{Deserialize, Serialize};

/// Default token budget for a generated reply.
pub const DEFAULT_MAX_TOKENS: usize = 20;

/// Decoding options passed to the inference engine.
///
/// The defaults are greedy-leaning: `top_k = 1`, `top_p = 0.1` and a neutral
/// repetition penalty, so the same prompt tends to produce the same reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// Maximum number of tokens to generate.
    pub max_tokens: usize,

    /// Top-k sampling: only consider the k most likely tokens.
    pub top_k: usize,

    /// Nucleus sampling threshold.
    pub top_p: f32,

    /// Repetition penalty; 1.0 is neutral.
    pub repeat_penalty: f32,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self::deterministic(DEFAULT_MAX_TOKENS)
    }
}

impl GenerateOptions {
    /// Low-diversity decoding with the given token budget.
    pub fn deterministic(max_tokens: usize) -> Self {
        Self {
            max_tokens,
            top_k: 1,
            top_p: 0.1,
            repeat_penalty: 1.0,
        }
    }

    /// Set max tokens.
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set top-k sampling.
    pub fn top_k(mut self, k: usize) -> Self {
        self.top_k = k;
        self
    }

    /// Set top_p.
    pub fn top_p(mut self, top_p: f32) -> Self {
        self.top_p = top_p;
        self
    }

    /// Set repetition penalty.
    pub fn repeat_penalty(mut self, penalty: f32) -> Self {
        self.repeat_penalty = penalty;
        self
    }
}
