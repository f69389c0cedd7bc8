//! Builder for configuring pipeline instances

use std::sync::Arc;
use std::time::Duration;

use super::{DEFAULT_CACHE_WORTHY, Limits, Pipeline};
use crate::cache::{CacheConfig, ResponseCache};
use crate::gateway::{GatewayConfig, ModelGateway};
use crate::matcher::{DEFAULT_RECENT_WINDOW, PatternMatcher, PatternTable};
use crate::traits::InferenceEngine;
use crate::{HuginnError, Result};

/// Main entry point for creating pipeline instances.
pub struct Huginn;

impl Huginn {
    /// Create a new builder for configuring the pipeline.
    pub fn builder() -> HuginnBuilder {
        HuginnBuilder::new()
    }
}

/// Builder for configuring pipeline instances.
pub struct HuginnBuilder {
    engine: Option<Arc<dyn InferenceEngine>>,
    gateway: GatewayConfig,
    cache: CacheConfig,
    patterns: PatternTable,
    recent_window: usize,
    limits: Limits,
    cache_worthy: Duration,
}

impl HuginnBuilder {
    pub fn new() -> Self {
        Self {
            engine: None,
            gateway: GatewayConfig::default(),
            cache: CacheConfig::default(),
            patterns: PatternTable::builtin(),
            recent_window: DEFAULT_RECENT_WINDOW,
            limits: Limits::default(),
            cache_worthy: DEFAULT_CACHE_WORTHY,
        }
    }

    /// Use a custom inference engine.
    pub fn engine(mut self, engine: Arc<dyn InferenceEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Use an Ollama server at `url`.
    #[cfg(feature = "ollama")]
    pub fn ollama(self, url: impl Into<String>) -> Self {
        self.engine(Arc::new(crate::providers::OllamaEngine::with_base_url(url)))
    }

    /// Model identifier handed to the engine.
    pub fn model(mut self, name: impl Into<String>) -> Self {
        self.gateway.name = name.into();
        self
    }

    /// Replace all model settings at once.
    pub fn gateway_config(mut self, config: GatewayConfig) -> Self {
        self.gateway = config;
        self
    }

    /// Token budget per generated reply.
    pub fn max_tokens(mut self, n: usize) -> Self {
        self.gateway.max_tokens = n;
        self
    }

    /// Number of one-token warm-up generations after the model loads.
    pub fn warmup_rounds(mut self, n: usize) -> Self {
        self.gateway.warmup_rounds = n;
        self
    }

    /// Configure the response cache bounds.
    pub fn cache(mut self, config: CacheConfig) -> Self {
        self.cache = config;
        self
    }

    /// Replace the quick-reply pattern table.
    pub fn patterns(mut self, table: PatternTable) -> Self {
        self.patterns = table;
        self
    }

    /// Size of the repetition-avoidance window.
    pub fn recent_window(mut self, n: usize) -> Self {
        self.recent_window = n;
        self
    }

    /// Length caps for prompts and replies.
    pub fn limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Generations faster than this are cached.
    pub fn cache_worthy_under(mut self, threshold: Duration) -> Self {
        self.cache_worthy = threshold;
        self
    }

    /// Build the pipeline. Does not load the model; that happens on the
    /// first request or on [`Pipeline::ensure_ready`].
    ///
    /// Fails with `InvalidPattern` if a quick reply would exceed the reply
    /// length limit.
    pub fn build(self) -> Result<Pipeline> {
        let engine = self.engine.ok_or_else(|| {
            HuginnError::Configuration("no inference engine configured".to_string())
        })?;
        self.patterns.check_reply_length(self.limits.max_reply_chars)?;

        Ok(Pipeline::new(
            ResponseCache::new(&self.cache),
            PatternMatcher::new(self.patterns, self.recent_window),
            ModelGateway::new(engine, self.gateway),
            self.limits,
            self.cache_worthy,
        ))
    }
}

impl Default for HuginnBuilder {
    fn default() -> Self {
        Self::new()
    }
}
