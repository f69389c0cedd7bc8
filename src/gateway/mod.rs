//! Gateway around the single shared model instance.
//!
//! [`ModelGateway`] owns the model handle for the lifetime of the pipeline.
//! The handle is built lazily on first use, at most once even when several
//! workers race on the first request: a lock-free read serves the fast path
//! once the model exists, and construction itself runs under the
//! [`OnceCell`] init lock with a re-check. A failed construction leaves the
//! cell empty, so the next request tries again.
//!
//! Construction includes a short warm-up (a few one-token generations) so
//! engine-side lazy initialization is paid before real traffic arrives.

use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::OnceCell;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::telemetry;
use crate::traits::{InferenceEngine, LanguageModel};
use crate::types::{DEFAULT_MAX_TOKENS, GenerateOptions};
use crate::{HuginnError, Result};

/// Reply returned when generation fails for any reason.
pub const ERROR_TEMPLATE: &str = "I'll help you quickly with that.";

/// Prompt used for warm-up generations.
const WARMUP_PROMPT: &str = "test";

/// Model selection and generation defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Model identifier passed to the engine. Default: "llama3".
    pub name: String,
    /// Token budget per generated reply. Default: 20.
    pub max_tokens: usize,
    /// Number of one-token warm-up generations after loading. Default: 5.
    pub warmup_rounds: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            name: "llama3".to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            warmup_rounds: 5,
        }
    }
}

impl GatewayConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.max_tokens = n;
        self
    }

    pub fn warmup_rounds(mut self, n: usize) -> Self {
        self.warmup_rounds = n;
        self
    }
}

/// Lazily-initialized access to one model. See module docs.
pub struct ModelGateway {
    engine: Arc<dyn InferenceEngine>,
    config: GatewayConfig,
    model: OnceCell<Arc<dyn LanguageModel>>,
}

impl ModelGateway {
    pub fn new(engine: Arc<dyn InferenceEngine>, config: GatewayConfig) -> Self {
        Self {
            engine,
            config,
            model: OnceCell::new(),
        }
    }

    /// Make sure the model is loaded and warmed up.
    ///
    /// Returns false if construction failed. The failure is logged, never
    /// returned.
    pub async fn ensure_ready(&self) -> bool {
        self.model().await.is_ok()
    }

    /// Whether the model has already been constructed. Never blocks.
    pub fn is_ready(&self) -> bool {
        self.model.initialized()
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Generate a reply, substituting [`ERROR_TEMPLATE`] on any failure.
    pub async fn generate(&self, prompt: &str, max_tokens: usize) -> String {
        match self.try_generate(prompt, max_tokens).await {
            Ok(text) => text,
            Err(_) => ERROR_TEMPLATE.to_string(),
        }
    }

    /// Generate a reply in a fresh chat session.
    ///
    /// Uses greedy-leaning decoding (see [`GenerateOptions::deterministic`]).
    /// The session is dropped before returning, so nothing said here is
    /// visible to the next call.
    pub async fn try_generate(&self, prompt: &str, max_tokens: usize) -> Result<String> {
        let result = async {
            let model = self
                .model()
                .await
                .map_err(|e| HuginnError::ModelNotReady(e.to_string()))?;
            let mut session = model.session();
            session
                .generate(prompt, &GenerateOptions::deterministic(max_tokens))
                .await
        }
        .await;

        if let Err(ref e) = result {
            metrics::counter!(telemetry::GENERATION_FAILURES_TOTAL).increment(1);
            warn!(error = %e, transient = e.is_transient(), "model generation failed");
        }
        result
    }

    async fn model(&self) -> Result<Arc<dyn LanguageModel>> {
        if let Some(model) = self.model.get() {
            return Ok(Arc::clone(model));
        }
        let model = self.model.get_or_try_init(|| self.construct()).await?;
        Ok(Arc::clone(model))
    }

    async fn construct(&self) -> Result<Arc<dyn LanguageModel>> {
        let started = Instant::now();
        let result = async {
            let model = self.engine.load(&self.config.name).await?;
            let warmup = GenerateOptions::deterministic(1);
            for _ in 0..self.config.warmup_rounds {
                model.generate(WARMUP_PROMPT, &warmup).await?;
            }
            Ok(model)
        }
        .await;

        match &result {
            Ok(_) => {
                metrics::counter!(telemetry::MODEL_LOADS_TOTAL, "status" => "ok").increment(1);
                info!(
                    engine = self.engine.name(),
                    model = %self.config.name,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "model ready"
                );
            }
            Err(e) => {
                metrics::counter!(telemetry::MODEL_LOADS_TOTAL, "status" => "error").increment(1);
                error!(
                    engine = self.engine.name(),
                    model = %self.config.name,
                    error = %e,
                    "model initialization failed"
                );
            }
        }
        result
    }
}
