//! The response pipeline.
//!
//! [`Pipeline::handle`] tries the cheapest strategies first and stops at the
//! first one that answers:
//!
//! 1. [`ResponseCache::lookup`]: exact hit, returned as-is
//! 2. [`PatternMatcher::match_prompt`]: canned reply, never cached
//! 3. [`ModelGateway`]: the prompt is trimmed and capped, the call is timed,
//!    and the reply is trimmed and capped in turn
//!
//! A generated reply is cached only when the generate call finished under the
//! cache-worthiness threshold (2s by default). A failed generation answers
//! with the gateway's error template, which follows the same rule: a fast
//! failure is cached like any other reply.
//!
//! The pipeline never fails: anything that escapes a stage, panics included,
//! is answered with [`FALLBACK_TEMPLATE`].

mod builder;
mod normalize;

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures_util::FutureExt;
use serde::Deserialize;
use tokio::time::Instant;
use tracing::{debug, error};

use crate::cache::ResponseCache;
use crate::gateway::{ERROR_TEMPLATE, ModelGateway};
use crate::matcher::PatternMatcher;
use crate::telemetry;
use crate::types::{Reply, ReplySource};

pub use builder::{Huginn, HuginnBuilder};
pub use normalize::{FALLBACK_TEMPLATE, postprocess_reply, preprocess_prompt};

/// Default latency under which a generated reply is worth caching.
pub const DEFAULT_CACHE_WORTHY: Duration = Duration::from_secs(2);

/// Length caps applied around the model call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Characters of prompt forwarded to the model. Default: 200.
    pub max_prompt_chars: usize,
    /// Characters of reply returned to the caller. Default: 150.
    pub max_reply_chars: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_prompt_chars: 200,
            max_reply_chars: 150,
        }
    }
}

/// Owns every piece of per-process state: cache, matcher window, model.
///
/// Build one with [`Huginn::builder()`] and share it behind an `Arc`.
pub struct Pipeline {
    cache: ResponseCache,
    matcher: PatternMatcher,
    gateway: ModelGateway,
    limits: Limits,
    cache_worthy: Duration,
}

impl Pipeline {
    pub(crate) fn new(
        cache: ResponseCache,
        matcher: PatternMatcher,
        gateway: ModelGateway,
        limits: Limits,
        cache_worthy: Duration,
    ) -> Self {
        Self {
            cache,
            matcher,
            gateway,
            limits,
            cache_worthy,
        }
    }

    /// Answer a prompt. Always returns a non-empty reply.
    pub async fn handle(&self, prompt: &str) -> String {
        self.respond(prompt).await.text
    }

    /// Answer a prompt, reporting which stage produced the reply.
    pub async fn respond(&self, prompt: &str) -> Reply {
        let reply = match AssertUnwindSafe(self.dispatch(prompt)).catch_unwind().await {
            Ok(reply) => reply,
            Err(panic) => {
                error!(panic = panic_message(panic.as_ref()), "pipeline stage panicked");
                Reply::new(FALLBACK_TEMPLATE, ReplySource::Fallback)
            }
        };
        metrics::counter!(telemetry::REQUESTS_TOTAL, "source" => reply.source.as_str())
            .increment(1);
        reply
    }

    /// Load and warm up the model ahead of the first request.
    pub async fn ensure_ready(&self) -> bool {
        self.gateway.ensure_ready().await
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn matcher(&self) -> &PatternMatcher {
        &self.matcher
    }

    pub fn gateway(&self) -> &ModelGateway {
        &self.gateway
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    async fn dispatch(&self, prompt: &str) -> Reply {
        if let Some(text) = self.cache.lookup(prompt) {
            debug!("cache hit");
            return Reply::new(text, ReplySource::Cache);
        }

        if let Some(text) = self.matcher.match_prompt(prompt) {
            return Reply::new(text, ReplySource::Quick);
        }

        let processed = preprocess_prompt(prompt, self.limits.max_prompt_chars);
        let started = Instant::now();
        let generated = self
            .gateway
            .try_generate(&processed, self.gateway.config().max_tokens)
            .await;
        let elapsed = started.elapsed();
        metrics::histogram!(telemetry::GENERATION_DURATION_SECONDS).record(elapsed.as_secs_f64());

        // Failures go through the same postprocess and caching steps.
        let raw = generated.unwrap_or_else(|_| ERROR_TEMPLATE.to_string());
        let text = postprocess_reply(&raw, self.limits.max_reply_chars);

        if elapsed < self.cache_worthy {
            self.cache.insert(prompt, text.clone());
        } else {
            debug!(
                elapsed_ms = elapsed.as_millis() as u64,
                "slow generation, not caching"
            );
        }

        Reply::new(text, ReplySource::Model)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}
