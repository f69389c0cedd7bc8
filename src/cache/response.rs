//! Exact-match response cache for generated replies.
//!
//! [`ResponseCache`] has two layers:
//!
//! - a **dictionary** keyed on the normalized prompt (see [`cache_key`]),
//!   written only by the pipeline after a fast generation. It has no partial
//!   eviction: once it grows past `max_entries` it is cleared in full, and
//!   callers see a cold cache afterwards.
//! - a **memo** in front of it, keyed on the *raw* prompt string. A prompt
//!   repeated verbatim is answered from the memo without touching the
//!   dictionary lock. The memo is bounded and evicts least-recently-used keys.
//!
//! The two layers use different keys on purpose. `"Hello "` and `"hello"`
//! share a dictionary entry but occupy separate memo slots, so a variant seen
//! for the first time misses the memo and is answered by the dictionary.
//!
//! Only hits are memoized. A raw prompt that missed once is looked up in the
//! dictionary again on its next call, which is how the memo picks up entries
//! inserted after the miss.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use moka::policy::EvictionPolicy;
use moka::sync::Cache;
use serde::Deserialize;
use tracing::{debug, info};

use super::cache_key;
use crate::telemetry;

/// Configuration for the response cache.
///
/// ```rust
/// # use huginn::CacheConfig;
/// let config = CacheConfig::new()
///     .max_entries(500)
///     .memo_entries(200);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Dictionary size above which the whole dictionary is cleared. Default: 1,000.
    pub max_entries: usize,
    /// Number of raw prompts tracked by the memo layer. Default: 1,000.
    pub memo_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1_000,
            memo_entries: 1_000,
        }
    }
}

impl CacheConfig {
    /// Create a new config with the default bounds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the dictionary clear threshold.
    pub fn max_entries(mut self, n: usize) -> Self {
        self.max_entries = n;
        self
    }

    /// Set the memo layer capacity.
    pub fn memo_entries(mut self, n: u64) -> Self {
        self.memo_entries = n;
        self
    }
}

/// Two-layer exact-match cache. See module docs.
pub struct ResponseCache {
    entries: Mutex<HashMap<String, String>>,
    memo: Cache<String, String>,
    max_entries: usize,
}

impl ResponseCache {
    /// Create a new response cache with the given configuration.
    pub fn new(config: &CacheConfig) -> Self {
        let memo = Cache::builder()
            .max_capacity(config.memo_entries)
            .eviction_policy(EvictionPolicy::lru())
            .build();
        Self {
            entries: Mutex::new(HashMap::new()),
            memo,
            max_entries: config.max_entries,
        }
    }

    /// Look up the reply cached for `prompt`.
    ///
    /// Checks the memo with the raw prompt first, then the dictionary with
    /// the normalized key. Emits cache hit/miss metrics.
    pub fn lookup(&self, prompt: &str) -> Option<String> {
        if let Some(reply) = self.memo.get(prompt) {
            metrics::counter!(telemetry::CACHE_HITS_TOTAL, "layer" => "memo").increment(1);
            return Some(reply);
        }

        let entries = self.entries();
        let found = entries.get(&cache_key(prompt)).cloned();
        match found {
            Some(reply) => {
                // Memoize under the lock so a concurrent clear cannot slip
                // in between and leave the memo ahead of the dictionary.
                self.memo.insert(prompt.to_string(), reply.clone());
                drop(entries);
                metrics::counter!(telemetry::CACHE_HITS_TOTAL, "layer" => "dictionary")
                    .increment(1);
                Some(reply)
            }
            None => {
                metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
                None
            }
        }
    }

    /// Store `reply` under the normalized key of `prompt`.
    ///
    /// Writes the dictionary only. If the insert pushes the dictionary past
    /// its bound, it is cleared in the same critical section.
    pub fn insert(&self, prompt: &str, reply: impl Into<String>) {
        let key = cache_key(prompt);
        let mut entries = self.entries();
        entries.insert(key, reply.into());
        debug!(size = entries.len(), "response cached");
        self.clear_if_oversized(&mut entries);
    }

    /// Clear the dictionary if it holds more than `max_entries` replies.
    ///
    /// Returns true if a clear happened.
    pub fn maybe_clear(&self) -> bool {
        let mut entries = self.entries();
        self.clear_if_oversized(&mut entries)
    }

    /// Number of entries in the dictionary layer.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// Whether the dictionary layer is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evict everything from both layers.
    pub fn clear(&self) {
        let mut entries = self.entries();
        entries.clear();
        self.memo.invalidate_all();
    }

    fn clear_if_oversized(&self, entries: &mut HashMap<String, String>) -> bool {
        if entries.len() <= self.max_entries {
            return false;
        }
        let dropped = entries.len();
        entries.clear();
        // The memo would otherwise keep serving replies the dictionary forgot.
        self.memo.invalidate_all();
        metrics::counter!(telemetry::CACHE_CLEARS_TOTAL).increment(1);
        info!(dropped, "response cache cleared");
        true
    }

    // A panic while holding the lock leaves the map in a valid state, so
    // poisoning is ignored.
    fn entries(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}
