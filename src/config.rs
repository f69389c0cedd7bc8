//! Configuration loading.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. `--config <path>` (CLI flag)
//! 2. `~/.huginn/config.toml` (user)
//! 3. `/etc/huginn/config.toml` (system)
//!
//! Every section and field is optional; missing values take the defaults
//! documented on each type.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::cache::CacheConfig;
use crate::dispatch::DispatchConfig;
use crate::framing::FramingConfig;
use crate::gateway::GatewayConfig;
use crate::matcher::{DEFAULT_RECENT_WINDOW, PatternSpec, PatternTable};
use crate::pipeline::{DEFAULT_CACHE_WORTHY, HuginnBuilder, Limits};
use crate::{HuginnError, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub model: GatewayConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub cache: CacheSection,
    #[serde(default)]
    pub matcher: MatcherConfig,
    #[serde(default)]
    pub limits: Limits,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    /// Persona framing; disabled when absent.
    #[serde(default)]
    pub framing: Option<FramingConfig>,
}

/// Engine configurations.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub ollama: OllamaConfig,
}

/// Ollama-specific configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct OllamaConfig {
    /// Ollama base URL (default: http://localhost:11434).
    #[serde(default = "default_ollama_url")]
    pub base_url: String,
    /// HTTP timeout in seconds (default: 60).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_url(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_timeout() -> u64 {
    60
}

/// Response cache bounds and the cache-worthiness threshold.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSection {
    /// Dictionary size above which it is cleared (default: 1000).
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    /// Raw prompts tracked by the memo layer (default: 1000).
    #[serde(default = "default_memo_entries")]
    pub memo_entries: u64,
    /// Generations faster than this many seconds are cached (default: 2.0).
    #[serde(default = "default_cache_worthy_secs")]
    pub cache_worthy_secs: f64,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            memo_entries: default_memo_entries(),
            cache_worthy_secs: default_cache_worthy_secs(),
        }
    }
}

fn default_max_entries() -> usize {
    CacheConfig::default().max_entries
}

fn default_memo_entries() -> u64 {
    CacheConfig::default().memo_entries
}

fn default_cache_worthy_secs() -> f64 {
    DEFAULT_CACHE_WORTHY.as_secs_f64()
}

impl CacheSection {
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::new()
            .max_entries(self.max_entries)
            .memo_entries(self.memo_entries)
    }

    pub fn cache_worthy(&self) -> Result<Duration> {
        Duration::try_from_secs_f64(self.cache_worthy_secs).map_err(|e| {
            HuginnError::Configuration(format!(
                "invalid cache_worthy_secs {}: {e}",
                self.cache_worthy_secs
            ))
        })
    }
}

/// Quick-reply matcher configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MatcherConfig {
    /// Repetition-avoidance window size (default: 5).
    #[serde(default = "default_recent_window")]
    pub recent_window: usize,
    /// Custom pattern table; replaces the built-in one when non-empty.
    #[serde(default)]
    pub patterns: Vec<PatternSpec>,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            recent_window: default_recent_window(),
            patterns: Vec::new(),
        }
    }
}

fn default_recent_window() -> usize {
    DEFAULT_RECENT_WINDOW
}

impl MatcherConfig {
    pub fn pattern_table(&self) -> Result<PatternTable> {
        if self.patterns.is_empty() {
            Ok(PatternTable::builtin())
        } else {
            PatternTable::from_specs(&self.patterns)
        }
    }
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// Resolution order:
    /// 1. Explicit path (if provided)
    /// 2. `~/.huginn/config.toml`
    /// 3. `/etc/huginn/config.toml`
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let path = Self::resolve_config_path(explicit_path)?.ok_or_else(|| {
            HuginnError::Configuration(
                "No config file found. Create ~/.huginn/config.toml or /etc/huginn/config.toml"
                    .to_string(),
            )
        })?;
        Self::load_from_file(&path)
    }

    /// Like [`Config::load`], but falls back to defaults when no file exists
    /// in the standard locations. An explicit path must still exist.
    pub fn load_or_default(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            HuginnError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            HuginnError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    /// Resolve the config file path.
    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(HuginnError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        // User config
        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".huginn").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        // System config
        let system_config = PathBuf::from("/etc/huginn/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }

    /// Pipeline builder preconfigured from this file, minus the engine.
    ///
    /// With the `ollama` feature the Ollama engine from `[providers.ollama]`
    /// is set as well.
    pub fn builder(&self) -> Result<HuginnBuilder> {
        let builder = HuginnBuilder::new()
            .gateway_config(self.model.clone())
            .cache(self.cache.cache_config())
            .cache_worthy_under(self.cache.cache_worthy()?)
            .patterns(self.matcher.pattern_table()?)
            .recent_window(self.matcher.recent_window)
            .limits(self.limits);

        #[cfg(feature = "ollama")]
        let builder = {
            let ollama = &self.providers.ollama;
            builder.engine(std::sync::Arc::new(
                crate::providers::OllamaEngine::with_timeout(
                    &ollama.base_url,
                    Duration::from_secs(ollama.timeout_secs),
                ),
            ))
        };

        Ok(builder)
    }
}
