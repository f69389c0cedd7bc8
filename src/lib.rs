//! Huginn - response dispatch layer for LLM generators
//!
//! Given a prompt, Huginn returns a short reply using the cheapest strategy
//! that works: an exact-match [`ResponseCache`], a rule-based
//! [`PatternMatcher`], and only then the model behind a [`ModelGateway`].
//! The [`Pipeline`] owns all three and never fails; every error is absorbed
//! into a fixed template reply.
//!
//! # Example
//!
//! ```rust,no_run
//! use huginn::Huginn;
//!
//! #[tokio::main]
//! async fn main() -> huginn::Result<()> {
//!     let pipeline = Huginn::builder()
//!         .ollama("http://localhost:11434")
//!         .model("llama3")
//!         .build()?;
//!
//!     pipeline.ensure_ready().await;
//!     println!("{}", pipeline.handle("Hello").await);
//!     Ok(())
//! }
//! ```
//!
//! # Concurrent use
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use huginn::{DispatchConfig, Dispatcher, Huginn};
//!
//! # async fn run() -> huginn::Result<()> {
//! let pipeline = Arc::new(Huginn::builder().ollama("http://localhost:11434").build()?);
//! let dispatcher = Dispatcher::start(pipeline, DispatchConfig::default());
//! let reply = dispatcher.submit("What is recursion?").await?;
//! println!("{} ({})", reply.text, reply.source);
//! dispatcher.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod framing;
pub mod gateway;
pub mod matcher;
pub mod pipeline;
pub mod providers;
pub mod telemetry;
pub mod traits;
pub mod types;

// Re-export main types at crate root
pub use cache::{CacheConfig, ResponseCache};
pub use config::Config;
pub use dispatch::{DispatchConfig, Dispatcher, PendingReply};
pub use error::{HuginnError, Result};
pub use gateway::{ERROR_TEMPLATE, GatewayConfig, ModelGateway};
pub use matcher::{Pattern, PatternMatcher, PatternSpec, PatternTable, RecentReplies};
pub use pipeline::{FALLBACK_TEMPLATE, Huginn, HuginnBuilder, Limits, Pipeline};
pub use traits::{ChatSession, InferenceEngine, LanguageModel};
pub use types::{GenerateOptions, Reply, ReplySource};

#[cfg(feature = "ollama")]
pub use providers::OllamaEngine;
