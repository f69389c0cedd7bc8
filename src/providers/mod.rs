//! Inference engine implementations.
//!
//! Engines implement the traits in [`crate::traits`]. Only Ollama ships
//! with the crate; anything else can be plugged in through
//! [`HuginnBuilder::engine`](crate::HuginnBuilder::engine).

#[cfg(feature = "ollama")]
pub mod ollama;

#[cfg(feature = "ollama")]
pub use ollama::OllamaEngine;
