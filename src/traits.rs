//! Inference engine traits.
//!
//! The engine that actually runs a model is an external collaborator. Huginn
//! only needs three capabilities from it:
//!
//! - [`InferenceEngine::load`]: construct a model handle (slow, fallible)
//! - [`LanguageModel::generate`]: one-shot generation without any session
//! - [`LanguageModel::session`]: a scoped chat session; dropping it ends the
//!   conversation, so nothing carries over between sessions
//!
//! # Example
//!
//! ```ignore
//! let model = engine.load("llama3").await?;
//! let mut session = model.session();
//! let text = session.generate("hello", &GenerateOptions::default()).await?;
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::Result;
use crate::types::GenerateOptions;

/// Constructs model handles.
#[async_trait]
pub trait InferenceEngine: Send + Sync {
    /// Engine name for logging/debugging.
    fn name(&self) -> &str;

    /// Load a model by identifier.
    ///
    /// Returns `ModelNotFound` if the engine does not know the model.
    async fn load(&self, model: &str) -> Result<Arc<dyn LanguageModel>>;
}

/// A loaded model, shared by every request in the process.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Model identifier.
    fn id(&self) -> &str;

    /// Generate text for a prompt outside any session.
    async fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<String>;

    /// Open a fresh chat session.
    fn session(&self) -> Box<dyn ChatSession>;
}

/// Conversational context scoped to the lifetime of the value.
#[async_trait]
pub trait ChatSession: Send {
    /// Generate a reply within this session.
    async fn generate(&mut self, prompt: &str, options: &GenerateOptions) -> Result<String>;
}
