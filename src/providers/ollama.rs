//! Ollama inference engine.
//!
//! Talks to a local Ollama server over its REST API.
//! See: <https://github.com/ollama/ollama/blob/main/docs/api.md>
//!
//! - `load` checks the model exists with `POST /api/show`
//! - one-shot generation uses `POST /api/generate`
//! - sessions use `POST /api/chat`, resending the session's own history

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::traits::{ChatSession, InferenceEngine, LanguageModel};
use crate::types::GenerateOptions;
use crate::{HuginnError, Result};

/// Default base URL for a local Ollama server
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Default HTTP timeout for Ollama requests
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Engine backed by an Ollama server.
#[derive(Clone)]
pub struct OllamaEngine {
    http: Client,
    base_url: String,
}

impl OllamaEngine {
    /// Engine for the default local server.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Engine with a custom base URL (for testing with wiremock).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Engine with a custom base URL and request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to build HTTP client");

        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Default for OllamaEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InferenceEngine for OllamaEngine {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn load(&self, model: &str) -> Result<Arc<dyn LanguageModel>> {
        let url = format!("{}/api/show", self.base_url);

        let response = self
            .http
            .post(&url)
            .json(&ShowRequest { model })
            .send()
            .await?;

        handle_response_errors(&response, model)?;
        debug!(model, "ollama model found");

        Ok(Arc::new(OllamaModel {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            model: model.to_string(),
        }))
    }
}

/// A model known to the Ollama server.
pub struct OllamaModel {
    http: Client,
    base_url: String,
    model: String,
}

#[async_trait]
impl LanguageModel for OllamaModel {
    fn id(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);

        let response = self
            .http
            .post(&url)
            .json(&GenerateRequest {
                model: &self.model,
                prompt,
                stream: false,
                options: options.into(),
            })
            .send()
            .await?;

        handle_response_errors(&response, &self.model)?;

        let body: GenerateResponseBody = response.json().await?;
        Ok(body.response)
    }

    fn session(&self) -> Box<dyn ChatSession> {
        Box::new(OllamaSession {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            history: Vec::new(),
        })
    }
}

/// Chat session; the history lives and dies with the value.
pub struct OllamaSession {
    http: Client,
    base_url: String,
    model: String,
    history: Vec<ChatMessage>,
}

#[async_trait]
impl ChatSession for OllamaSession {
    async fn generate(&mut self, prompt: &str, options: &GenerateOptions) -> Result<String> {
        let url = format!("{}/api/chat", self.base_url);

        self.history.push(ChatMessage {
            role: "user".to_string(),
            content: prompt.to_string(),
        });

        let response = self
            .http
            .post(&url)
            .json(&ChatRequest {
                model: &self.model,
                messages: &self.history,
                stream: false,
                options: options.into(),
            })
            .send()
            .await?;

        handle_response_errors(&response, &self.model)?;

        let body: ChatResponseBody = response.json().await?;
        let content = body.message.content.clone();
        self.history.push(body.message);
        Ok(content)
    }
}

/// Map non-success HTTP statuses to errors.
fn handle_response_errors(response: &reqwest::Response, model: &str) -> Result<()> {
    let status = response.status();

    if status.is_success() {
        return Ok(());
    }

    match status.as_u16() {
        404 => Err(HuginnError::ModelNotFound(model.to_string())),
        429 => {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_secs);
            Err(HuginnError::RateLimited { retry_after })
        }
        code => Err(HuginnError::Api {
            status: code,
            message: format!("Ollama API error: {}", status),
        }),
    }
}

#[derive(Serialize)]
struct ShowRequest<'a> {
    model: &'a str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct OllamaOptions {
    num_predict: usize,
    top_k: usize,
    top_p: f32,
    repeat_penalty: f32,
}

impl From<&GenerateOptions> for OllamaOptions {
    fn from(options: &GenerateOptions) -> Self {
        Self {
            num_predict: options.max_tokens,
            top_k: options.top_k,
            top_p: options.top_p,
            repeat_penalty: options.repeat_penalty,
        }
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Deserialize)]
struct GenerateResponseBody {
    #[serde(default)]
    response: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: OllamaOptions,
}

#[derive(Deserialize)]
struct ChatResponseBody {
    message: ChatMessage,
}
