//! Completion provider abstraction
//!
//! Boundary to the external text-completion service: full message history
//! in, assistant reply out, optionally delivered as a stream of fragments.

mod error;
mod openai;
mod types;

pub use error::{CompletionError, CompletionErrorKind};
pub use openai::OpenAiClient;
pub use types::{ChatMessage, ChatRole, CompletionRequest};

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Common interface for completion providers
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Make a completion request and return the full assistant reply.
    async fn send(&self, request: &CompletionRequest) -> Result<String, CompletionError>;

    /// Streamed variant: fragments are forwarded on `fragments` as they
    /// arrive and the assembled reply is returned once the stream ends.
    /// Fragment boundaries carry no meaning; the default implementation
    /// delivers the whole reply as a single fragment.
    async fn send_streaming(
        &self,
        request: &CompletionRequest,
        fragments: mpsc::Sender<String>,
    ) -> Result<String, CompletionError> {
        let reply = self.send(request).await?;
        let _ = fragments.send(reply.clone()).await;
        Ok(reply)
    }

    /// Get the model ID
    fn model_id(&self) -> &str;
}

/// Logging wrapper for completion clients
pub struct LoggingClient {
    inner: Arc<dyn CompletionClient>,
    model_id: String,
}

impl LoggingClient {
    pub fn new(inner: Arc<dyn CompletionClient>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }

    fn log(&self, result: &Result<String, CompletionError>, duration_ms: u128) {
        match result {
            Ok(reply) => {
                tracing::info!(
                    model = %self.model_id,
                    duration_ms = %duration_ms,
                    reply_chars = reply.len(),
                    "completion request finished"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    duration_ms = %duration_ms,
                    error = %e.message,
                    retryable = e.kind.is_retryable(),
                    "completion request failed"
                );
            }
        }
    }
}

#[async_trait]
impl CompletionClient for LoggingClient {
    async fn send(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let start = std::time::Instant::now();
        let result = self.inner.send(request).await;
        self.log(&result, start.elapsed().as_millis());
        result
    }

    async fn send_streaming(
        &self,
        request: &CompletionRequest,
        fragments: mpsc::Sender<String>,
    ) -> Result<String, CompletionError> {
        let start = std::time::Instant::now();
        let result = self.inner.send_streaming(request, fragments).await;
        self.log(&result, start.elapsed().as_millis());
        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Configuration for the completion provider
#[derive(Debug, Clone, Default)]
pub struct CompletionConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
}

impl CompletionConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("OPENAI_API_KEY").ok(),
            base_url: std::env::var("OPENAI_BASE_URL").ok(),
            model: std::env::var("WANDER_MODEL").ok(),
        }
    }

    /// Build the provider client, or `None` when no key is configured
    /// (scripted deployments need none).
    pub fn build_client(&self) -> Option<Arc<dyn CompletionClient>> {
        let api_key = self.api_key.clone()?;
        if api_key.is_empty() {
            return None;
        }
        let model = self
            .model
            .clone()
            .unwrap_or_else(|| "gpt-4-turbo".to_string());
        let client = OpenAiClient::new(api_key, model, self.base_url.as_deref());
        Some(Arc::new(LoggingClient::new(Arc::new(client))))
    }
}
