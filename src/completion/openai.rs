//! `OpenAI`-compatible completion provider

use super::types::{ChatRole, CompletionRequest};
use super::{CompletionClient, CompletionError};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;

/// Chat-completions adapter. The base URL is configurable so deployments
/// can point at a gateway (and tests at a mock server).
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl OpenAiClient {
    pub fn new(api_key: String, model: String, base_url: Option<&str>) -> Self {
        let endpoint = format!(
            "{}/v1/chat/completions",
            base_url.unwrap_or("https://api.openai.com").trim_end_matches('/')
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .expect("failed to create HTTP client");

        Self {
            client,
            api_key,
            model,
            endpoint,
        }
    }

    fn translate_request(&self, request: &CompletionRequest, stream: bool) -> ApiRequest {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);

        if !request.system.is_empty() {
            messages.push(ApiMessage {
                role: "system".to_string(),
                content: request.system.clone(),
            });
        }

        for message in &request.messages {
            let role = match message.role {
                ChatRole::User => "user",
                ChatRole::Assistant => "assistant",
            };
            messages.push(ApiMessage {
                role: role.to_string(),
                content: message.text.clone(),
            });
        }

        ApiRequest {
            model: self.model.clone(),
            messages,
            stream,
        }
    }

    fn classify_error(status: reqwest::StatusCode, body: &str) -> CompletionError {
        match status.as_u16() {
            401 | 403 => CompletionError::auth(format!("authentication failed: {body}")),
            429 => {
                let mut err = CompletionError::rate_limit(format!("rate limited: {body}"));
                // Honor a retry-after hint if the provider sent one
                if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(body) {
                    if let Some(retry_after) = parsed
                        .get("error")
                        .and_then(|e| e.get("retry_after"))
                        .and_then(serde_json::Value::as_f64)
                    {
                        err = err.with_retry_after(Duration::from_secs_f64(retry_after));
                    }
                }
                err
            }
            400 => CompletionError::invalid_request(format!("invalid request: {body}")),
            500..=599 => CompletionError::server_error(format!("server error: {body}")),
            _ => CompletionError::unknown(format!("HTTP {status}: {body}")),
        }
    }

    fn request_error(e: reqwest::Error) -> CompletionError {
        if e.is_timeout() {
            CompletionError::network(format!("request timeout: {e}"))
        } else if e.is_connect() {
            CompletionError::network(format!("connection failed: {e}"))
        } else {
            CompletionError::unknown(format!("request failed: {e}"))
        }
    }

    async fn post(&self, payload: &ApiRequest) -> Result<reqwest::Response, CompletionError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(payload)
            .send()
            .await
            .map_err(Self::request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify_error(status, &body));
        }

        Ok(response)
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn send(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let payload = self.translate_request(request, false);
        let response = self.post(&payload).await?;

        let body = response
            .text()
            .await
            .map_err(|e| CompletionError::network(format!("failed to read response: {e}")))?;

        let parsed: ApiResponse = serde_json::from_str(&body)
            .map_err(|e| CompletionError::unknown(format!("failed to parse response: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| CompletionError::unknown("response contained no choices"))
    }

    async fn send_streaming(
        &self,
        request: &CompletionRequest,
        fragments: mpsc::Sender<String>,
    ) -> Result<String, CompletionError> {
        let payload = self.translate_request(request, true);
        let response = self.post(&payload).await?;

        let mut stream = response.bytes_stream();
        let mut buffer = String::new();
        let mut assembled = String::new();

        while let Some(chunk) = stream.next().await {
            let bytes =
                chunk.map_err(|e| CompletionError::network(format!("stream error: {e}")))?;
            buffer.push_str(&String::from_utf8_lossy(&bytes));

            // Process complete lines; a partial line stays buffered until
            // the next chunk arrives.
            while let Some(newline) = buffer.find('\n') {
                let line = buffer[..newline].trim().to_string();
                buffer.drain(..=newline);

                let Some(data) = line.strip_prefix("data:") else {
                    continue;
                };
                let data = data.trim();
                if data == "[DONE]" {
                    return Ok(assembled);
                }

                match serde_json::from_str::<ApiStreamChunk>(data) {
                    Ok(parsed) => {
                        let delta = parsed
                            .choices
                            .into_iter()
                            .next()
                            .and_then(|c| c.delta.content);
                        if let Some(delta) = delta {
                            if !delta.is_empty() {
                                assembled.push_str(&delta);
                                let _ = fragments.send(delta).await;
                            }
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to parse stream line");
                    }
                }
            }
        }

        Ok(assembled)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

// Wire types

#[derive(Debug, Serialize)]
struct ApiRequest {
    model: String,
    messages: Vec<ApiMessage>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ApiReplyMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiStreamChunk {
    choices: Vec<ApiStreamChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiStreamChoice {
    delta: ApiDelta,
}

#[derive(Debug, Deserialize)]
struct ApiDelta {
    #[serde(default)]
    content: Option<String>,
}
