//! Mock completion clients for testing
//!
//! These mocks enable session-level tests without real network I/O.

use crate::completion::{CompletionClient, CompletionError, CompletionRequest};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, Notify};

/// Mock completion client that returns queued replies
pub struct MockCompletionClient {
    replies: Mutex<VecDeque<Result<String, CompletionError>>>,
    /// Record of all requests made
    pub requests: Mutex<Vec<CompletionRequest>>,
    /// When set, streamed replies are split into fragments of this many
    /// characters instead of arriving as one piece.
    fragment_size: Option<usize>,
}

impl MockCompletionClient {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            fragment_size: None,
        }
    }

    pub fn with_fragment_size(mut self, size: usize) -> Self {
        self.fragment_size = Some(size);
        self
    }

    /// Queue a successful reply
    pub fn queue_reply(&self, text: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Ok(text.into()));
    }

    /// Queue an error
    pub fn queue_error(&self, error: CompletionError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockCompletionClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionClient for MockCompletionClient {
    async fn send(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CompletionError::network("no mock reply queued")))
    }

    async fn send_streaming(
        &self,
        request: &CompletionRequest,
        fragments: mpsc::Sender<String>,
    ) -> Result<String, CompletionError> {
        let reply = self.send(request).await?;
        match self.fragment_size {
            Some(size) if size > 0 => {
                let chars: Vec<char> = reply.chars().collect();
                for chunk in chars.chunks(size) {
                    let _ = fragments.send(chunk.iter().collect()).await;
                }
            }
            _ => {
                let _ = fragments.send(reply.clone()).await;
            }
        }
        Ok(reply)
    }

    fn model_id(&self) -> &str {
        "mock-model"
    }
}

/// Mock completion client with configurable delay (for cancellation tests)
pub struct DelayedMockCompletionClient {
    inner: MockCompletionClient,
    delay: Duration,
    /// Notified when a request starts (for test synchronization)
    pub request_started: Arc<Notify>,
}

impl DelayedMockCompletionClient {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MockCompletionClient::new(),
            delay,
            request_started: Arc::new(Notify::new()),
        }
    }

    pub fn queue_reply(&self, text: impl Into<String>) {
        self.inner.queue_reply(text);
    }
}

#[async_trait]
impl CompletionClient for DelayedMockCompletionClient {
    async fn send(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        // notify_one stores a permit, so a test that starts waiting late
        // still observes the request.
        self.request_started.notify_one();
        tokio::time::sleep(self.delay).await;
        self.inner.send(request).await
    }

    fn model_id(&self) -> &str {
        self.inner.model_id()
    }
}
