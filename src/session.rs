//! Session ownership and orchestration
//!
//! One `ConversationSession` per session id, mutated only by its runtime's
//! event loop. The manager creates, looks up and discards sessions;
//! discarding cancels any in-flight completion so a stale result can never
//! touch a superseded session.

mod controller;

#[cfg(test)]
pub mod testing;

pub use controller::SessionRuntime;

use crate::completion::CompletionClient;
use crate::prompts;
use crate::search::{SearchDefaults, SearchRequest};
use crate::state_machine::state::Role;
use crate::state_machine::{ConversationSession, Event, Mode};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio_util::sync::CancellationToken;

/// Events sent to UI subscribers
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Snapshot sent once on subscribe.
    Init { session: serde_json::Value },
    /// A transcript message was appended.
    Message { message: serde_json::Value },
    /// Incremental assistant text for live display. Display-only: the
    /// transcript and extraction always use the assembled reply.
    AssistantFragment { text: String },
    /// The next scripted prompt, with quick-reply suggestions where the
    /// stage has them.
    Prompt {
        text: String,
        suggestions: Vec<String>,
    },
    /// The gathered parameters changed (partial-info summary).
    Parameters { parameters: serde_json::Value },
    /// The machine state changed.
    StateChange { state: serde_json::Value },
    /// A completion request failed; the input is preserved for resubmit.
    CompletionError {
        message: String,
        retryable: bool,
        pending_input: String,
    },
    /// Collection finished; the finalized request was handed off.
    SearchReady { request: serde_json::Value },
    /// A rejected turn (empty input, busy session).
    Error { message: String },
}

/// Handle to a running session
struct SessionHandle {
    session: Arc<RwLock<ConversationSession>>,
    event_tx: mpsc::Sender<Event>,
    broadcast_tx: broadcast::Sender<SessionEvent>,
    cancel: CancellationToken,
}

/// Registry of live sessions. Mode and provider are fixed per deployment.
pub struct SessionManager {
    mode: Mode,
    defaults: SearchDefaults,
    client: Option<Arc<dyn CompletionClient>>,
    search_tx: mpsc::Sender<SearchRequest>,
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl SessionManager {
    pub fn new(
        mode: Mode,
        client: Option<Arc<dyn CompletionClient>>,
        search_tx: mpsc::Sender<SearchRequest>,
    ) -> Self {
        Self {
            mode,
            defaults: SearchDefaults::default(),
            client,
            search_tx,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Create a session and start its runtime. The opening assistant
    /// greeting is already in the transcript of the returned snapshot.
    pub async fn create_session(&self) -> ConversationSession {
        let id = uuid::Uuid::new_v4().to_string();
        let mut session = ConversationSession::new(id.clone());
        session.push_message(Role::Assistant, prompts::greeting());
        let snapshot = session.clone();

        let shared = Arc::new(RwLock::new(session));
        let (event_tx, event_rx) = mpsc::channel(32);
        let (broadcast_tx, _) = broadcast::channel(128);
        let cancel = CancellationToken::new();

        let runtime = SessionRuntime::new(
            shared.clone(),
            self.mode,
            self.defaults.clone(),
            self.client.clone(),
            event_rx,
            event_tx.clone(),
            broadcast_tx.clone(),
            self.search_tx.clone(),
            cancel.clone(),
        );
        tokio::spawn(runtime.run());

        self.sessions.write().await.insert(
            id,
            SessionHandle {
                session: shared,
                event_tx,
                broadcast_tx,
                cancel,
            },
        );

        tracing::info!(session_id = %snapshot.id, "session created");
        snapshot
    }

    /// Read a consistent copy of the session.
    pub async fn snapshot(&self, id: &str) -> Option<ConversationSession> {
        let sessions = self.sessions.read().await;
        let handle = sessions.get(id)?;
        let snapshot = handle.session.read().await.clone();
        Some(snapshot)
    }

    /// Queue one user turn.
    pub async fn send_message(&self, id: &str, text: String) -> Result<(), SessionError> {
        let sessions = self.sessions.read().await;
        let handle = sessions.get(id).ok_or(SessionError::NotFound)?;
        handle
            .event_tx
            .send(Event::UserMessage { text })
            .await
            .map_err(|_| SessionError::Stopped)
    }

    /// Subscribe to a session's events, returning the current snapshot for
    /// the initial payload.
    pub async fn subscribe(
        &self,
        id: &str,
    ) -> Option<(ConversationSession, broadcast::Receiver<SessionEvent>)> {
        let sessions = self.sessions.read().await;
        let handle = sessions.get(id)?;
        let receiver = handle.broadcast_tx.subscribe();
        let snapshot = handle.session.read().await.clone();
        Some((snapshot, receiver))
    }

    /// Drop a session, cancelling its runtime and any in-flight
    /// completion. The in-flight result, if any, is discarded silently.
    pub async fn discard(&self, id: &str) -> bool {
        match self.sessions.write().await.remove(id) {
            Some(handle) => {
                handle.cancel.cancel();
                tracing::info!(session_id = %id, "session discarded");
                true
            }
            None => false,
        }
    }
}

/// Errors from manager operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session not found")]
    NotFound,
    #[error("session runtime stopped")]
    Stopped,
}
