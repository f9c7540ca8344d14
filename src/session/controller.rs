//! Session runtime: owns one conversation and serializes its turns

use super::SessionEvent;
use crate::completion::{
    ChatMessage, CompletionClient, CompletionErrorKind, CompletionRequest,
};
use crate::prompts;
use crate::search::{SearchDefaults, SearchRequest};
use crate::state_machine::state::{ConversationSession, Role};
use crate::state_machine::{transition, Effect, Event, Mode, SessionContext, TransitionError};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio_util::sync::CancellationToken;

/// Event loop for one conversation session.
///
/// All mutation goes through this runtime: one event is taken at a time and
/// runs to completion (or fails atomically) before the next is accepted.
pub struct SessionRuntime {
    session: Arc<RwLock<ConversationSession>>,
    mode: Mode,
    defaults: SearchDefaults,
    client: Option<Arc<dyn CompletionClient>>,
    event_rx: mpsc::Receiver<Event>,
    event_tx: mpsc::Sender<Event>,
    broadcast_tx: broadcast::Sender<SessionEvent>,
    search_tx: mpsc::Sender<SearchRequest>,
    cancel: CancellationToken,
}

impl SessionRuntime {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        session: Arc<RwLock<ConversationSession>>,
        mode: Mode,
        defaults: SearchDefaults,
        client: Option<Arc<dyn CompletionClient>>,
        event_rx: mpsc::Receiver<Event>,
        event_tx: mpsc::Sender<Event>,
        broadcast_tx: broadcast::Sender<SessionEvent>,
        search_tx: mpsc::Sender<SearchRequest>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            session,
            mode,
            defaults,
            client,
            event_rx,
            event_tx,
            broadcast_tx,
            search_tx,
            cancel,
        }
    }

    pub async fn run(mut self) {
        let session_id = self.session.read().await.id.clone();
        tracing::info!(session_id = %session_id, mode = ?self.mode, "starting session runtime");

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => break,
                event = self.event_rx.recv() => match event {
                    Some(event) => {
                        if let Err(e) = self.process_event(event).await {
                            // Transition errors are user-facing and leave
                            // the session untouched.
                            let _ = self.broadcast_tx.send(SessionEvent::Error {
                                message: e.to_string(),
                            });
                        }
                    }
                    None => break,
                }
            }
        }

        tracing::info!(session_id = %session_id, "session runtime stopped");
    }

    async fn process_event(&mut self, event: Event) -> Result<(), TransitionError> {
        let context = SessionContext {
            mode: self.mode,
            today: Utc::now().date_naive(),
            defaults: self.defaults.clone(),
        };

        // Write lock held for the whole turn: the transition and its
        // effects apply atomically before the next event is taken.
        let mut session = self.session.write().await;
        let result = transition(&session.state, &session.parameters, &context, event)?;

        session.state = result.new_state;
        let parameters_changed = session.parameters != result.parameters;
        session.parameters = result.parameters;

        let _ = self.broadcast_tx.send(SessionEvent::StateChange {
            state: serde_json::to_value(&session.state).unwrap_or(Value::Null),
        });
        if parameters_changed {
            let _ = self.broadcast_tx.send(SessionEvent::Parameters {
                parameters: serde_json::to_value(&session.parameters).unwrap_or(Value::Null),
            });
        }

        for effect in result.effects {
            self.execute_effect(&mut session, effect).await;
        }

        Ok(())
    }

    async fn execute_effect(&self, session: &mut ConversationSession, effect: Effect) {
        match effect {
            Effect::AppendUser { text } => {
                self.append(session, Role::User, text);
            }

            Effect::AppendAssistant { text } => {
                self.append(session, Role::Assistant, text);
            }

            Effect::ShowPrompt { text, suggestions } => {
                self.append(session, Role::Assistant, text.clone());
                let _ = self
                    .broadcast_tx
                    .send(SessionEvent::Prompt { text, suggestions });
            }

            Effect::RequestCompletion { pending_input } => {
                self.spawn_completion(session, pending_input);
            }

            Effect::HandOffSearch { request } => {
                tracing::info!(
                    session_id = %session.id,
                    destination = %request.destination,
                    origin = %request.origin,
                    "search request finalized"
                );
                let request_json = serde_json::to_value(&request).unwrap_or(Value::Null);
                if self.search_tx.send(request).await.is_err() {
                    tracing::warn!("search hand-off receiver dropped");
                }
                let _ = self.broadcast_tx.send(SessionEvent::SearchReady {
                    request: request_json,
                });
            }

            Effect::NotifyCompletionError {
                message,
                retryable,
                pending_input,
            } => {
                let _ = self.broadcast_tx.send(SessionEvent::CompletionError {
                    message,
                    retryable,
                    pending_input,
                });
            }
        }
    }

    fn append(&self, session: &mut ConversationSession, role: Role, text: String) {
        let message = session.push_message(role, text);
        let _ = self.broadcast_tx.send(SessionEvent::Message {
            message: serde_json::to_value(&message).unwrap_or(Value::Null),
        });
    }

    /// Dispatch the completion request as a background task. The held user
    /// input rides in the outbound history without touching the transcript;
    /// the result comes back as a single event carrying the full assembled
    /// text. A cancelled session discards the in-flight result silently.
    fn spawn_completion(&self, session: &ConversationSession, pending_input: String) {
        let Some(client) = self.client.clone() else {
            let event_tx = self.event_tx.clone();
            tokio::spawn(async move {
                let _ = event_tx
                    .send(Event::CompletionFailed {
                        message: "no completion provider configured".to_string(),
                        kind: CompletionErrorKind::Unknown,
                    })
                    .await;
            });
            return;
        };

        let mut messages: Vec<ChatMessage> =
            session.transcript.iter().map(ChatMessage::from).collect();
        messages.push(ChatMessage::user(pending_input));
        let request = CompletionRequest {
            system: prompts::SYSTEM_PROMPT.to_string(),
            messages,
        };

        let event_tx = self.event_tx.clone();
        let broadcast_tx = self.broadcast_tx.clone();
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            let (fragment_tx, mut fragment_rx) = mpsc::channel::<String>(32);
            let forwarder = {
                let broadcast_tx = broadcast_tx.clone();
                tokio::spawn(async move {
                    while let Some(text) = fragment_rx.recv().await {
                        let _ = broadcast_tx.send(SessionEvent::AssistantFragment { text });
                    }
                })
            };

            let outcome = tokio::select! {
                result = client.send_streaming(&request, fragment_tx) => Some(result),
                () = cancel.cancelled() => None,
            };
            let _ = forwarder.await;

            match outcome {
                Some(Ok(text)) => {
                    let _ = event_tx.send(Event::AssistantReply { text }).await;
                }
                Some(Err(e)) => {
                    let _ = event_tx
                        .send(Event::CompletionFailed {
                            message: e.message.clone(),
                            kind: e.kind,
                        })
                        .await;
                }
                None => {
                    tracing::debug!("discarding completion result for superseded session");
                }
            }
        });
    }
}
