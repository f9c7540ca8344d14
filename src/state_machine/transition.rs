//! Pure state transition function

use super::state::{Mode, SessionContext, SessionState, Stage, TripParameters};
use super::{Effect, Event};
use crate::extract;
use crate::prompts;
use crate::search::SearchRequest;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: SessionState,
    /// Post-merge parameter set (monotone over the session).
    pub parameters: TripParameters,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(new_state: SessionState, parameters: TripParameters) -> Self {
        Self {
            new_state,
            parameters,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition. All are per-turn and
/// recoverable; none mutate the session.
#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("message is empty")]
    EmptyInput,
    #[error("session is waiting on the assistant, resend after it replies")]
    SessionBusy,
    #[error("session already completed, start a new search")]
    SessionComplete,
    #[error("invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function: given the same inputs it always produces the
/// same outputs, with no I/O. The session controller owns effect execution.
pub fn transition(
    state: &SessionState,
    parameters: &TripParameters,
    context: &SessionContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // User input
        // ============================================================
        (SessionState::Collecting { stage }, Event::UserMessage { text }) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Err(TransitionError::EmptyInput);
            }

            match context.mode {
                Mode::Scripted => Ok(scripted_turn(*stage, trimmed, parameters, context)),
                Mode::ModelAssisted => {
                    // Nothing enters the transcript yet: a failed exchange
                    // must leave the session untouched.
                    Ok(TransitionResult::new(
                        SessionState::AwaitingAssistant {
                            stage: *stage,
                            pending_input: trimmed.to_string(),
                        },
                        parameters.clone(),
                    )
                    .with_effect(Effect::RequestCompletion {
                        pending_input: trimmed.to_string(),
                    }))
                }
            }
        }

        (SessionState::AwaitingAssistant { .. }, Event::UserMessage { .. }) => {
            Err(TransitionError::SessionBusy)
        }

        (SessionState::Ready, Event::UserMessage { .. }) => Err(TransitionError::SessionComplete),

        // ============================================================
        // Assistant reply (model-assisted mode)
        // ============================================================
        (
            SessionState::AwaitingAssistant {
                stage,
                pending_input,
            },
            Event::AssistantReply { text },
        ) => {
            let updated = extract::extract(pending_input, *stage, parameters, context.today);

            if text.contains(prompts::COMPLETION_MARKER) {
                let request = SearchRequest::finalize(&updated, &context.defaults, context.today);
                Ok(TransitionResult::new(SessionState::Ready, updated)
                    .with_effect(Effect::AppendUser {
                        text: pending_input.clone(),
                    })
                    .with_effect(Effect::AppendAssistant { text })
                    .with_effect(Effect::HandOffSearch { request }))
            } else {
                Ok(TransitionResult::new(
                    SessionState::Collecting {
                        stage: stage.advance_saturating(),
                    },
                    updated,
                )
                .with_effect(Effect::AppendUser {
                    text: pending_input.clone(),
                })
                .with_effect(Effect::AppendAssistant { text }))
            }
        }

        // ============================================================
        // Completion failure: atomic, retryable, nothing mutated
        // ============================================================
        (
            SessionState::AwaitingAssistant {
                stage,
                pending_input,
            },
            Event::CompletionFailed { message, kind },
        ) => Ok(TransitionResult::new(
            SessionState::Collecting { stage: *stage },
            parameters.clone(),
        )
        .with_effect(Effect::NotifyCompletionError {
            message,
            retryable: kind.is_retryable(),
            pending_input: pending_input.clone(),
        })),

        // ============================================================
        // Invalid transitions
        // ============================================================
        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "no transition from {state:?} on {event:?}"
        ))),
    }
}

/// One scripted-mode turn: extract, advance in fixed order, emit the next
/// prompt or finish. Any non-empty input advances, so a session terminates
/// in exactly five user turns.
fn scripted_turn(
    stage: Stage,
    text: &str,
    parameters: &TripParameters,
    context: &SessionContext,
) -> TransitionResult {
    let updated = extract::extract(text, stage, parameters, context.today);
    let next = stage.next();

    if next.is_terminal() {
        let request = SearchRequest::finalize(&updated, &context.defaults, context.today);
        let summary = prompts::ready_summary(&request);
        TransitionResult::new(SessionState::Ready, updated)
            .with_effect(Effect::AppendUser {
                text: text.to_string(),
            })
            .with_effect(Effect::AppendAssistant { text: summary })
            .with_effect(Effect::HandOffSearch { request })
    } else {
        let (prompt, suggestions) = prompts::stage_prompt(next, &updated);
        TransitionResult::new(SessionState::Collecting { stage: next }, updated)
            .with_effect(Effect::AppendUser {
                text: text.to_string(),
            })
            .with_effect(Effect::ShowPrompt {
                text: prompt,
                suggestions,
            })
    }
}
