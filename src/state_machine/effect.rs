//! Effects produced by state transitions

use crate::search::SearchRequest;

/// Effects to be executed by the session controller after a transition
#[derive(Debug, Clone)]
pub enum Effect {
    /// Append the user's message to the transcript.
    AppendUser { text: String },

    /// Append an assistant message to the transcript.
    AppendAssistant { text: String },

    /// Append the next scripted prompt to the transcript and surface it,
    /// with quick-reply suggestions where the stage has them.
    ShowPrompt {
        text: String,
        suggestions: Vec<String>,
    },

    /// Dispatch a completion request for the held user input (spawned as a
    /// background task; the reply comes back as an event).
    RequestCompletion { pending_input: String },

    /// Hand the finalized search request off. Emitted exactly once per
    /// session, on entering the terminal state.
    HandOffSearch { request: SearchRequest },

    /// Surface a recoverable provider failure. The rejected input rides
    /// along so the caller can resubmit it.
    NotifyCompletionError {
        message: String,
        retryable: bool,
        pending_input: String,
    },
}
