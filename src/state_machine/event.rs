//! Events that drive a session's turns

use crate::completion::CompletionErrorKind;

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    /// One user utterance.
    UserMessage { text: String },

    /// The full assembled assistant reply. Never a partial fragment:
    /// extraction and stage logic run once, against final text only.
    AssistantReply { text: String },

    /// The completion request failed before a reply was assembled.
    CompletionFailed {
        message: String,
        kind: CompletionErrorKind,
    },
}
