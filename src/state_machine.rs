//! Core conversation state machine
//!
//! Elm-style pure transitions: each turn maps the current state and an
//! event to a new state plus effects for the session controller.

mod effect;
pub mod event;
pub mod state;
mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::Event;
pub use state::{ConversationSession, Mode, SessionContext, SessionState, Stage};
pub use transition::{transition, TransitionError, TransitionResult};
