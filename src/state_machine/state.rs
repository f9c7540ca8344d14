//! Session state types

use crate::search::SearchDefaults;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Trip Parameters
// ============================================================================

/// An inclusive start/end pair of travel dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if end < start {
            Self {
                start: end,
                end: start,
            }
        } else {
            Self { start, end }
        }
    }
}

/// Trip parameters gathered over the conversation.
///
/// Fields are filled monotonically: once set, a field is never cleared
/// except by starting a new session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripParameters {
    pub destination: Option<String>,
    pub origin: Option<String>,
    pub dates: Option<DateRange>,
    pub travelers: Option<u32>,
    pub budget: Option<u32>,
}

impl TripParameters {
    /// Names of fields that are still unset, in collection order.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.destination.is_none() {
            out.push("destination");
        }
        if self.origin.is_none() {
            out.push("origin");
        }
        if self.dates.is_none() {
            out.push("dates");
        }
        if self.travelers.is_none() {
            out.push("travelers");
        }
        if self.budget.is_none() {
            out.push("budget");
        }
        out
    }
}

// ============================================================================
// Collection Stage
// ============================================================================

/// The unmet information requirement the conversation is currently
/// focused on. Advances in fixed order; `Ready` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    AwaitingDestination,
    AwaitingOrigin,
    AwaitingDates,
    AwaitingTravelers,
    AwaitingBudget,
    Ready,
}

impl Stage {
    /// The next stage in fixed collection order.
    pub fn next(self) -> Stage {
        match self {
            Stage::AwaitingDestination => Stage::AwaitingOrigin,
            Stage::AwaitingOrigin => Stage::AwaitingDates,
            Stage::AwaitingDates => Stage::AwaitingTravelers,
            Stage::AwaitingTravelers => Stage::AwaitingBudget,
            Stage::AwaitingBudget | Stage::Ready => Stage::Ready,
        }
    }

    /// Advance, but stop short of `Ready`. Used by model-assisted mode,
    /// where only the completion marker finishes the session.
    pub fn advance_saturating(self) -> Stage {
        match self.next() {
            Stage::Ready => Stage::AwaitingBudget,
            next => next,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Ready)
    }
}

// ============================================================================
// Session State
// ============================================================================

/// Machine state for one conversation session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionState {
    /// Waiting for the next user utterance.
    Collecting { stage: Stage },

    /// Model-assisted mode: a completion request is in flight. The pending
    /// user input is held here and only enters the transcript once the
    /// assistant reply arrives.
    AwaitingAssistant { stage: Stage, pending_input: String },

    /// Collection finished and the search request handed off. Terminal.
    Ready,
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState::Collecting {
            stage: Stage::AwaitingDestination,
        }
    }
}

impl SessionState {
    /// A completion request is in flight; user input is rejected.
    pub fn is_busy(&self) -> bool {
        matches!(self, SessionState::AwaitingAssistant { .. })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Ready)
    }
}

// ============================================================================
// Transcript
// ============================================================================

/// Author of a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// One transcript entry. Immutable after creation; ordered by `sequence`,
/// strictly increasing and unique within a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub text: String,
    pub sequence: u64,
}

// ============================================================================
// Conversation Session
// ============================================================================

/// The single owned record of one conversation: transcript, gathered
/// parameters and machine state. Never persisted; discarded when the user
/// starts a new search.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSession {
    pub id: String,
    pub transcript: Vec<Message>,
    pub parameters: TripParameters,
    pub state: SessionState,
    pub created_at: DateTime<Utc>,
}

impl ConversationSession {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            transcript: Vec::new(),
            parameters: TripParameters::default(),
            state: SessionState::default(),
            created_at: Utc::now(),
        }
    }

    /// Append a message, assigning the next sequence number.
    pub fn push_message(&mut self, role: Role, text: impl Into<String>) -> Message {
        let sequence = self.transcript.last().map_or(1, |m| m.sequence + 1);
        let message = Message {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            text: text.into(),
            sequence,
        };
        self.transcript.push(message.clone());
        message
    }
}

// ============================================================================
// Operating Mode and Turn Context
// ============================================================================

/// How prompts are produced. Fixed per deployment, not per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Prompts come from the fixed per-stage templates.
    Scripted,
    /// Prompts come from the external completion provider; a marker token
    /// in the assistant text signals completion.
    ModelAssisted,
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "scripted" => Ok(Mode::Scripted),
            "model" | "model-assisted" | "model_assisted" => Ok(Mode::ModelAssisted),
            other => Err(format!("unknown mode: {other}")),
        }
    }
}

/// Immutable inputs to one turn's transition: the deployment mode, the
/// reference date for relative-date resolution, and the finalization
/// defaults. Constructed fresh per turn by the session controller.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub mode: Mode,
    pub today: NaiveDate,
    pub defaults: SearchDefaults,
}
