//! API request and response types

use crate::state_machine::Mode;
use serde::{Deserialize, Serialize};

/// Request to send one user turn
#[derive(Debug, Deserialize)]
pub struct TurnRequest {
    pub text: String,
}

/// Response with a session snapshot
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session: serde_json::Value,
    pub mode: Mode,
    pub busy: bool,
    /// Parameters still unset, in collection order.
    pub missing: Vec<&'static str>,
}

/// Response for turn submission
#[derive(Debug, Serialize)]
pub struct TurnResponse {
    pub queued: bool,
}

/// Response for discard
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
