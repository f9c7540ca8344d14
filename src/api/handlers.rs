//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{ErrorResponse, SessionResponse, SuccessResponse, TurnRequest, TurnResponse};
use super::AppState;
use crate::session::SessionEvent;
use crate::state_machine::ConversationSession;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Session creation
        .route("/api/sessions", post(create_session))
        // Session retrieval
        .route("/api/sessions/:id", get(get_session))
        // User turns
        .route("/api/sessions/:id/messages", post(send_message))
        // New-search lifecycle
        .route("/api/sessions/:id/discard", post(discard_session))
        // SSE streaming
        .route("/api/sessions/:id/stream", get(stream_session))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Session Creation
// ============================================================

async fn create_session(State(state): State<AppState>) -> Json<SessionResponse> {
    let snapshot = state.sessions.create_session().await;
    Json(session_response(&state, &snapshot))
}

// ============================================================
// Session Retrieval
// ============================================================

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, AppError> {
    let snapshot = state
        .sessions
        .snapshot(&id)
        .await
        .ok_or_else(|| AppError::NotFound("session not found".to_string()))?;
    Ok(Json(session_response(&state, &snapshot)))
}

fn session_response(state: &AppState, snapshot: &ConversationSession) -> SessionResponse {
    SessionResponse {
        busy: snapshot.state.is_busy(),
        mode: state.sessions.mode(),
        missing: snapshot.parameters.missing(),
        session: serde_json::to_value(snapshot).unwrap_or(Value::Null),
    }
}

// ============================================================
// User Turns
// ============================================================

async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<TurnRequest>,
) -> Result<Json<TurnResponse>, AppError> {
    if req.text.trim().is_empty() {
        return Err(AppError::BadRequest("message text is empty".to_string()));
    }

    // Soft pre-checks for a synchronous status code; the state machine
    // enforces the same rules against races.
    let snapshot = state
        .sessions
        .snapshot(&id)
        .await
        .ok_or_else(|| AppError::NotFound("session not found".to_string()))?;
    if snapshot.state.is_busy() {
        return Err(AppError::Conflict(
            "session is waiting on the assistant".to_string(),
        ));
    }
    if snapshot.state.is_terminal() {
        return Err(AppError::Conflict(
            "session already completed, start a new search".to_string(),
        ));
    }

    state
        .sessions
        .send_message(&id, req.text)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(TurnResponse { queued: true }))
}

// ============================================================
// New-Search Lifecycle
// ============================================================

async fn discard_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    if state.sessions.discard(&id).await {
        Ok(Json(SuccessResponse { success: true }))
    } else {
        Err(AppError::NotFound("session not found".to_string()))
    }
}

// ============================================================
// SSE Streaming
// ============================================================

async fn stream_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let (snapshot, receiver) = state
        .sessions
        .subscribe(&id)
        .await
        .ok_or_else(|| AppError::NotFound("session not found".to_string()))?;

    let init = SessionEvent::Init {
        session: serde_json::to_value(&snapshot).unwrap_or(Value::Null),
    };

    Ok(sse_stream(init, receiver))
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("wanderai ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

enum AppError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
