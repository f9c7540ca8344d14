//! Server-Sent Events support

use crate::session::SessionEvent;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde_json::json;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Convert a broadcast subscription to an SSE stream, led by a snapshot
/// init event.
pub fn sse_stream(
    init_event: SessionEvent,
    broadcast_rx: tokio::sync::broadcast::Receiver<SessionEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let init = futures::stream::once(async move { Ok(session_event_to_axum(init_event)) });

    let broadcasts = BroadcastStream::new(broadcast_rx).filter_map(|result| match result {
        Ok(event) => Some(Ok(session_event_to_axum(event))),
        Err(_) => None, // Skip lagged messages
    });

    let combined = init.chain(broadcasts);

    Sse::new(combined).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn session_event_to_axum(event: SessionEvent) -> Event {
    let (event_type, data) = match event {
        SessionEvent::Init { session } => (
            "init",
            json!({
                "type": "init",
                "session": session
            }),
        ),
        SessionEvent::Message { message } => (
            "message",
            json!({
                "type": "message",
                "message": message
            }),
        ),
        SessionEvent::AssistantFragment { text } => (
            "assistant_fragment",
            json!({
                "type": "assistant_fragment",
                "text": text
            }),
        ),
        SessionEvent::Prompt { text, suggestions } => (
            "prompt",
            json!({
                "type": "prompt",
                "text": text,
                "suggestions": suggestions
            }),
        ),
        SessionEvent::Parameters { parameters } => (
            "parameters",
            json!({
                "type": "parameters",
                "parameters": parameters
            }),
        ),
        SessionEvent::StateChange { state } => (
            "state_change",
            json!({
                "type": "state_change",
                "state": state
            }),
        ),
        SessionEvent::CompletionError {
            message,
            retryable,
            pending_input,
        } => (
            "completion_error",
            json!({
                "type": "completion_error",
                "message": message,
                "retryable": retryable,
                "pending_input": pending_input
            }),
        ),
        SessionEvent::SearchReady { request } => (
            "search_ready",
            json!({
                "type": "search_ready",
                "request": request
            }),
        ),
        SessionEvent::Error { message } => (
            "error",
            json!({
                "type": "error",
                "message": message
            }),
        ),
    };

    Event::default().event(event_type).data(data.to_string())
}
