//! Server-Sent Events (SSE) framing
//!
//! Progress streams use unnamed (`message`) events so a browser
//! `EventSource.onmessage` handler sees every frame; the JSON payload's
//! `status` field carries the phase.

use crate::events::ProgressEvent;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde_json::json;
use std::time::Duration;
use tracing::warn;

/// Transport-level keep-alive, independent of progress heartbeats
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Acknowledgment sent once when an observer attaches
pub fn connected_event(session_id: &str) -> Event {
    Event::default().data(
        json!({
            "status": "connected",
            "session_id": session_id,
        })
        .to_string(),
    )
}

/// Idle heartbeat
pub fn heartbeat_event() -> Event {
    Event::default().data(json!({ "heartbeat": true }).to_string())
}

/// Frame a progress event as JSON
pub fn progress_event(event: &ProgressEvent) -> Event {
    match serde_json::to_string(event) {
        Ok(data) => Event::default().data(data),
        Err(e) => {
            warn!("SSE: Failed to serialize event {}: {}", event.event_type(), e);
            Event::default().comment("serialization-error")
        }
    }
}

/// Terminal error frame for a stream that has no session behind it
pub fn unknown_session_event(session_id: &str) -> Event {
    Event::default().data(
        json!({
            "status": "error",
            "session_id": session_id,
            "message": "Unknown session",
        })
        .to_string(),
    )
}

/// Wrap a stream in an SSE response with transport keep-alive
pub fn sse_response<S, E>(stream: S) -> Sse<impl Stream<Item = Result<Event, E>>>
where
    S: Stream<Item = Result<Event, E>> + Send + 'static,
    E: Into<axum::BoxError>,
{
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(KEEP_ALIVE_INTERVAL)
            .text("keep-alive"),
    )
}
