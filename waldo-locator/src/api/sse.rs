//! Server-Sent Events (SSE) stream of one session's progress
//!
//! Frame order: `connected` acknowledgment, buffered history, live events
//! (with heartbeats while idle), then the terminal event. The stream closes
//! after a short grace delay so the client can pull the result first.

use crate::progress::Subscription;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::header,
    response::{sse::Event, IntoResponse},
    routing::get,
    Router,
};
use std::convert::Infallible;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use waldo_common::sse::{
    connected_event, heartbeat_event, progress_event, sse_response, unknown_session_event,
};

/// GET /api/progress/:session_id
pub async fn progress_stream(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let session = state.registry.get(&session_id).await;
    let heartbeat_interval = state.config.heartbeat_interval;
    let close_grace = state.config.stream_close_grace;

    info!(session_id = %session_id, known = session.is_some(), "SSE client connected");

    let stream = async_stream::stream! {
        yield Ok::<Event, Infallible>(connected_event(&session_id));

        let Some(session) = session else {
            warn!(session_id = %session_id, "SSE: Unknown session");
            yield Ok(unknown_session_event(&session_id));
            return;
        };

        let Subscription { history, mut receiver } = session.subscribe();
        let mut finished = false;

        for event in &history {
            finished = event.is_terminal();
            yield Ok(progress_event(event));
        }

        while !finished {
            tokio::select! {
                _ = tokio::time::sleep(heartbeat_interval) => {
                    yield Ok(heartbeat_event());
                }
                received = receiver.recv() => {
                    match received {
                        Ok(event) => {
                            finished = event.is_terminal();
                            debug!(session_id = %session_id, phase = %event.phase, "SSE: Forwarding event");
                            yield Ok(progress_event(&event));
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(session_id = %session_id, skipped, "SSE: Client lagged, events skipped");
                        }
                        Err(RecvError::Closed) => {
                            warn!(session_id = %session_id, "SSE: Session closed without terminal event");
                            break;
                        }
                    }
                }
            }
        }

        if finished {
            tokio::time::sleep(close_grace).await;
        }
        debug!(session_id = %session_id, "SSE: Stream closed");
    };

    ([(header::CACHE_CONTROL, "no-cache")], sse_response(stream))
}

/// Build progress stream routes
pub fn progress_routes() -> Router<AppState> {
    Router::new().route("/api/progress/:session_id", get(progress_stream))
}
