//! Job submission, result pull, and cancellation

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::info;
use waldo_common::events::ProgressPhase;

use crate::error::{ApiError, ApiResult};
use crate::models::{parse_input, ExtractRequest, PullResult};
use crate::AppState;

/// Response for an accepted submission or a pending result
#[derive(Debug, Serialize)]
pub struct SessionStatusResponse {
    pub session_id: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<ProgressPhase>,
}

/// POST /api/extract
///
/// Validates the input, creates a session, and starts the job in the
/// background. Returns 202 with the session id immediately.
pub async fn submit(State(state): State<AppState>, body: Bytes) -> ApiResult<impl IntoResponse> {
    let request: Option<ExtractRequest> = serde_json::from_slice(&body).ok();
    let input = parse_input(request.as_ref().and_then(|r| r.input.as_deref()))?;

    let session = state.registry.create().await;
    let session_id = session.session_id().to_string();

    info!(session_id = %session_id, is_url = input.is_url(), "Extraction requested");

    state
        .workflow
        .spawn(input, session, state.registry.clone());

    Ok((
        StatusCode::ACCEPTED,
        Json(SessionStatusResponse {
            session_id,
            status: "starting",
            phase: None,
        }),
    ))
}

/// GET /api/result/:session_id
pub async fn get_result(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Response> {
    match state.registry.pull_result(&session_id).await {
        PullResult::Complete(result) => Ok(Json(result).into_response()),
        PullResult::NotReady { phase } => Ok((
            StatusCode::ACCEPTED,
            Json(SessionStatusResponse {
                session_id,
                status: "processing",
                phase: Some(phase),
            }),
        )
            .into_response()),
        PullResult::Failed(failure) => Err(ApiError::JobFailed {
            session_id,
            failure,
        }),
        PullResult::UnknownSession => Err(ApiError::UnknownSession(session_id)),
    }
}

/// POST /api/cancel/:session_id
pub async fn cancel(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<SessionStatusResponse>> {
    let session = state
        .registry
        .get(&session_id)
        .await
        .ok_or_else(|| ApiError::UnknownSession(session_id.clone()))?;

    if session.is_terminal() {
        return Err(ApiError::Conflict(format!(
            "Session {} has already finished",
            session_id
        )));
    }

    info!(session_id = %session_id, "Cancellation requested");
    session.cancel();

    Ok(Json(SessionStatusResponse {
        session_id,
        status: "cancelling",
        phase: None,
    }))
}

/// Build submission/result/cancel routes
pub fn extract_routes() -> Router<AppState> {
    Router::new()
        .route("/api/extract", post(submit))
        .route("/api/result/:session_id", get(get_result))
        .route("/api/cancel/:session_id", post(cancel))
}
