//! Error types for waldo-locator
//!
//! Every handler error renders as
//! `{"error": {"code", "message", "details"?, "retry_after"?}}`.

use crate::models::{FailureCode, InputError, JobFailure};
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Session id never existed or was evicted (404)
    #[error("Unknown session: {0}")]
    UnknownSession(String),

    /// Submission rejected by validation (400)
    #[error("{0}")]
    InvalidInput(#[from] InputError),

    /// Request conflicts with session state (409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The job reached a terminal failure
    #[error("{}", .failure.message)]
    JobFailed {
        session_id: String,
        failure: JobFailure,
    },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::UnknownSession(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::JobFailed { failure, .. } => failure_status(failure.code),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::UnknownSession(_) => "UNKNOWN_SESSION",
            ApiError::InvalidInput(e) => e.code(),
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::JobFailed { failure, .. } => failure.code.as_str(),
        }
    }
}

/// HTTP status a terminal job failure is reported with
pub fn failure_status(code: FailureCode) -> StatusCode {
    match code {
        FailureCode::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
        FailureCode::UrlExtractionFailed | FailureCode::NoContent => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let mut error = json!({
            "code": code,
            "message": match &self {
                ApiError::UnknownSession(_) => "Unknown session".to_string(),
                other => other.to_string(),
            },
        });

        match &self {
            ApiError::UnknownSession(session_id) | ApiError::JobFailed { session_id, .. } => {
                error["details"] = json!({ "session_id": session_id });
            }
            _ => {}
        }

        let retry_after = match &self {
            ApiError::JobFailed { failure, .. } => failure.retry_after_secs,
            _ => None,
        };
        if let Some(secs) = retry_after {
            error["retry_after"] = Value::from(secs);
        }

        let mut response = (status, Json(json!({ "error": error }))).into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
