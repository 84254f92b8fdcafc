//! Session snapshots and job outcomes as seen by readers

use super::resolved::{ArticleResult, Warning};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use waldo_common::events::{ProgressEvent, ProgressPhase};

/// Stable codes for terminal job failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureCode {
    RateLimitExceeded,
    UrlExtractionFailed,
    NoContent,
    ConfigurationError,
    Cancelled,
    Timeout,
    InternalError,
}

impl FailureCode {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureCode::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            FailureCode::UrlExtractionFailed => "URL_EXTRACTION_FAILED",
            FailureCode::NoContent => "NO_CONTENT",
            FailureCode::ConfigurationError => "CONFIGURATION_ERROR",
            FailureCode::Cancelled => "CANCELLED",
            FailureCode::Timeout => "TIMEOUT",
            FailureCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

/// Terminal failure attached to a session in place of a result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobFailure {
    pub code: FailureCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

/// What a session ended with
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    Complete(ArticleResult),
    Failed(JobFailure),
}

/// Answer to "is the result ready?"
#[derive(Debug, Clone, PartialEq)]
pub enum PullResult {
    /// Job has not reached a terminal phase yet
    NotReady { phase: ProgressPhase },
    Complete(ArticleResult),
    Failed(JobFailure),
    /// Never existed, or already evicted
    UnknownSession,
}

/// Point-in-time copy of a session's observable state
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub phase: ProgressPhase,
    pub events: Vec<ProgressEvent>,
    pub final_result: Option<ArticleResult>,
    pub warnings: Vec<Warning>,
    pub terminal: bool,
}
