//! Progress event vocabulary
//!
//! Shared between the job that emits progress and every observer that
//! streams it.

mod phase;

pub use phase::ProgressPhase;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One progress notification for a session
///
/// Immutable once emitted; a session's events form an append-only log.
/// Field names on the wire follow the browser client's expectations
/// (`status`, `progress_percent`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Session this event belongs to
    pub session_id: String,
    /// Lifecycle phase
    #[serde(rename = "status")]
    pub phase: ProgressPhase,
    /// Human-readable status line
    pub message: String,
    /// Progress hint (0.0 - 100.0)
    #[serde(rename = "progress_percent")]
    pub percent: f64,
    /// Item currently being worked on, truncated for display
    pub current_item: Option<String>,
    /// Total number of items in this phase
    pub total_items: Option<usize>,
    /// 1-based count of items finished in this phase
    pub current_index: Option<usize>,
    /// Emission time
    pub timestamp: DateTime<Utc>,
}

impl ProgressEvent {
    /// Create an event stamped with the current time
    pub fn new(
        session_id: impl Into<String>,
        phase: ProgressPhase,
        message: impl Into<String>,
        percent: f64,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            phase,
            message: message.into(),
            percent: percent.clamp(0.0, 100.0),
            current_item: None,
            total_items: None,
            current_index: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_current_item(mut self, item: impl Into<String>) -> Self {
        self.current_item = Some(item.into());
        self
    }

    pub fn with_total_items(mut self, total: usize) -> Self {
        self.total_items = Some(total);
        self
    }

    pub fn with_current_index(mut self, index: usize) -> Self {
        self.current_index = Some(index);
        self
    }

    /// Whether no further events may follow this one
    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Event type name for SSE framing and logging
    pub fn event_type(&self) -> &'static str {
        self.phase.as_str()
    }
}
