//! Per-session progress state machine
//!
//! The owning job is the only writer. Every emitted event is appended to
//! the session history and broadcast to live subscribers under the same
//! lock, so a subscriber attaching mid-job gets a gap-free, duplicate-free
//! view: history first, then live events.

use crate::models::{ArticleResult, JobFailure, PullResult, Session, SessionOutcome};
use chrono::{DateTime, Utc};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use waldo_common::events::{ProgressEvent, ProgressPhase};

/// Live events buffered per subscriber before it lags
const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgressError {
    #[error("Session {0} already finished")]
    AfterTerminal(String),

    #[error("Phase cannot move from {from} to {to}")]
    PhaseRegression {
        from: ProgressPhase,
        to: ProgressPhase,
    },

    #[error("Terminal phase {0} must be reached through complete() or fail()")]
    TerminalPhase(ProgressPhase),
}

#[derive(Debug)]
struct SessionState {
    phase: ProgressPhase,
    events: Vec<ProgressEvent>,
    outcome: Option<SessionOutcome>,
}

/// History snapshot plus a receiver for everything after it
pub struct Subscription {
    pub history: Vec<ProgressEvent>,
    pub receiver: broadcast::Receiver<ProgressEvent>,
}

pub struct ProgressBroadcaster {
    session_id: String,
    created_at: DateTime<Utc>,
    state: RwLock<SessionState>,
    tx: broadcast::Sender<ProgressEvent>,
    cancel_token: CancellationToken,
}

impl ProgressBroadcaster {
    pub fn new(session_id: impl Into<String>) -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            session_id: session_id.into(),
            created_at: Utc::now(),
            state: RwLock::new(SessionState {
                phase: ProgressPhase::Starting,
                events: Vec::new(),
                outcome: None,
            }),
            tx,
            cancel_token: CancellationToken::new(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Event for this session, stamped now
    pub fn event(&self, phase: ProgressPhase, message: impl Into<String>, percent: f64) -> ProgressEvent {
        ProgressEvent::new(self.session_id.clone(), phase, message, percent)
    }

    /// Record and broadcast a non-terminal event
    pub fn emit(&self, event: ProgressEvent) -> Result<(), ProgressError> {
        if event.phase.is_terminal() {
            return Err(ProgressError::TerminalPhase(event.phase));
        }
        let mut state = self.write_state();
        self.publish(&mut state, event)
    }

    /// Attach the result and emit the `complete` event
    pub fn complete(&self, result: ArticleResult, message: impl Into<String>) -> Result<(), ProgressError> {
        let event = self
            .event(ProgressPhase::Complete, message, 100.0)
            .with_total_items(result.locations.len());
        let mut state = self.write_state();
        self.publish(&mut state, event)?;
        state.outcome = Some(SessionOutcome::Complete(result));
        Ok(())
    }

    /// Attach the failure and emit the `error` event
    pub fn fail(&self, failure: JobFailure) -> Result<(), ProgressError> {
        let percent = self.read_state().events.last().map_or(0.0, |e| e.percent);
        let event = self.event(ProgressPhase::Error, format!("Error: {}", failure.message), percent);
        let mut state = self.write_state();
        self.publish(&mut state, event)?;
        state.outcome = Some(SessionOutcome::Failed(failure));
        Ok(())
    }

    fn publish(&self, state: &mut SessionState, event: ProgressEvent) -> Result<(), ProgressError> {
        if state.outcome.is_some() || state.phase.is_terminal() {
            return Err(ProgressError::AfterTerminal(self.session_id.clone()));
        }
        if !state.phase.can_advance_to(event.phase) {
            return Err(ProgressError::PhaseRegression {
                from: state.phase,
                to: event.phase,
            });
        }

        state.phase = event.phase;
        state.events.push(event.clone());

        match self.tx.send(event) {
            Ok(receivers) => debug!(session_id = %self.session_id, phase = %state.phase, receivers, "Progress event broadcast"),
            Err(_) => debug!(session_id = %self.session_id, phase = %state.phase, "No live receivers for progress event"),
        }
        Ok(())
    }

    /// Everything emitted so far, plus a receiver for what follows
    pub fn subscribe(&self) -> Subscription {
        let state = self.read_state();
        Subscription {
            history: state.events.clone(),
            receiver: self.tx.subscribe(),
        }
    }

    pub fn phase(&self) -> ProgressPhase {
        self.read_state().phase
    }

    pub fn is_terminal(&self) -> bool {
        self.read_state().phase.is_terminal()
    }

    pub fn result(&self) -> PullResult {
        let state = self.read_state();
        match &state.outcome {
            Some(SessionOutcome::Complete(result)) => PullResult::Complete(result.clone()),
            Some(SessionOutcome::Failed(failure)) => PullResult::Failed(failure.clone()),
            None => PullResult::NotReady { phase: state.phase },
        }
    }

    pub fn snapshot(&self) -> Session {
        let state = self.read_state();
        let final_result = match &state.outcome {
            Some(SessionOutcome::Complete(result)) => Some(result.clone()),
            _ => None,
        };
        Session {
            id: self.session_id.clone(),
            created_at: self.created_at,
            phase: state.phase,
            events: state.events.clone(),
            warnings: final_result
                .as_ref()
                .map(|r| r.warnings.clone())
                .unwrap_or_default(),
            final_result,
            terminal: state.phase.is_terminal(),
        }
    }

    /// Token every suspension point of the job selects on
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    fn read_state(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
