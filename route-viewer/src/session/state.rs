//! Observable state of a solve session.

use std::sync::Arc;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::solution::Solution;

/// Lifecycle of a solve session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// No solve has been started.
    Idle,
    /// Stream open, events being applied.
    Running,
    /// Stream closed normally.
    Completed,
    /// Ended by a transport, protocol or solver error.
    Failed,
    /// Cancelled by the caller or superseded by a newer solve.
    Cancelled,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionStatus::Completed | SessionStatus::Failed | SessionStatus::Cancelled
        )
    }
}

/// Where a session failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Connection, status code or body read failure.
    Transport,
    /// A `data:` frame that is not a valid event.
    Protocol,
    /// The solver sent an `error` event.
    Solver,
}

/// Terminal error surfaced to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct SessionFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl SessionFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// One solver progress line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub received_at: DateTime<Local>,
    pub message: String,
}

impl LogEntry {
    pub fn now(message: impl Into<String>) -> Self {
        Self {
            received_at: Local::now(),
            message: message.into(),
        }
    }
}

/// Snapshot of everything the UI renders for a session.
#[derive(Debug, Clone)]
pub struct SessionState {
    /// Id of the session that owns this state. 0 before the first solve.
    pub session_id: u64,
    pub status: SessionStatus,
    /// Progress lines in arrival order.
    pub logs: Vec<LogEntry>,
    /// Set once per session, from the first `result` event.
    pub solution: Option<Arc<Solution>>,
    pub error: Option<SessionFailure>,
}

impl SessionState {
    /// Fresh state for a session that is about to open its stream.
    pub fn running(session_id: u64) -> Self {
        Self {
            session_id,
            status: SessionStatus::Running,
            logs: Vec::new(),
            solution: None,
            error: None,
        }
    }

    pub fn log_messages(&self) -> Vec<&str> {
        self.logs.iter().map(|l| l.message.as_str()).collect()
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            session_id: 0,
            status: SessionStatus::Idle,
            logs: Vec::new(),
            solution: None,
            error: None,
        }
    }
}
