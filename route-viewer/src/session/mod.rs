//! Solve sessions.
//!
//! A [`SolveSession`] is the caller-owned value that starts and cancels
//! solves against the streaming solve endpoint and accumulates what the
//! stream reports: progress logs, the solution, or a terminal error.

mod controller;
mod options;
mod state;
mod transport;

pub use controller::{SolveHandle, SolveSession};
pub use options::{OptionsError, SolveOptions, SolverKind};
pub use state::{FailureKind, LogEntry, SessionFailure, SessionState, SessionStatus};
pub use transport::{ByteStream, HttpSolveTransport, SolveTransport, SolverClientConfig};
