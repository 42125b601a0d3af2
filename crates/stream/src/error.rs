//! Error types for FlightWatch pipeline operations.

use flightwatch_core::{PersistenceError, ValidationErrors};
use thiserror::Error;

/// Why an event was not accepted by [`crate::DisruptionMonitor::submit`].
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The payload failed validation; nothing was enqueued
    #[error(transparent)]
    Invalid(#[from] ValidationErrors),

    /// The event queue is at capacity
    #[error("Event queue is full")]
    QueueFull,

    /// The monitor has been stopped
    #[error("Event queue is closed")]
    Closed,
}

impl SubmitError {
    /// Field errors for a validation failure.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            SubmitError::Invalid(errors) => Some(errors),
            _ => None,
        }
    }
}

/// Errors from the monitor lifecycle and query surface.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// `start()` was called on a running monitor
    #[error("Monitor already started")]
    AlreadyStarted,

    /// `start()` was called after `stop()`
    #[error("Monitor was stopped and cannot be restarted")]
    NotRestartable,

    /// A worker did not drain within the shutdown timeout
    #[error("{worker} did not stop within {timeout_ms}ms")]
    ShutdownTimeout {
        /// Worker name
        worker: &'static str,
        /// Configured timeout in milliseconds
        timeout_ms: u64,
    },

    /// Repository failure on a query
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// A blocking task or worker panicked
    #[error("Task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Result type for monitor operations.
pub type MonitorResult<T> = Result<T, MonitorError>;
