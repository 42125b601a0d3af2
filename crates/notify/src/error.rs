//! Error types for notification dispatch.

use thiserror::Error;

/// Errors that can occur when dispatching an alert.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint answered with a non-success status
    #[error("{channel} returned {status}: {body}")]
    Status {
        /// Channel name
        channel: String,
        /// HTTP status code
        status: u16,
        /// Response body, possibly empty
        body: String,
    },

    /// Channel-specific failure
    #[error("{channel} failed: {reason}")]
    Channel {
        /// Channel name
        channel: String,
        /// Failure description
        reason: String,
    },

    /// Some channels of a fan-out failed
    #[error("dispatch failed on {}", .failed.join(", "))]
    Partial {
        /// Names of the failed channels
        failed: Vec<String>,
    },
}
