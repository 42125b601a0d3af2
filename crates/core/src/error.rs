//! Core error types

use thiserror::Error;

use crate::event::ValidationErrors;
use crate::repository::PersistenceError;

/// Core error type for FlightWatch
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or inconsistent configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file could not be parsed
    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Repository failure
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// Rejected inbound event
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A string did not name any variant of a closed enum.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value:?}")]
pub struct ParseEnumError {
    /// Which enum was being parsed
    pub kind: &'static str,
    /// The rejected input
    pub value: String,
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
