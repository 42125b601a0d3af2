//! Core functionality for the FlightWatch disruption pipeline.
//!
//! This crate provides the data model (flight states, alerts, bookings),
//! inbound event validation, the repository interface with its SQLite and
//! in-memory backends, configuration loading and logging initialization.

pub mod alert;
pub mod booking;
pub mod config;
pub mod error;
pub mod event;
pub mod flight;
pub mod logging;
pub mod memory;
pub mod repository;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod types;

pub use alert::{Alert, AlertError, AlertQuery, AlertSeverity, AlertType};
pub use booking::{Booking, BookingStatus};
pub use config::{
    Config, DetectorConfig, NotifyConfig, PipelineConfig, ServerConfig, StorageBackend,
    StorageConfig,
};
pub use error::{Error, ParseEnumError, Result};
pub use event::{FlightEvent, FlightUpdate, ValidationErrors};
pub use flight::{FlightState, FlightStatus, MAX_FLIGHT_NUMBER_LEN};
pub use memory::InMemoryRepository;
pub use repository::{FlightRepository, PersistenceError, PersistenceResult};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteRepository;
pub use types::Timestamp;
