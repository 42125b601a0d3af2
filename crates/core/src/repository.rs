//! Durable repository interface.
//!
//! The pipeline only talks to storage through [`FlightRepository`]. Every
//! method returns an explicit [`PersistenceResult`]; callers decide whether a
//! failure is fatal (it never is inside the workers, which log and continue).

use thiserror::Error;

use crate::alert::{Alert, AlertQuery};
use crate::booking::Booking;
use crate::flight::FlightState;
use crate::types::Timestamp;

/// Errors returned by repository implementations.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// SQLite failure
    #[cfg(feature = "sqlite")]
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Stored JSON could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error while opening the store
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No alert with this identifier
    #[error("Alert not found: {alert_id}")]
    AlertNotFound {
        /// Alert identifier
        alert_id: String,
    },

    /// The alert was resolved before
    #[error("Alert already resolved: {alert_id}")]
    AlreadyResolved {
        /// Alert identifier
        alert_id: String,
    },

    /// Backend cannot serve requests
    #[error("Repository unavailable: {0}")]
    Unavailable(String),
}

/// Result type for repository operations.
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Storage for flight states, alerts and bookings.
///
/// Implementations are blocking; async callers should hop onto a blocking
/// thread before calling in.
pub trait FlightRepository: Send + Sync {
    /// Insert or replace the durable state for `state.flight_number`.
    ///
    /// The stored `created_at` of an existing row is kept.
    fn upsert_flight_state(&self, state: &FlightState) -> PersistenceResult<()>;

    /// Durable state for a flight.
    fn get_flight_state(&self, flight_number: &str) -> PersistenceResult<Option<FlightState>>;

    /// Append a new alert.
    fn insert_alert(&self, alert: &Alert) -> PersistenceResult<()>;

    /// One alert by identifier.
    fn get_alert(&self, alert_id: &str) -> PersistenceResult<Option<Alert>>;

    /// Alerts matching `query`, newest first.
    fn list_alerts(&self, query: &AlertQuery) -> PersistenceResult<Vec<Alert>>;

    /// The `limit` most recent alerts, newest first.
    fn list_recent_alerts(&self, limit: usize) -> PersistenceResult<Vec<Alert>> {
        self.list_alerts(&AlertQuery::recent(limit))
    }

    /// Move an alert to resolved. Fails if missing or already resolved.
    fn resolve_alert(&self, alert_id: &str, resolved_at: Timestamp) -> PersistenceResult<Alert>;

    /// Record a booking.
    fn insert_booking(&self, booking: &Booking) -> PersistenceResult<()>;

    /// Customer ids holding confirmed bookings on a flight, deduplicated, in
    /// booking order.
    fn find_bookings_by_flight(&self, flight_number: &str) -> PersistenceResult<Vec<String>>;
}

/// Keep the first occurrence of each id.
pub(crate) fn dedup_preserving_order(ids: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}
