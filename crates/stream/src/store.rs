//! FlightState Store
//!
//! In-memory map of the current state per flight, written through to the
//! durable repository. The event worker is the only writer; query paths read
//! concurrently without any locking of their own.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use flightwatch_core::{FlightRepository, FlightState};
use std::sync::Arc;
use tracing::{debug, error};

use crate::metrics::PipelineMetrics;

/// Cache of current flight states backed by a [`FlightRepository`].
pub struct FlightStateStore {
    states: DashMap<String, FlightState>,
    repository: Arc<dyn FlightRepository>,
    metrics: Arc<PipelineMetrics>,
}

impl FlightStateStore {
    /// Create an empty store.
    pub fn new(repository: Arc<dyn FlightRepository>, metrics: Arc<PipelineMetrics>) -> Self {
        Self {
            states: DashMap::new(),
            repository,
            metrics,
        }
    }

    /// Replace the state for `state.flight_number` and return the one it
    /// replaced.
    ///
    /// The new entry keeps the previous `created_at` and never moves
    /// `updated_at` backwards. The cache is updated first; a failure to
    /// persist is logged and counted but leaves the cached state in place.
    pub async fn upsert(&self, state: FlightState) -> Option<FlightState> {
        let (previous, stored) = match self.states.entry(state.flight_number.clone()) {
            Entry::Occupied(mut entry) => {
                let stored = state.succeeding(Some(entry.get()));
                let previous = entry.insert(stored.clone());
                (Some(previous), stored)
            }
            Entry::Vacant(entry) => {
                entry.insert(state.clone());
                (None, state)
            }
        };

        let flight_number = stored.flight_number.clone();
        let repository = Arc::clone(&self.repository);
        let persisted =
            tokio::task::spawn_blocking(move || repository.upsert_flight_state(&stored)).await;

        match persisted {
            Ok(Ok(())) => {
                debug!(flight_number = %flight_number, "Flight state persisted");
            }
            Ok(Err(e)) => {
                self.metrics.record_persistence_failure();
                error!(flight_number = %flight_number, error = %e, "Failed to persist flight state");
            }
            Err(e) => {
                self.metrics.record_persistence_failure();
                error!(flight_number = %flight_number, error = %e, "Flight state write task failed");
            }
        }

        previous
    }

    /// Current state of a flight, from memory only.
    pub fn get(&self, flight_number: &str) -> Option<FlightState> {
        self.states.get(flight_number).map(|entry| entry.value().clone())
    }

    /// Number of tracked flights
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
