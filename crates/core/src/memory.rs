//! In-memory flight repository for tests and the `memory` storage backend.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::alert::{Alert, AlertQuery};
use crate::booking::{Booking, BookingStatus};
use crate::flight::FlightState;
use crate::repository::{
    dedup_preserving_order, FlightRepository, PersistenceError, PersistenceResult,
};
use crate::types::Timestamp;

#[derive(Debug, Default)]
struct Tables {
    flights: HashMap<String, FlightState>,
    /// Insertion order doubles as the tie-breaker for equal `created_at`.
    alerts: Vec<Alert>,
    bookings: Vec<Booking>,
}

/// Repository that keeps everything in process memory.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    tables: RwLock<Tables>,
}

impl InMemoryRepository {
    /// Empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored alerts.
    pub fn alert_count(&self) -> usize {
        self.read().map(|t| t.alerts.len()).unwrap_or(0)
    }

    fn read(&self) -> PersistenceResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| PersistenceError::Unavailable("repository lock poisoned".to_string()))
    }

    fn write(&self) -> PersistenceResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| PersistenceError::Unavailable("repository lock poisoned".to_string()))
    }
}

impl FlightRepository for InMemoryRepository {
    fn upsert_flight_state(&self, state: &FlightState) -> PersistenceResult<()> {
        let mut tables = self.write()?;
        let stored = match tables.flights.get(&state.flight_number) {
            Some(existing) => {
                let mut next = state.clone();
                next.created_at = existing.created_at;
                next.updated_at = next.updated_at.max(existing.updated_at);
                next
            }
            None => state.clone(),
        };
        tables.flights.insert(stored.flight_number.clone(), stored);
        Ok(())
    }

    fn get_flight_state(&self, flight_number: &str) -> PersistenceResult<Option<FlightState>> {
        Ok(self.read()?.flights.get(flight_number).cloned())
    }

    fn insert_alert(&self, alert: &Alert) -> PersistenceResult<()> {
        let mut tables = self.write()?;
        if tables.alerts.iter().any(|a| a.id == alert.id) {
            return Err(PersistenceError::Unavailable(format!(
                "duplicate alert id {}",
                alert.id
            )));
        }
        tables.alerts.push(alert.clone());
        Ok(())
    }

    fn get_alert(&self, alert_id: &str) -> PersistenceResult<Option<Alert>> {
        Ok(self
            .read()?
            .alerts
            .iter()
            .find(|a| a.id == alert_id)
            .cloned())
    }

    fn list_alerts(&self, query: &AlertQuery) -> PersistenceResult<Vec<Alert>> {
        let tables = self.read()?;
        let mut matching: Vec<(usize, &Alert)> = tables
            .alerts
            .iter()
            .enumerate()
            .filter(|(_, a)| query.matches(a))
            .collect();
        matching.sort_by(|(ia, a), (ib, b)| b.created_at.cmp(&a.created_at).then(ib.cmp(ia)));

        Ok(matching
            .into_iter()
            .take(query.effective_limit())
            .map(|(_, a)| a.clone())
            .collect())
    }

    fn resolve_alert(&self, alert_id: &str, resolved_at: Timestamp) -> PersistenceResult<Alert> {
        let mut tables = self.write()?;
        let alert = tables
            .alerts
            .iter_mut()
            .find(|a| a.id == alert_id)
            .ok_or_else(|| PersistenceError::AlertNotFound {
                alert_id: alert_id.to_string(),
            })?;

        alert
            .resolve(resolved_at)
            .map_err(|_| PersistenceError::AlreadyResolved {
                alert_id: alert_id.to_string(),
            })?;

        Ok(alert.clone())
    }

    fn insert_booking(&self, booking: &Booking) -> PersistenceResult<()> {
        self.write()?.bookings.push(booking.clone());
        Ok(())
    }

    fn find_bookings_by_flight(&self, flight_number: &str) -> PersistenceResult<Vec<String>> {
        let tables = self.read()?;
        let ids = tables
            .bookings
            .iter()
            .filter(|b| b.flight_number == flight_number && b.status == BookingStatus::Confirmed)
            .map(|b| b.customer_id.clone());
        Ok(dedup_preserving_order(ids))
    }
}
