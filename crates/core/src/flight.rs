//! Flight state model.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseEnumError;
use crate::event::FlightUpdate;
use crate::types::Timestamp;

/// Maximum length of a flight number.
pub const MAX_FLIGHT_NUMBER_LEN: usize = 20;

/// Operational status of a flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlightStatus {
    /// Operating to schedule
    OnTime,
    /// Running behind schedule
    Delayed,
    /// Will not operate
    Cancelled,
    /// Left the gate
    Departed,
    /// Reached the destination
    Arrived,
    /// Passengers are boarding
    Boarding,
}

impl FlightStatus {
    /// Every status, in wire order.
    pub const ALL: [FlightStatus; 6] = [
        FlightStatus::OnTime,
        FlightStatus::Delayed,
        FlightStatus::Cancelled,
        FlightStatus::Departed,
        FlightStatus::Arrived,
        FlightStatus::Boarding,
    ];

    /// Wire representation (`ON_TIME`, `DELAYED`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            FlightStatus::OnTime => "ON_TIME",
            FlightStatus::Delayed => "DELAYED",
            FlightStatus::Cancelled => "CANCELLED",
            FlightStatus::Departed => "DEPARTED",
            FlightStatus::Arrived => "ARRIVED",
            FlightStatus::Boarding => "BOARDING",
        }
    }
}

impl fmt::Display for FlightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlightStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FlightStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("flight status", s))
    }
}

/// Last known operational status of one flight.
///
/// There is exactly one current state per `flight_number`. `created_at` is
/// fixed by the first write for a flight; `updated_at` never moves backwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightState {
    /// Natural key
    pub flight_number: String,
    /// Current status
    pub status: FlightStatus,
    /// Estimated arrival time
    pub estimated_arrival: Timestamp,
    /// Scheduled arrival time, when known
    pub scheduled_arrival: Option<Timestamp>,
    /// Origin airport code
    pub origin: Option<String>,
    /// Destination airport code
    pub destination: Option<String>,
    /// First time this flight was seen
    pub created_at: Timestamp,
    /// Last write time
    pub updated_at: Timestamp,
}

impl FlightState {
    /// Build a fresh state from a validated update received at `received_at`.
    pub fn from_update(update: FlightUpdate, received_at: Timestamp) -> Self {
        Self {
            flight_number: update.flight_number,
            status: update.status,
            estimated_arrival: update.estimated_arrival,
            scheduled_arrival: update.scheduled_arrival,
            origin: update.origin,
            destination: update.destination,
            created_at: received_at,
            updated_at: received_at,
        }
    }

    /// Carry lifecycle timestamps over from the state this one replaces.
    pub fn succeeding(mut self, previous: Option<&FlightState>) -> Self {
        if let Some(previous) = previous {
            self.created_at = previous.created_at;
            if self.updated_at < previous.updated_at {
                self.updated_at = previous.updated_at;
            }
        }
        self
    }

    /// Whole minutes the estimate trails the schedule, floored at zero.
    ///
    /// `None` when no scheduled arrival is known.
    pub fn delay_minutes(&self) -> Option<i64> {
        self.scheduled_arrival.map(|scheduled| {
            let minutes = (self.estimated_arrival - scheduled).num_seconds() / 60;
            minutes.max(0)
        })
    }
}
