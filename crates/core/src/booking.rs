//! Customer bookings, consulted to find who an alert affects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ParseEnumError;

/// Booking lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    /// Ticketed; the customer is affected by disruptions
    Confirmed,
    /// Awaiting confirmation
    Pending,
    /// Cancelled by the customer or airline
    Cancelled,
}

impl BookingStatus {
    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Pending => "pending",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(BookingStatus::Confirmed),
            "pending" => Ok(BookingStatus::Pending),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(ParseEnumError::new("booking status", other)),
        }
    }
}

/// A customer's seat on a flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Booking identifier
    pub id: String,
    /// Customer holding the booking
    pub customer_id: String,
    /// Booked flight
    pub flight_number: String,
    /// Lifecycle status
    pub status: BookingStatus,
}

impl Booking {
    /// Create a booking with a fresh identifier.
    pub fn new(
        customer_id: impl Into<String>,
        flight_number: impl Into<String>,
        status: BookingStatus,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            customer_id: customer_id.into(),
            flight_number: flight_number.into(),
            status,
        }
    }

    /// Shorthand for a confirmed booking.
    pub fn confirmed(customer_id: impl Into<String>, flight_number: impl Into<String>) -> Self {
        Self::new(customer_id, flight_number, BookingStatus::Confirmed)
    }
}
