//! Inbound flight-status events and their validation.
//!
//! A [`FlightEvent`] is the raw payload as a producer sent it. Validation
//! either yields a typed [`FlightUpdate`] or a [`ValidationErrors`] map with
//! one message per offending field. Validation has no side effects.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::flight::{FlightStatus, MAX_FLIGHT_NUMBER_LEN};
use crate::types::{parse_timestamp, Timestamp};

/// Field-to-message map describing why an event was rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: BTreeMap<String, String>,
}

impl ValidationErrors {
    /// Empty error map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a problem with `field`. The first message per field wins.
    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.entry(field.into()).or_insert_with(|| message.into());
    }

    /// No problems recorded.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of offending fields.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Message recorded for `field`.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    /// Offending fields, sorted.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.errors.keys().map(String::as_str)
    }

    /// Underlying map.
    pub fn into_map(self) -> BTreeMap<String, String> {
        self.errors
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid flight event")?;
        for (i, (field, message)) in self.errors.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}{field} ({message})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Raw flight-status payload as received from a producer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightEvent {
    /// Flight number
    #[serde(default)]
    pub flight_number: String,
    /// Status name (`ON_TIME`, `DELAYED`, ...)
    #[serde(default)]
    pub status: String,
    /// Estimated arrival, ISO-8601-like
    #[serde(default)]
    pub estimated_arrival: String,
    /// Scheduled arrival, ISO-8601-like
    #[serde(default)]
    pub scheduled_arrival: Option<String>,
    /// Origin airport code
    #[serde(default)]
    pub origin: Option<String>,
    /// Destination airport code
    #[serde(default)]
    pub destination: Option<String>,
}

/// A validated event, ready to be applied to the flight state store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightUpdate {
    /// Trimmed flight number
    pub flight_number: String,
    /// Parsed status
    pub status: FlightStatus,
    /// Parsed estimated arrival
    pub estimated_arrival: Timestamp,
    /// Parsed scheduled arrival
    pub scheduled_arrival: Option<Timestamp>,
    /// Origin airport code
    pub origin: Option<String>,
    /// Destination airport code
    pub destination: Option<String>,
}

impl FlightEvent {
    /// Convenience constructor for the required fields.
    pub fn new(
        flight_number: impl Into<String>,
        status: impl Into<String>,
        estimated_arrival: impl Into<String>,
    ) -> Self {
        Self {
            flight_number: flight_number.into(),
            status: status.into(),
            estimated_arrival: estimated_arrival.into(),
            ..Self::default()
        }
    }

    /// Set the scheduled arrival.
    pub fn scheduled(mut self, scheduled_arrival: impl Into<String>) -> Self {
        self.scheduled_arrival = Some(scheduled_arrival.into());
        self
    }

    /// Set origin and destination.
    pub fn route(mut self, origin: impl Into<String>, destination: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self.destination = Some(destination.into());
        self
    }

    /// Extract an event from an arbitrary JSON payload.
    ///
    /// Missing and `null` fields are treated as absent. Fields of the wrong
    /// JSON type are reported rather than coerced.
    pub fn from_json(payload: &Value) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let Some(object) = payload.as_object() else {
            errors.insert("payload", "Payload must be a JSON object");
            return Err(errors);
        };

        let mut text = |field: &'static str, label: &str| -> Option<String> {
            match object.get(field) {
                None | Some(Value::Null) => None,
                Some(Value::String(s)) => Some(s.clone()),
                Some(_) => {
                    errors.insert(field, format!("{label} must be a string"));
                    None
                }
            }
        };

        let event = Self {
            flight_number: text("flight_number", "Flight number").unwrap_or_default(),
            status: text("status", "Status").unwrap_or_default(),
            estimated_arrival: text("estimated_arrival", "Estimated arrival").unwrap_or_default(),
            scheduled_arrival: text("scheduled_arrival", "Scheduled arrival"),
            origin: text("origin", "Origin"),
            destination: text("destination", "Destination"),
        };

        if errors.is_empty() {
            Ok(event)
        } else {
            Err(errors)
        }
    }

    /// Validate every field, collecting all problems.
    pub fn validate(&self) -> Result<FlightUpdate, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let flight_number = self.flight_number.trim();
        if flight_number.is_empty() {
            errors.insert("flight_number", "Flight number is required");
        } else if flight_number.chars().count() > MAX_FLIGHT_NUMBER_LEN {
            errors.insert(
                "flight_number",
                format!("Flight number must be {MAX_FLIGHT_NUMBER_LEN} characters or less"),
            );
        }

        let status = self.status.parse::<FlightStatus>().ok();
        if status.is_none() {
            let names: Vec<&str> = FlightStatus::ALL.iter().map(FlightStatus::as_str).collect();
            errors.insert(
                "status",
                format!("Status must be one of: {}", names.join(", ")),
            );
        }

        let estimated_arrival = if self.estimated_arrival.trim().is_empty() {
            errors.insert("estimated_arrival", "Estimated arrival is required");
            None
        } else {
            let parsed = parse_timestamp(&self.estimated_arrival);
            if parsed.is_none() {
                errors.insert(
                    "estimated_arrival",
                    "Estimated arrival must be in ISO 8601 format",
                );
            }
            parsed
        };

        let scheduled_arrival = match non_empty(&self.scheduled_arrival) {
            None => None,
            Some(raw) => {
                let parsed = parse_timestamp(raw);
                if parsed.is_none() {
                    errors.insert(
                        "scheduled_arrival",
                        "Scheduled arrival must be in ISO 8601 format",
                    );
                }
                parsed
            }
        };

        let origin = optional_text(&self.origin);
        let destination = optional_text(&self.destination);

        match (status, estimated_arrival) {
            (Some(status), Some(estimated_arrival)) if errors.is_empty() => Ok(FlightUpdate {
                flight_number: flight_number.to_string(),
                status,
                estimated_arrival,
                scheduled_arrival,
                origin,
                destination,
            }),
            _ => Err(errors),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn optional_text(value: &Option<String>) -> Option<String> {
    non_empty(value).map(str::to_string)
}
