//! FlightWatch Disruption Detector
//!
//! Rule-based classification of flight state transitions. Detection is a pure
//! function of the previous and current [`FlightState`]: it performs no I/O,
//! reads no clock and generates no identifiers. The caller turns each
//! [`Disruption`] into an [`Alert`] once it knows the affected customers.

#![warn(missing_docs)]

use flightwatch_core::config::DetectorConfig;
use flightwatch_core::{Alert, AlertSeverity, AlertType, FlightState, FlightStatus, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Minimum delay, in minutes, that raises a DELAY alert.
pub const DEFAULT_DELAY_THRESHOLD_MINUTES: i64 = 45;

/// Delay, in minutes, from which a DELAY alert is `high` instead of `medium`.
pub const DEFAULT_HIGH_SEVERITY_MINUTES: i64 = 120;

/// A disruption found by [`DisruptionDetector::detect`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disruption {
    /// Alert kind to raise
    pub alert_type: AlertType,
    /// Alert severity
    pub severity: AlertSeverity,
    /// Human-readable description
    pub message: String,
}

impl Disruption {
    /// Materialize the alert for `flight_number` with a fresh identifier.
    pub fn into_alert(
        self,
        flight_number: impl Into<String>,
        customer_ids: Vec<String>,
        created_at: Timestamp,
    ) -> Alert {
        Alert::new(
            flight_number,
            self.alert_type,
            self.severity,
            self.message,
            customer_ids,
            created_at,
        )
    }
}

/// Stateless rule set mapping a state transition to disruptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisruptionDetector {
    delay_threshold_minutes: i64,
    high_severity_minutes: i64,
}

impl Default for DisruptionDetector {
    fn default() -> Self {
        Self::new(DEFAULT_DELAY_THRESHOLD_MINUTES, DEFAULT_HIGH_SEVERITY_MINUTES)
    }
}

impl From<&DetectorConfig> for DisruptionDetector {
    fn from(config: &DetectorConfig) -> Self {
        Self::new(config.delay_threshold_minutes, config.high_severity_minutes)
    }
}

impl DisruptionDetector {
    /// Detector with custom delay thresholds.
    pub fn new(delay_threshold_minutes: i64, high_severity_minutes: i64) -> Self {
        Self {
            delay_threshold_minutes,
            high_severity_minutes,
        }
    }

    /// Delay threshold in minutes
    pub fn delay_threshold_minutes(&self) -> i64 {
        self.delay_threshold_minutes
    }

    /// High-severity delay threshold in minutes
    pub fn high_severity_minutes(&self) -> i64 {
        self.high_severity_minutes
    }

    /// Classify the transition from `previous` to `current`.
    ///
    /// Rules are evaluated in a fixed order (cancellation, delay, status
    /// transition) and every rule that matches contributes one disruption.
    pub fn detect(&self, previous: Option<&FlightState>, current: &FlightState) -> Vec<Disruption> {
        let mut disruptions = Vec::new();
        let number = &current.flight_number;

        if current.status == FlightStatus::Cancelled {
            disruptions.push(Disruption {
                alert_type: AlertType::Cancellation,
                severity: AlertSeverity::Critical,
                message: format!("Flight {number} has been cancelled"),
            });
        }

        if current.status == FlightStatus::Delayed {
            if let Some(minutes) = current.delay_minutes() {
                if minutes >= self.delay_threshold_minutes {
                    let severity = if minutes >= self.high_severity_minutes {
                        AlertSeverity::High
                    } else {
                        AlertSeverity::Medium
                    };
                    disruptions.push(Disruption {
                        alert_type: AlertType::Delay,
                        severity,
                        message: format!("Flight {number} is delayed by {minutes} minutes"),
                    });
                } else {
                    trace!(flight_number = %number, delay_minutes = minutes, "Delay below threshold");
                }
            }
        }

        if let Some(previous) = previous {
            if previous.status != current.status
                && matches!(current.status, FlightStatus::Boarding | FlightStatus::Departed)
            {
                disruptions.push(Disruption {
                    alert_type: AlertType::ScheduleChange,
                    severity: AlertSeverity::Low,
                    message: format!("Flight {number} status changed to {}", current.status),
                });
            }
        }

        disruptions
    }
}
