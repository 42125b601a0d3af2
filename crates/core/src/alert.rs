//! Disruption alerts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::error::ParseEnumError;
use crate::types::Timestamp;

/// Default number of alerts returned by listing queries.
pub const DEFAULT_ALERT_LIMIT: usize = 10;

/// Upper bound on alerts returned by one listing query.
pub const MAX_ALERT_LIMIT: usize = 500;

/// Kind of disruption an alert describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    /// Flight cancelled
    Cancellation,
    /// Arrival delayed beyond the alerting threshold
    Delay,
    /// Departure gate changed
    GateChange,
    /// Notable status transition
    ScheduleChange,
}

impl AlertType {
    const ALL: [AlertType; 4] = [
        AlertType::Cancellation,
        AlertType::Delay,
        AlertType::GateChange,
        AlertType::ScheduleChange,
    ];

    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::Cancellation => "CANCELLATION",
            AlertType::Delay => "DELAY",
            AlertType::GateChange => "GATE_CHANGE",
            AlertType::ScheduleChange => "SCHEDULE_CHANGE",
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AlertType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("alert type", s))
    }
}

/// Alert severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    /// Informational
    Low,
    /// Passengers should take note
    Medium,
    /// Passengers are likely affected
    High,
    /// Passengers are certainly affected
    Critical,
}

impl AlertSeverity {
    const ALL: [AlertSeverity; 4] = [
        AlertSeverity::Low,
        AlertSeverity::Medium,
        AlertSeverity::High,
        AlertSeverity::Critical,
    ];

    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Low => "low",
            AlertSeverity::Medium => "medium",
            AlertSeverity::High => "high",
            AlertSeverity::Critical => "critical",
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertSeverity {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AlertSeverity::ALL
            .into_iter()
            .find(|sev| sev.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("alert severity", s))
    }
}

/// Errors raised by alert state transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlertError {
    /// The alert was resolved before
    #[error("Alert {alert_id} is already resolved")]
    AlreadyResolved {
        /// Alert identifier
        alert_id: String,
    },
    /// `resolved` and `resolved_at` disagree
    #[error("Alert {alert_id} has an inconsistent resolution state")]
    InconsistentResolution {
        /// Alert identifier
        alert_id: String,
    },
}

/// One detected disruption occurrence.
///
/// Immutable once created, except for the resolution pair which moves from
/// unresolved to resolved exactly once through [`Alert::resolve`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AlertRecord")]
pub struct Alert {
    /// Generated identifier
    pub id: String,
    /// Affected flight
    pub flight_number: String,
    /// Disruption kind
    pub alert_type: AlertType,
    /// Human-readable description
    pub message: String,
    /// Severity
    pub severity: AlertSeverity,
    /// Customers holding confirmed bookings on the flight
    pub customer_ids: Vec<String>,
    /// Creation time
    pub created_at: Timestamp,
    resolved: bool,
    resolved_at: Option<Timestamp>,
}

/// Wire form of [`Alert`], checked before it becomes one.
#[derive(Deserialize)]
struct AlertRecord {
    id: String,
    flight_number: String,
    alert_type: AlertType,
    message: String,
    severity: AlertSeverity,
    customer_ids: Vec<String>,
    created_at: Timestamp,
    #[serde(default)]
    resolved: bool,
    #[serde(default)]
    resolved_at: Option<Timestamp>,
}

impl TryFrom<AlertRecord> for Alert {
    type Error = AlertError;

    fn try_from(record: AlertRecord) -> Result<Self, Self::Error> {
        if record.resolved != record.resolved_at.is_some() {
            return Err(AlertError::InconsistentResolution {
                alert_id: record.id,
            });
        }
        Ok(Self {
            id: record.id,
            flight_number: record.flight_number,
            alert_type: record.alert_type,
            message: record.message,
            severity: record.severity,
            customer_ids: record.customer_ids,
            created_at: record.created_at,
            resolved: record.resolved,
            resolved_at: record.resolved_at,
        })
    }
}

impl Alert {
    /// Create a new unresolved alert with a fresh identifier.
    pub fn new(
        flight_number: impl Into<String>,
        alert_type: AlertType,
        severity: AlertSeverity,
        message: impl Into<String>,
        customer_ids: Vec<String>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            flight_number: flight_number.into(),
            alert_type,
            message: message.into(),
            severity,
            customer_ids,
            created_at,
            resolved: false,
            resolved_at: None,
        }
    }

    /// Whether an operator has resolved this alert.
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// When the alert was resolved.
    pub fn resolved_at(&self) -> Option<Timestamp> {
        self.resolved_at
    }

    /// Mark the alert resolved. Fails if it already is.
    pub fn resolve(&mut self, at: Timestamp) -> Result<(), AlertError> {
        if self.resolved {
            return Err(AlertError::AlreadyResolved {
                alert_id: self.id.clone(),
            });
        }
        self.resolved = true;
        self.resolved_at = Some(at);
        Ok(())
    }

    /// Rebuild the resolution pair of a stored alert.
    pub(crate) fn with_resolution(mut self, resolved_at: Option<Timestamp>) -> Self {
        self.resolved = resolved_at.is_some();
        self.resolved_at = resolved_at;
        self
    }
}

/// Filter for listing stored alerts, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertQuery {
    /// Maximum number of alerts
    pub limit: usize,
    /// Only alerts for this flight
    pub flight_number: Option<String>,
    /// Only alerts of this severity
    pub severity: Option<AlertSeverity>,
    /// Only resolved (`true`) or unresolved (`false`) alerts
    pub resolved: Option<bool>,
}

impl Default for AlertQuery {
    fn default() -> Self {
        Self::recent(DEFAULT_ALERT_LIMIT)
    }
}

impl AlertQuery {
    /// The `limit` most recent alerts, unfiltered.
    pub fn recent(limit: usize) -> Self {
        Self {
            limit,
            flight_number: None,
            severity: None,
            resolved: None,
        }
    }

    /// `limit` clamped to `1..=MAX_ALERT_LIMIT`.
    pub fn effective_limit(&self) -> usize {
        self.limit.clamp(1, MAX_ALERT_LIMIT)
    }

    /// Whether `alert` passes every filter.
    pub fn matches(&self, alert: &Alert) -> bool {
        self.flight_number
            .as_deref()
            .map_or(true, |f| alert.flight_number == f)
            && self.severity.map_or(true, |s| alert.severity == s)
            && self.resolved.map_or(true, |r| alert.is_resolved() == r)
    }
}
