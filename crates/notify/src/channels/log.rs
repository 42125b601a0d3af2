//! Channel that writes alerts to the log.

use async_trait::async_trait;
use flightwatch_core::Alert;
use tracing::info;

use crate::error::DispatchError;
use crate::NotificationSink;

/// Writes a human-readable notification block for every alert via `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl LogSink {
    /// Create a log sink.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Render the notification text for an alert.
    #[must_use]
    pub fn render(alert: &Alert) -> String {
        format!(
            "FLIGHT ALERT - {severity}\n\
             Flight: {flight}\n\
             Type: {alert_type}\n\
             Message: {message}\n\
             Affected Customers: {customers}\n\
             Time: {time}",
            severity = alert.severity.as_str().to_uppercase(),
            flight = alert.flight_number,
            alert_type = alert.alert_type,
            message = alert.message,
            customers = alert.customer_ids.len(),
            time = alert.created_at.to_rfc3339(),
        )
    }
}

#[async_trait]
impl NotificationSink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    async fn dispatch(&self, alert: &Alert) -> Result<(), DispatchError> {
        info!(
            alert_id = %alert.id,
            flight_number = %alert.flight_number,
            alert_type = %alert.alert_type,
            severity = %alert.severity,
            notification = %Self::render(alert),
            "Flight disruption notification"
        );
        Ok(())
    }
}
