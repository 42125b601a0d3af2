//! Notification layer for FlightWatch alerts.
//!
//! The pipeline hands every alert to a single [`NotificationSink`]. In
//! production that sink is a [`Notifier`], which fans the alert out to every
//! configured channel:
//!
//! - [`LogSink`] writes a notification block to the log
//! - [`WebhookSink`] POSTs the alert as JSON to an HTTP endpoint
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use flightwatch_notify::{LogSink, Notifier, NotificationSink};
//!
//! let log: Arc<dyn NotificationSink> = Arc::new(LogSink::new());
//! let notifier = Notifier::with_channels(vec![log]);
//! assert_eq!(notifier.channel_count(), 1);
//! ```

pub mod channels;
pub mod error;

pub use channels::log::LogSink;
pub use channels::webhook::WebhookSink;
pub use channels::NotificationSink;
pub use error::DispatchError;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use flightwatch_core::config::NotifyConfig;
use flightwatch_core::Alert;
use tracing::{debug, error, info, warn};

/// Dispatches alerts to every configured channel.
pub struct Notifier {
    channels: Vec<Arc<dyn NotificationSink>>,
    disabled: bool,
}

impl Notifier {
    /// Build the channel set described by `config`.
    pub fn from_config(config: &NotifyConfig) -> Result<Self, DispatchError> {
        if config.disabled {
            info!("Notifications disabled via configuration");
            return Ok(Self::disabled());
        }

        let mut channels: Vec<Arc<dyn NotificationSink>> = vec![];

        if config.log_sink {
            channels.push(Arc::new(LogSink::new()));
        }

        if let Some(url) = &config.webhook_url {
            let timeout = Duration::from_millis(config.webhook_timeout_ms);
            channels.push(Arc::new(WebhookSink::new(url.clone(), timeout)?));
            info!(url = %url, "Webhook notifications enabled");
        }

        if channels.is_empty() {
            warn!("No notification channels configured");
        } else {
            info!(
                channel_count = channels.len(),
                "Notification system initialized"
            );
        }

        Ok(Self::with_channels(channels))
    }

    /// Create a notifier with specific channels.
    #[must_use]
    pub fn with_channels(channels: Vec<Arc<dyn NotificationSink>>) -> Self {
        Self {
            channels,
            disabled: false,
        }
    }

    /// Create a notifier that drops every alert.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            channels: vec![],
            disabled: true,
        }
    }

    /// Get the number of enabled channels.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        if self.disabled {
            0
        } else {
            self.channels.len()
        }
    }

    /// Names of the enabled channels.
    pub fn channel_names(&self) -> Vec<String> {
        if self.disabled {
            return vec![];
        }
        self.channels.iter().map(|c| c.name().to_string()).collect()
    }
}

#[async_trait]
impl NotificationSink for Notifier {
    fn name(&self) -> &str {
        "notifier"
    }

    /// Try every channel in order. A failing channel does not stop the
    /// others; the names of all failed channels are returned together.
    async fn dispatch(&self, alert: &Alert) -> Result<(), DispatchError> {
        if self.disabled || self.channels.is_empty() {
            debug!(alert_id = %alert.id, "No channels enabled, skipping alert");
            return Ok(());
        }

        let mut failed = vec![];
        for channel in &self.channels {
            match channel.dispatch(alert).await {
                Ok(()) => {
                    debug!(channel = channel.name(), alert_id = %alert.id, "Notification sent");
                }
                Err(e) => {
                    error!(
                        channel = channel.name(),
                        alert_id = %alert.id,
                        error = %e,
                        "Failed to send notification"
                    );
                    failed.push(channel.name().to_string());
                }
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(DispatchError::Partial { failed })
        }
    }
}
