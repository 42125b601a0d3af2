//! Notification channel implementations.

pub mod log;
pub mod webhook;

use async_trait::async_trait;
use flightwatch_core::Alert;

use crate::error::DispatchError;

/// A destination for alerts (log, webhook, SMS gateway, ...).
///
/// `dispatch` is invoked once per alert. Reaching individual subscribers is
/// the channel's business.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Get the name of this channel.
    fn name(&self) -> &str;

    /// Deliver one alert.
    async fn dispatch(&self, alert: &Alert) -> Result<(), DispatchError>;
}
