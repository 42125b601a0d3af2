//! Notification Worker
//!
//! Single consumer of the alert queue: dispatch each alert to the sink, then
//! persist it. Neither step is retried.

use flightwatch_core::{Alert, FlightRepository};
use flightwatch_notify::NotificationSink;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::metrics::{PipelineMetrics, WorkerState};

/// Drives the alert queue.
pub struct NotificationWorker {
    pub(crate) alerts: mpsc::Receiver<Alert>,
    pub(crate) sink: Arc<dyn NotificationSink>,
    pub(crate) repository: Arc<dyn FlightRepository>,
    pub(crate) metrics: Arc<PipelineMetrics>,
    pub(crate) poll_interval: Duration,
}

impl NotificationWorker {
    /// Run until every alert sender is gone and the queue is empty.
    ///
    /// The only sender belongs to the event worker, so this loop outlives it
    /// and drains whatever it produced before exiting.
    pub async fn run(mut self) {
        info!("Notification worker started");

        loop {
            match tokio::time::timeout(self.poll_interval, self.alerts.recv()).await {
                Ok(Some(alert)) => self.handle(alert).await,
                Ok(None) => break,
                Err(_) => continue,
            }
        }

        self.metrics.notification_worker().set(WorkerState::Stopped);
        info!("Notification worker stopped");
    }

    async fn handle(&self, alert: Alert) {
        let status = self.metrics.notification_worker();
        status.set(WorkerState::Processing);

        match self.sink.dispatch(&alert).await {
            Ok(()) => self.metrics.record_alert_dispatched(),
            Err(e) => {
                self.metrics.record_dispatch_failure();
                error!(
                    alert_id = %alert.id,
                    sink = self.sink.name(),
                    error = %e,
                    "Alert dispatch failed"
                );
            }
        }

        let alert_id = alert.id.clone();
        let flight_number = alert.flight_number.clone();
        let repository = Arc::clone(&self.repository);
        match tokio::task::spawn_blocking(move || repository.insert_alert(&alert)).await {
            Ok(Ok(())) => {
                self.metrics.record_alert_persisted();
                info!(alert_id = %alert_id, flight_number = %flight_number, "Alert stored");
            }
            Ok(Err(e)) => {
                self.metrics.record_persistence_failure();
                error!(alert_id = %alert_id, error = %e, "Failed to store alert");
            }
            Err(e) => {
                self.metrics.record_persistence_failure();
                error!(alert_id = %alert_id, error = %e, "Alert write task failed");
            }
        }

        status.set(WorkerState::Idle);
    }
}
