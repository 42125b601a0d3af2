//! Event Worker
//!
//! Single consumer of the event queue. For each validated update it writes the
//! new flight state, runs the disruption detector on the transition, resolves
//! the affected customers and hands the resulting alerts to the notification
//! worker.

use flightwatch_core::types::now;
use flightwatch_core::{Alert, FlightRepository, FlightState, FlightUpdate};
use flightwatch_detector::DisruptionDetector;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::metrics::{PipelineMetrics, WorkerState};
use crate::store::FlightStateStore;

/// Drives the event queue.
pub struct EventWorker {
    pub(crate) events: mpsc::Receiver<FlightUpdate>,
    pub(crate) alerts: mpsc::Sender<Alert>,
    pub(crate) store: Arc<FlightStateStore>,
    pub(crate) repository: Arc<dyn FlightRepository>,
    pub(crate) detector: DisruptionDetector,
    pub(crate) metrics: Arc<PipelineMetrics>,
    pub(crate) running: Arc<AtomicBool>,
    pub(crate) poll_interval: Duration,
}

impl EventWorker {
    /// Run until the queue is closed, or until the running flag is cleared
    /// and the queue has been drained.
    pub async fn run(mut self) {
        info!("Event worker started");

        loop {
            match tokio::time::timeout(self.poll_interval, self.events.recv()).await {
                Ok(Some(update)) => self.handle(update).await,
                Ok(None) => break,
                Err(_) => {
                    if !self.running.load(Ordering::Acquire) {
                        while let Ok(update) = self.events.try_recv() {
                            self.handle(update).await;
                        }
                        break;
                    }
                }
            }
        }

        self.metrics.event_worker().set(WorkerState::Stopped);
        info!("Event worker stopped");
    }

    async fn handle(&self, update: FlightUpdate) {
        let status = self.metrics.event_worker();
        status.set(WorkerState::Processing);
        let start = Instant::now();

        let current = FlightState::from_update(update, now());
        let previous = self.store.upsert(current.clone()).await;

        let disruptions = self.detector.detect(previous.as_ref(), &current);
        if !disruptions.is_empty() {
            let customer_ids = self.resolve_customers(&current.flight_number).await;
            let created_at = now();

            for disruption in disruptions {
                let alert =
                    disruption.into_alert(&current.flight_number, customer_ids.clone(), created_at);
                self.metrics.record_alert_generated();
                info!(
                    alert_id = %alert.id,
                    flight_number = %alert.flight_number,
                    alert_type = %alert.alert_type,
                    severity = %alert.severity,
                    "Alert generated"
                );

                if let Err(e) = self.alerts.send(alert).await {
                    error!(alert_id = %e.0.id, "Alert queue closed, dropping alert");
                }
            }
        }

        let latency_us = start.elapsed().as_micros() as u64;
        self.metrics.record_event_processed(latency_us);
        debug!(
            flight_number = %current.flight_number,
            status = %current.status,
            latency_us = latency_us,
            "Event processed"
        );
        status.set(WorkerState::Idle);
    }

    /// Confirmed customers on a flight. Lookup failures yield an empty list.
    async fn resolve_customers(&self, flight_number: &str) -> Vec<String> {
        let repository = Arc::clone(&self.repository);
        let number = flight_number.to_string();
        let resolved =
            tokio::task::spawn_blocking(move || repository.find_bookings_by_flight(&number)).await;

        match resolved {
            Ok(Ok(ids)) => ids,
            Ok(Err(e)) => {
                self.metrics.record_resolution_failure();
                warn!(flight_number = %flight_number, error = %e, "Customer resolution failed");
                Vec::new()
            }
            Err(e) => {
                self.metrics.record_resolution_failure();
                warn!(flight_number = %flight_number, error = %e, "Customer resolution task failed");
                Vec::new()
            }
        }
    }
}
