//! Disruption Monitor
//!
//! Owns the two queues, the flight state store and the two worker tasks, and
//! exposes the ingestion and query surface used by the HTTP front door.

use flightwatch_core::config::PipelineConfig;
use flightwatch_core::types::now;
use flightwatch_core::{
    Alert, AlertQuery, FlightEvent, FlightRepository, FlightState, FlightUpdate,
};
use flightwatch_detector::DisruptionDetector;
use flightwatch_notify::NotificationSink;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::dispatcher::NotificationWorker;
use crate::error::{MonitorError, MonitorResult, SubmitError};
use crate::metrics::{MetricsSnapshot, PipelineMetrics, WorkerState, WorkerStatus};
use crate::store::FlightStateStore;
use crate::worker::EventWorker;

enum Lifecycle {
    Ready {
        event_worker: EventWorker,
        notification_worker: NotificationWorker,
    },
    Running {
        event_handle: JoinHandle<()>,
        notification_handle: JoinHandle<()>,
    },
    Stopped,
}

/// The flight disruption pipeline.
///
/// Events can be submitted as soon as the monitor is built; they are
/// processed once [`start`](Self::start) spawns the workers. A monitor runs
/// at most once: after [`stop`](Self::stop) it rejects new events and cannot
/// be started again.
pub struct DisruptionMonitor {
    repository: Arc<dyn FlightRepository>,
    store: Arc<FlightStateStore>,
    metrics: Arc<PipelineMetrics>,
    running: Arc<AtomicBool>,
    events: RwLock<Option<mpsc::Sender<FlightUpdate>>>,
    lifecycle: Mutex<Lifecycle>,
    shutdown_timeout: Duration,
}

impl DisruptionMonitor {
    pub fn new(
        repository: Arc<dyn FlightRepository>,
        sink: Arc<dyn NotificationSink>,
        detector: DisruptionDetector,
        config: &PipelineConfig,
    ) -> Self {
        let metrics = Arc::new(PipelineMetrics::new());
        let store = Arc::new(FlightStateStore::new(
            Arc::clone(&repository),
            Arc::clone(&metrics),
        ));
        let running = Arc::new(AtomicBool::new(false));

        let (event_tx, event_rx) = mpsc::channel(config.event_queue_capacity.max(1));
        let (alert_tx, alert_rx) = mpsc::channel(config.alert_queue_capacity.max(1));

        let event_worker = EventWorker {
            events: event_rx,
            alerts: alert_tx,
            store: Arc::clone(&store),
            repository: Arc::clone(&repository),
            detector,
            metrics: Arc::clone(&metrics),
            running: Arc::clone(&running),
            poll_interval: config.poll_interval(),
        };
        let notification_worker = NotificationWorker {
            alerts: alert_rx,
            sink,
            repository: Arc::clone(&repository),
            metrics: Arc::clone(&metrics),
            poll_interval: config.poll_interval(),
        };

        Self {
            repository,
            store,
            metrics,
            running,
            events: RwLock::new(Some(event_tx)),
            lifecycle: Mutex::new(Lifecycle::Ready {
                event_worker,
                notification_worker,
            }),
            shutdown_timeout: config.shutdown_timeout(),
        }
    }

    /// Monitor with the default detector thresholds and pipeline settings.
    pub fn with_defaults(
        repository: Arc<dyn FlightRepository>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self::new(
            repository,
            sink,
            DisruptionDetector::default(),
            &PipelineConfig::default(),
        )
    }

    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Spawn both workers on the current tokio runtime.
    pub fn start(&self) -> MonitorResult<()> {
        let mut lifecycle = self.lifecycle();
        match std::mem::replace(&mut *lifecycle, Lifecycle::Stopped) {
            Lifecycle::Ready {
                event_worker,
                notification_worker,
            } => {
                self.running.store(true, Ordering::Release);
                *lifecycle = Lifecycle::Running {
                    event_handle: tokio::spawn(event_worker.run()),
                    notification_handle: tokio::spawn(notification_worker.run()),
                };
                info!("Disruption monitor started");
                Ok(())
            }
            running @ Lifecycle::Running { .. } => {
                *lifecycle = running;
                Err(MonitorError::AlreadyStarted)
            }
            Lifecycle::Stopped => Err(MonitorError::NotRestartable),
        }
    }

    /// Stop accepting events and wait for both workers to drain.
    ///
    /// Every event accepted before the call is processed and every alert it
    /// produces is dispatched and stored, unless a worker exceeds the
    /// shutdown timeout, in which case it is aborted. A monitor that was
    /// never started drains its queue here. Calling `stop` again is a no-op.
    pub async fn stop(&self) -> MonitorResult<()> {
        self.running.store(false, Ordering::Release);
        self.events
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();

        let previous = std::mem::replace(&mut *self.lifecycle(), Lifecycle::Stopped);
        let (event_handle, notification_handle) = match previous {
            Lifecycle::Running {
                event_handle,
                notification_handle,
            } => (event_handle, notification_handle),
            Lifecycle::Ready {
                event_worker,
                notification_worker,
            } => {
                info!("Draining events submitted before start");
                (
                    tokio::spawn(event_worker.run()),
                    tokio::spawn(notification_worker.run()),
                )
            }
            Lifecycle::Stopped => return Ok(()),
        };

        info!("Stopping disruption monitor");
        let event_joined = self
            .join("event worker", event_handle, self.metrics.event_worker())
            .await;
        let notification_joined = self
            .join(
                "notification worker",
                notification_handle,
                self.metrics.notification_worker(),
            )
            .await;
        event_joined.and(notification_joined)?;
        info!("Disruption monitor stopped");
        Ok(())
    }

    /// Wait for a worker to exit. A worker still busy after the shutdown
    /// timeout is aborted, so nothing it owns runs once this returns.
    async fn join(
        &self,
        worker: &'static str,
        mut handle: JoinHandle<()>,
        status: &WorkerStatus,
    ) -> MonitorResult<()> {
        match tokio::time::timeout(self.shutdown_timeout, &mut handle).await {
            Ok(joined) => Ok(joined?),
            Err(_) => {
                let timeout_ms = self.shutdown_timeout.as_millis() as u64;
                warn!(
                    worker = worker,
                    timeout_ms = timeout_ms,
                    "Worker did not stop in time, aborting"
                );
                handle.abort();
                if let Err(e) = handle.await {
                    if !e.is_cancelled() {
                        return Err(e.into());
                    }
                }
                status.set(WorkerState::Stopped);
                Err(MonitorError::ShutdownTimeout { worker, timeout_ms })
            }
        }
    }

    /// Whether the workers are running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Validate an event and enqueue it. Never waits for queue capacity.
    pub fn submit(&self, event: FlightEvent) -> Result<FlightUpdate, SubmitError> {
        let update = match event.validate() {
            Ok(update) => update,
            Err(errors) => {
                self.metrics.record_event_rejected();
                warn!(flight_number = %event.flight_number, errors = %errors, "Event rejected");
                return Err(SubmitError::Invalid(errors));
            }
        };

        let events = self
            .events
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let Some(sender) = events.as_ref() else {
            self.metrics.record_event_rejected();
            return Err(SubmitError::Closed);
        };

        match sender.try_send(update.clone()) {
            Ok(()) => {
                self.metrics.record_event_accepted();
                info!(
                    flight_number = %update.flight_number,
                    status = %update.status,
                    "Event accepted"
                );
                Ok(update)
            }
            Err(TrySendError::Full(_)) => {
                self.metrics.record_event_rejected();
                warn!(flight_number = %update.flight_number, "Event queue full, event rejected");
                Err(SubmitError::QueueFull)
            }
            Err(TrySendError::Closed(_)) => {
                self.metrics.record_event_rejected();
                Err(SubmitError::Closed)
            }
        }
    }

    /// [`submit`](Self::submit) for a raw JSON payload.
    pub fn submit_json(&self, payload: &Value) -> Result<FlightUpdate, SubmitError> {
        match FlightEvent::from_json(payload) {
            Ok(event) => self.submit(event),
            Err(errors) => {
                self.metrics.record_event_rejected();
                warn!(errors = %errors, "Event rejected");
                Err(SubmitError::Invalid(errors))
            }
        }
    }

    /// Current state of a flight from the in-memory cache.
    pub fn get_flight_state(&self, flight_number: &str) -> Option<FlightState> {
        self.store.get(flight_number.trim())
    }

    /// The `limit` most recent stored alerts, newest first.
    pub async fn get_recent_alerts(&self, limit: usize) -> MonitorResult<Vec<Alert>> {
        self.list_alerts(AlertQuery::recent(limit)).await
    }

    pub async fn list_alerts(&self, query: AlertQuery) -> MonitorResult<Vec<Alert>> {
        let repository = Arc::clone(&self.repository);
        Ok(tokio::task::spawn_blocking(move || repository.list_alerts(&query)).await??)
    }

    pub async fn get_alert(&self, alert_id: &str) -> MonitorResult<Option<Alert>> {
        let repository = Arc::clone(&self.repository);
        let alert_id = alert_id.to_string();
        Ok(tokio::task::spawn_blocking(move || repository.get_alert(&alert_id)).await??)
    }

    /// Mark a stored alert resolved.
    pub async fn resolve_alert(&self, alert_id: &str) -> MonitorResult<Alert> {
        let repository = Arc::clone(&self.repository);
        let id = alert_id.to_string();
        let alert =
            tokio::task::spawn_blocking(move || repository.resolve_alert(&id, now())).await??;
        info!(alert_id = %alert.id, flight_number = %alert.flight_number, "Alert resolved");
        Ok(alert)
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Number of flights with cached state.
    pub fn tracked_flights(&self) -> usize {
        self.store.len()
    }
}
