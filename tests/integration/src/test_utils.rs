//! Test utilities for pipeline integration tests

use async_trait::async_trait;
use flightwatch_core::config::PipelineConfig;
use flightwatch_core::{
    Alert, AlertQuery, Booking, FlightEvent, FlightRepository, FlightState, InMemoryRepository,
    PersistenceError, PersistenceResult, Timestamp,
};
use flightwatch_detector::DisruptionDetector;
use flightwatch_notify::{DispatchError, NotificationSink};
use flightwatch_stream::DisruptionMonitor;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

/// Fixed reference time used by scenario events.
pub const T0: &str = "2024-05-01T10:00:00Z";

static TRACING: Once = Once::new();

/// Install a test subscriber once per process (`RUST_LOG` controls output).
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Pipeline settings with a short poll interval so tests run fast.
pub fn fast_pipeline() -> PipelineConfig {
    PipelineConfig {
        event_queue_capacity: 256,
        alert_queue_capacity: 256,
        poll_interval_ms: 10,
        shutdown_timeout_ms: 5_000,
    }
}

/// `HH:MM` offset from [`T0`] as an RFC 3339 string.
pub fn at_minutes(offset: i64) -> String {
    let minutes = 10 * 60 + offset;
    format!("2024-05-01T{:02}:{:02}:00Z", minutes / 60, minutes % 60)
}

/// Event with both arrival times set.
pub fn event(flight: &str, status: &str, eta_offset_minutes: i64) -> FlightEvent {
    FlightEvent::new(flight, status, at_minutes(eta_offset_minutes)).scheduled(T0)
}

/// Build a monitor over `repository` and `sink` with test settings.
pub fn monitor_with(
    repository: Arc<dyn FlightRepository>,
    sink: Arc<dyn NotificationSink>,
) -> DisruptionMonitor {
    init_tracing();
    DisruptionMonitor::new(
        repository,
        sink,
        DisruptionDetector::default(),
        &fast_pipeline(),
    )
}

/// Started monitor over an in-memory repository and a recording sink.
pub fn running_pipeline() -> (DisruptionMonitor, Arc<InMemoryRepository>, Arc<RecordingSink>) {
    let repository = Arc::new(InMemoryRepository::new());
    let sink = Arc::new(RecordingSink::new());
    let monitor = monitor_with(repository.clone(), sink.clone());
    monitor.start().expect("monitor starts");
    (monitor, repository, sink)
}

/// Sink that keeps every dispatched alert.
#[derive(Default)]
pub struct RecordingSink {
    alerts: Mutex<Vec<Alert>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    fn name(&self) -> &str {
        "recording"
    }

    async fn dispatch(&self, alert: &Alert) -> Result<(), DispatchError> {
        self.alerts.lock().unwrap().push(alert.clone());
        Ok(())
    }
}

/// Sink that fails every dispatch and counts attempts.
#[derive(Default)]
pub struct FailingSink {
    attempts: AtomicUsize,
}

impl FailingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NotificationSink for FailingSink {
    fn name(&self) -> &str {
        "failing"
    }

    async fn dispatch(&self, alert: &Alert) -> Result<(), DispatchError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(DispatchError::Channel {
            channel: "failing".to_string(),
            reason: format!("cannot deliver {}", alert.id),
        })
    }
}

/// In-memory repository whose operations can be made to fail on demand.
#[derive(Default)]
pub struct FlakyRepository {
    inner: InMemoryRepository,
    fail_state_writes: AtomicBool,
    fail_alert_writes: AtomicBool,
    fail_bookings: AtomicBool,
}

impl FlakyRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inner(&self) -> &InMemoryRepository {
        &self.inner
    }

    pub fn fail_state_writes(&self, fail: bool) {
        self.fail_state_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_alert_writes(&self, fail: bool) {
        self.fail_alert_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_bookings(&self, fail: bool) {
        self.fail_bookings.store(fail, Ordering::SeqCst);
    }

    fn check(flag: &AtomicBool, what: &str) -> PersistenceResult<()> {
        if flag.load(Ordering::SeqCst) {
            Err(PersistenceError::Unavailable(format!("{what} unavailable")))
        } else {
            Ok(())
        }
    }
}

impl FlightRepository for FlakyRepository {
    fn upsert_flight_state(&self, state: &FlightState) -> PersistenceResult<()> {
        Self::check(&self.fail_state_writes, "flight_state")?;
        self.inner.upsert_flight_state(state)
    }

    fn get_flight_state(&self, flight_number: &str) -> PersistenceResult<Option<FlightState>> {
        self.inner.get_flight_state(flight_number)
    }

    fn insert_alert(&self, alert: &Alert) -> PersistenceResult<()> {
        Self::check(&self.fail_alert_writes, "alerts")?;
        self.inner.insert_alert(alert)
    }

    fn get_alert(&self, alert_id: &str) -> PersistenceResult<Option<Alert>> {
        self.inner.get_alert(alert_id)
    }

    fn list_alerts(&self, query: &AlertQuery) -> PersistenceResult<Vec<Alert>> {
        self.inner.list_alerts(query)
    }

    fn resolve_alert(&self, alert_id: &str, resolved_at: Timestamp) -> PersistenceResult<Alert> {
        self.inner.resolve_alert(alert_id, resolved_at)
    }

    fn insert_booking(&self, booking: &Booking) -> PersistenceResult<()> {
        self.inner.insert_booking(booking)
    }

    fn find_bookings_by_flight(&self, flight_number: &str) -> PersistenceResult<Vec<String>> {
        Self::check(&self.fail_bookings, "bookings")?;
        self.inner.find_bookings_by_flight(flight_number)
    }
}

/// Unique database path under the system temp directory.
pub fn temp_db_path() -> PathBuf {
    std::env::temp_dir().join(format!("flightwatch_it_{}.db", uuid::Uuid::new_v4()))
}

/// Remove a database file and its WAL side files.
pub fn remove_db(path: &PathBuf) {
    let _ = std::fs::remove_file(path);
    let _ = std::fs::remove_file(path.with_extension("db-wal"));
    let _ = std::fs::remove_file(path.with_extension("db-shm"));
}
