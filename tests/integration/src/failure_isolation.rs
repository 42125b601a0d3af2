//! Per-item failure isolation in both workers

use crate::test_utils::*;
use flightwatch_core::{AlertType, Booking, FlightRepository, FlightStatus};
use std::sync::Arc;

#[tokio::test]
async fn state_write_failure_keeps_cache_and_alerts() {
    let repository = Arc::new(FlakyRepository::new());
    repository.fail_state_writes(true);
    let sink = Arc::new(RecordingSink::new());
    let monitor = monitor_with(repository.clone(), sink.clone());
    monitor.start().unwrap();

    monitor.submit(event("QP7001", "CANCELLED", 0)).unwrap();
    monitor.submit(event("QP7002", "ON_TIME", 0)).unwrap();
    monitor.stop().await.unwrap();

    assert_eq!(
        monitor.get_flight_state("QP7001").unwrap().status,
        FlightStatus::Cancelled
    );
    assert!(repository.get_flight_state("QP7001").unwrap().is_none());
    assert_eq!(sink.alerts().len(), 1);
    assert_eq!(monitor.metrics().persistence_failures, 2);
    assert_eq!(monitor.metrics().events_processed, 2);
}

#[tokio::test]
async fn customer_lookup_failure_yields_empty_recipients() {
    let repository = Arc::new(FlakyRepository::new());
    repository
        .insert_booking(&Booking::confirmed("cust-1", "QP7100"))
        .unwrap();
    repository.fail_bookings(true);
    let sink = Arc::new(RecordingSink::new());
    let monitor = monitor_with(repository.clone(), sink.clone());
    monitor.start().unwrap();

    monitor.submit(event("QP7100", "CANCELLED", 0)).unwrap();
    monitor.stop().await.unwrap();

    let alerts = sink.alerts();
    assert_eq!(alerts.len(), 1);
    assert!(alerts[0].customer_ids.is_empty());
    assert_eq!(monitor.metrics().resolution_failures, 1);
}

#[tokio::test]
async fn dispatch_failure_does_not_block_persistence() {
    let repository = Arc::new(FlakyRepository::new());
    let sink = Arc::new(FailingSink::new());
    let monitor = monitor_with(repository.clone(), sink.clone());
    monitor.start().unwrap();

    monitor.submit(event("QP7200", "CANCELLED", 0)).unwrap();
    monitor.submit(event("QP7201", "DELAYED", 180)).unwrap();
    monitor.stop().await.unwrap();

    assert_eq!(sink.attempts(), 2);
    assert_eq!(repository.inner().alert_count(), 2);
    let snapshot = monitor.metrics();
    assert_eq!(snapshot.dispatch_failures, 2);
    assert_eq!(snapshot.alerts_persisted, 2);
}

#[tokio::test]
async fn alert_write_failure_does_not_stop_worker() {
    let repository = Arc::new(FlakyRepository::new());
    repository.fail_alert_writes(true);
    let sink = Arc::new(RecordingSink::new());
    let monitor = monitor_with(repository.clone(), sink.clone());
    monitor.start().unwrap();

    monitor.submit(event("QP7300", "CANCELLED", 0)).unwrap();
    monitor.submit(event("QP7301", "CANCELLED", 0)).unwrap();
    monitor.stop().await.unwrap();

    let alerts = sink.alerts();
    assert_eq!(alerts.len(), 2);
    assert!(alerts.iter().all(|a| a.alert_type == AlertType::Cancellation));
    assert_eq!(repository.inner().alert_count(), 0);
    assert_eq!(monitor.metrics().persistence_failures, 2);
}
