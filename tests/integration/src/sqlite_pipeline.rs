//! Full pipeline over the SQLite repository

use crate::test_utils::*;
use flightwatch_core::{
    AlertQuery, AlertSeverity, Booking, FlightRepository, FlightStatus, SqliteRepository,
};
use std::sync::Arc;

#[tokio::test]
async fn alerts_and_state_survive_restart() {
    let path = temp_db_path();

    {
        let repository = Arc::new(SqliteRepository::open(&path).unwrap());
        repository
            .insert_booking(&Booking::confirmed("cust-1", "QP8001"))
            .unwrap();
        repository
            .insert_booking(&Booking::confirmed("cust-2", "QP8001"))
            .unwrap();

        let sink = Arc::new(RecordingSink::new());
        let monitor = monitor_with(repository, sink.clone());
        monitor.start().unwrap();
        monitor.submit(event("QP8001", "ON_TIME", 0)).unwrap();
        monitor.submit(event("QP8001", "DELAYED", 150)).unwrap();
        monitor.stop().await.unwrap();

        assert_eq!(sink.alerts().len(), 1);
    }

    let reopened = SqliteRepository::open(&path).unwrap();
    let state = reopened.get_flight_state("QP8001").unwrap().unwrap();
    assert_eq!(state.status, FlightStatus::Delayed);
    assert_eq!(state.delay_minutes(), Some(150));

    let alerts = reopened
        .list_alerts(&AlertQuery {
            severity: Some(AlertSeverity::High),
            ..AlertQuery::default()
        })
        .unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(
        alerts[0].customer_ids,
        vec!["cust-1".to_string(), "cust-2".to_string()]
    );
    assert_eq!(alerts[0].message, "Flight QP8001 is delayed by 150 minutes");

    drop(reopened);
    remove_db(&path);
}

#[tokio::test]
async fn resolve_round_trips_through_sqlite() {
    let path = temp_db_path();
    let repository = Arc::new(SqliteRepository::open(&path).unwrap());
    let monitor = monitor_with(repository.clone(), Arc::new(RecordingSink::new()));
    monitor.start().unwrap();

    monitor.submit(event("QP8100", "CANCELLED", 0)).unwrap();
    monitor.stop().await.unwrap();

    let alert = monitor.get_recent_alerts(1).await.unwrap().remove(0);
    monitor.resolve_alert(&alert.id).await.unwrap();

    let stored = repository.get_alert(&alert.id).unwrap().unwrap();
    assert!(stored.is_resolved());
    let open = repository
        .list_alerts(&AlertQuery {
            resolved: Some(false),
            ..AlertQuery::default()
        })
        .unwrap();
    assert!(open.is_empty());

    drop(monitor);
    drop(repository);
    remove_db(&path);
}
