//! Disruption scenarios driven through the full pipeline

use crate::test_utils::*;
use flightwatch_core::{
    AlertQuery, AlertSeverity, AlertType, Booking, BookingStatus, FlightEvent, FlightRepository,
    FlightStatus,
};
use flightwatch_stream::{SubmitError, WorkerState};
use serde_json::json;

#[tokio::test]
async fn scenario_a_delay_raises_medium_alert() {
    let (monitor, repository, sink) = running_pipeline();

    monitor.submit(event("QP1001", "ON_TIME", 0)).unwrap();
    monitor.submit(event("QP1001", "DELAYED", 60)).unwrap();
    monitor.stop().await.unwrap();

    let alerts = sink.alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].alert_type, AlertType::Delay);
    assert_eq!(alerts[0].severity, AlertSeverity::Medium);
    assert!(alerts[0].message.contains("60 minutes"));

    let stored = repository.list_recent_alerts(10).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, alerts[0].id);
}

#[tokio::test]
async fn scenario_b_small_delay_is_silent() {
    let (monitor, repository, sink) = running_pipeline();

    monitor.submit(event("QP1002", "DELAYED", 20)).unwrap();
    monitor.stop().await.unwrap();

    assert!(sink.alerts().is_empty());
    assert_eq!(repository.alert_count(), 0);
    assert_eq!(
        monitor.get_flight_state("QP1002").unwrap().status,
        FlightStatus::Delayed
    );
}

#[tokio::test]
async fn scenario_c_cancellation_is_critical() {
    let (monitor, repository, sink) = running_pipeline();
    repository
        .insert_booking(&Booking::confirmed("cust-7", "QP1003"))
        .unwrap();
    repository
        .insert_booking(&Booking::new("cust-8", "QP1003", BookingStatus::Cancelled))
        .unwrap();

    monitor.submit(event("QP1003", "CANCELLED", 0)).unwrap();
    monitor.stop().await.unwrap();

    let alerts = sink.alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].alert_type, AlertType::Cancellation);
    assert_eq!(alerts[0].severity, AlertSeverity::Critical);
    assert_eq!(alerts[0].message, "Flight QP1003 has been cancelled");
    assert_eq!(alerts[0].customer_ids, vec!["cust-7".to_string()]);
}

#[tokio::test]
async fn scenario_d_boarding_transition_once() {
    let (monitor, _repository, sink) = running_pipeline();

    monitor.submit(event("QP1004", "ON_TIME", 0)).unwrap();
    monitor.submit(event("QP1004", "BOARDING", 0)).unwrap();
    monitor.submit(event("QP1004", "BOARDING", 0)).unwrap();
    monitor.stop().await.unwrap();

    let alerts = sink.alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].alert_type, AlertType::ScheduleChange);
    assert_eq!(alerts[0].severity, AlertSeverity::Low);
    assert_eq!(alerts[0].message, "Flight QP1004 status changed to BOARDING");
}

#[tokio::test]
async fn last_submitted_status_wins_per_flight() {
    let (monitor, _repository, _sink) = running_pipeline();
    let statuses = ["ON_TIME", "DELAYED", "BOARDING", "DEPARTED", "ARRIVED"];

    for status in statuses {
        monitor.submit(event("QP2000", status, 0)).unwrap();
        monitor.submit(event("QP2001", "ON_TIME", 0)).unwrap();
    }
    monitor.stop().await.unwrap();

    assert_eq!(
        monitor.get_flight_state("QP2000").unwrap().status,
        FlightStatus::Arrived
    );
    assert_eq!(monitor.tracked_flights(), 2);
    assert_eq!(monitor.metrics().events_processed, 10);
}

#[tokio::test]
async fn transitions_alert_in_submission_order() {
    let (monitor, repository, _sink) = running_pipeline();

    monitor.submit(event("QP3000", "ON_TIME", 0)).unwrap();
    monitor.submit(event("QP3000", "BOARDING", 0)).unwrap();
    monitor.submit(event("QP3000", "DEPARTED", 0)).unwrap();
    monitor.stop().await.unwrap();

    let messages: Vec<String> = repository
        .list_alerts(&AlertQuery::default())
        .unwrap()
        .into_iter()
        .map(|a| a.message)
        .collect();
    assert_eq!(
        messages,
        vec![
            "Flight QP3000 status changed to DEPARTED".to_string(),
            "Flight QP3000 status changed to BOARDING".to_string(),
        ]
    );
}

#[tokio::test]
async fn invalid_events_never_touch_state() {
    let (monitor, _repository, sink) = running_pipeline();

    monitor.submit(event("QP4000", "ON_TIME", 0)).unwrap();
    let bad = [
        FlightEvent::new("QP4000", "CANCELED", T0),
        FlightEvent::new("QP4000", "CANCELLED", "tomorrow"),
        FlightEvent::new("QP4000", "CANCELLED", T0).scheduled("soon"),
        FlightEvent::new("QP4000-THIS-IS-WAY-TOO-LONG", "CANCELLED", T0),
    ];
    for event in bad {
        assert!(matches!(monitor.submit(event), Err(SubmitError::Invalid(_))));
    }
    let rejected = monitor.submit_json(&json!({"flight_number": "QP4000", "status": 3}));
    assert!(matches!(rejected, Err(SubmitError::Invalid(_))));
    monitor.stop().await.unwrap();

    assert_eq!(
        monitor.get_flight_state("QP4000").unwrap().status,
        FlightStatus::OnTime
    );
    assert!(sink.alerts().is_empty());
    let snapshot = monitor.metrics();
    assert_eq!(snapshot.events_accepted, 1);
    assert_eq!(snapshot.events_rejected, 5);
}

#[tokio::test]
async fn stop_drains_everything_accepted() {
    let (monitor, repository, sink) = running_pipeline();

    for i in 0..50 {
        monitor
            .submit(event(&format!("QP5{i:03}"), "CANCELLED", 0))
            .unwrap();
    }
    monitor.stop().await.unwrap();

    assert_eq!(sink.alerts().len(), 50);
    assert_eq!(repository.alert_count(), 50);
    let snapshot = monitor.metrics();
    assert_eq!(snapshot.events_processed, 50);
    assert_eq!(snapshot.alerts_persisted, 50);
    assert_eq!(snapshot.event_worker, WorkerState::Stopped);
    assert_eq!(snapshot.notification_worker, WorkerState::Stopped);
}

#[tokio::test]
async fn recent_alerts_are_newest_first_and_limited() {
    let (monitor, _repository, _sink) = running_pipeline();

    for flight in ["QP6001", "QP6002", "QP6003"] {
        monitor.submit(event(flight, "CANCELLED", 0)).unwrap();
    }
    monitor.stop().await.unwrap();

    let recent = monitor.get_recent_alerts(2).await.unwrap();
    let flights: Vec<&str> = recent.iter().map(|a| a.flight_number.as_str()).collect();
    assert_eq!(flights, vec!["QP6003", "QP6002"]);
}
