use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use flightwatch_core::{AlertQuery, AlertSeverity, PersistenceError};
use flightwatch_stream::{MetricsSnapshot, MonitorError, SubmitError};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, warn};

use crate::state::AppState;

type ApiResponse = (StatusCode, Json<Value>);

#[derive(Debug, Default, Deserialize)]
pub struct AlertParams {
    pub limit: Option<usize>,
    pub flight_number: Option<String>,
    pub severity: Option<String>,
    pub resolved: Option<bool>,
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": if state.monitor.is_running() { "healthy" } else { "stopped" },
        "service": "flight-ingest",
        "storage": state.config.storage.backend,
        "timestamp": Utc::now().to_rfc3339()
    }))
}

pub async fn ingest_flight_event(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResponse {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "Event body is not valid JSON");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "accepted": false,
                    "errors": { "payload": "Request body must be a JSON object" }
                })),
            );
        }
    };

    match state.monitor.submit_json(&payload) {
        Ok(update) => (
            StatusCode::ACCEPTED,
            Json(json!({
                "accepted": true,
                "flight_number": update.flight_number,
                "status": update.status
            })),
        ),
        Err(SubmitError::Invalid(errors)) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "accepted": false, "errors": errors })),
        ),
        Err(e @ (SubmitError::QueueFull | SubmitError::Closed)) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "accepted": false, "error": e.to_string() })),
        ),
    }
}

pub async fn get_flight_state(
    State(state): State<Arc<AppState>>,
    Path(flight_number): Path<String>,
) -> ApiResponse {
    match state.monitor.get_flight_state(&flight_number) {
        Some(flight_state) => (StatusCode::OK, Json(json!({ "flight_state": flight_state }))),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("Flight {flight_number} not found") })),
        ),
    }
}

pub async fn list_alerts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AlertParams>,
) -> ApiResponse {
    let severity = match params.severity.as_deref().map(str::parse::<AlertSeverity>) {
        Some(Ok(severity)) => Some(severity),
        Some(Err(e)) => {
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() })));
        }
        None => None,
    };

    let mut query = AlertQuery {
        flight_number: params.flight_number,
        severity,
        resolved: params.resolved,
        ..AlertQuery::default()
    };
    if let Some(limit) = params.limit {
        query.limit = limit;
    }
    let limit = query.effective_limit();

    match state.monitor.list_alerts(query).await {
        Ok(alerts) => (
            StatusCode::OK,
            Json(json!({ "count": alerts.len(), "limit": limit, "alerts": alerts })),
        ),
        Err(e) => internal_error(e),
    }
}

pub async fn resolve_alert(
    State(state): State<Arc<AppState>>,
    Path(alert_id): Path<String>,
) -> ApiResponse {
    match state.monitor.resolve_alert(&alert_id).await {
        Ok(alert) => (StatusCode::OK, Json(json!({ "alert": alert }))),
        Err(MonitorError::Persistence(e @ PersistenceError::AlertNotFound { .. })) => {
            (StatusCode::NOT_FOUND, Json(json!({ "error": e.to_string() })))
        }
        Err(MonitorError::Persistence(e @ PersistenceError::AlreadyResolved { .. })) => {
            (StatusCode::CONFLICT, Json(json!({ "error": e.to_string() })))
        }
        Err(e) => internal_error(e),
    }
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> Json<MetricsSnapshot> {
    Json(state.monitor.metrics())
}

fn internal_error(e: MonitorError) -> ApiResponse {
    error!(error = %e, "Request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "internal error" })),
    )
}
