use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the HTTP router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/events/flight", post(handlers::ingest_flight_event))
        .route("/flight-state/:flight_number", get(handlers::get_flight_state))
        .route("/alerts", get(handlers::list_alerts))
        .route("/alerts/:alert_id/resolve", post(handlers::resolve_alert))
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}
