//! FlightWatch Stream
//!
//! The asynchronous disruption pipeline: a bounded event queue feeding the
//! event worker, which keeps the flight state store current and detects
//! disruptions, and an alert queue feeding the notification worker, which
//! dispatches and stores alerts.

pub mod dispatcher;
pub mod error;
pub mod metrics;
pub mod monitor;
pub mod store;
pub mod worker;

pub use dispatcher::NotificationWorker;
pub use error::{MonitorError, MonitorResult, SubmitError};
pub use metrics::{MetricsSnapshot, PipelineMetrics, WorkerState};
pub use monitor::DisruptionMonitor;
pub use store::FlightStateStore;
pub use worker::EventWorker;
