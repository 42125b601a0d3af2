//! Pipeline counters and worker status.
//!
//! Counters are plain atomics so the HTTP layer can snapshot them while the
//! workers keep running.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

/// Observable state of a worker loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    /// Waiting on its queue
    Idle,
    /// Handling an item
    Processing,
    /// Loop has exited
    Stopped,
}

/// Lock-free cell holding a [`WorkerState`].
#[derive(Debug)]
pub struct WorkerStatus(AtomicU8);

impl WorkerStatus {
    /// New status, `Idle`.
    pub fn new() -> Self {
        Self(AtomicU8::new(WorkerState::Idle as u8))
    }

    /// Current state
    pub fn get(&self) -> WorkerState {
        match self.0.load(Ordering::Acquire) {
            0 => WorkerState::Idle,
            1 => WorkerState::Processing,
            _ => WorkerState::Stopped,
        }
    }

    /// Record a transition
    pub fn set(&self, state: WorkerState) {
        self.0.store(state as u8, Ordering::Release);
    }
}

impl Default for WorkerStatus {
    fn default() -> Self {
        Self::new()
    }
}

/// Counters for the whole pipeline.
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    events_accepted: AtomicU64,
    events_rejected: AtomicU64,
    events_processed: AtomicU64,
    alerts_generated: AtomicU64,
    alerts_dispatched: AtomicU64,
    dispatch_failures: AtomicU64,
    alerts_persisted: AtomicU64,
    persistence_failures: AtomicU64,
    resolution_failures: AtomicU64,
    total_processing_time_us: AtomicU64,
    max_latency_us: AtomicU64,
    event_worker: WorkerStatus,
    notification_worker: WorkerStatus,
}

/// Point-in-time copy of [`PipelineMetrics`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub events_accepted: u64,
    pub events_rejected: u64,
    pub events_processed: u64,
    pub alerts_generated: u64,
    pub alerts_dispatched: u64,
    pub dispatch_failures: u64,
    pub alerts_persisted: u64,
    pub persistence_failures: u64,
    pub resolution_failures: u64,
    /// Mean event handling latency (μs)
    pub avg_latency_us: u64,
    /// Worst event handling latency (μs)
    pub max_latency_us: u64,
    pub event_worker: WorkerState,
    pub notification_worker: WorkerState,
}

macro_rules! counter {
    ($($name:ident => $field:ident),* $(,)?) => {
        $(
            pub fn $name(&self) {
                self.$field.fetch_add(1, Ordering::Relaxed);
            }
        )*
    };
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    counter! {
        record_event_accepted => events_accepted,
        record_event_rejected => events_rejected,
        record_alert_generated => alerts_generated,
        record_alert_dispatched => alerts_dispatched,
        record_dispatch_failure => dispatch_failures,
        record_alert_persisted => alerts_persisted,
        record_persistence_failure => persistence_failures,
        record_resolution_failure => resolution_failures,
    }

    /// Count a handled event and its handling latency.
    pub fn record_event_processed(&self, latency_us: u64) {
        self.events_processed.fetch_add(1, Ordering::Relaxed);
        self.total_processing_time_us
            .fetch_add(latency_us, Ordering::Relaxed);
        self.max_latency_us.fetch_max(latency_us, Ordering::Relaxed);
    }

    pub fn event_worker(&self) -> &WorkerStatus {
        &self.event_worker
    }

    pub fn notification_worker(&self) -> &WorkerStatus {
        &self.notification_worker
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let processed = self.events_processed.load(Ordering::Relaxed);
        let total_us = self.total_processing_time_us.load(Ordering::Relaxed);
        MetricsSnapshot {
            events_accepted: self.events_accepted.load(Ordering::Relaxed),
            events_rejected: self.events_rejected.load(Ordering::Relaxed),
            events_processed: processed,
            alerts_generated: self.alerts_generated.load(Ordering::Relaxed),
            alerts_dispatched: self.alerts_dispatched.load(Ordering::Relaxed),
            dispatch_failures: self.dispatch_failures.load(Ordering::Relaxed),
            alerts_persisted: self.alerts_persisted.load(Ordering::Relaxed),
            persistence_failures: self.persistence_failures.load(Ordering::Relaxed),
            resolution_failures: self.resolution_failures.load(Ordering::Relaxed),
            avg_latency_us: if processed == 0 { 0 } else { total_us / processed },
            max_latency_us: self.max_latency_us.load(Ordering::Relaxed),
            event_worker: self.event_worker.get(),
            notification_worker: self.notification_worker.get(),
        }
    }
}
