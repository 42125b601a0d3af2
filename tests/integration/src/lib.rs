//! End-to-end tests for the FlightWatch pipeline
//!
//! This test suite validates:
//! - Disruption scenarios from ingestion through alert storage
//! - Per-flight ordering and validation isolation
//! - Shutdown draining of both queues
//! - Failure isolation for the repository and notification sinks
//! - The SQLite repository under the full pipeline

pub mod test_utils;

#[cfg(test)]
mod pipeline_scenarios;

#[cfg(test)]
mod failure_isolation;

#[cfg(test)]
mod sqlite_pipeline;
