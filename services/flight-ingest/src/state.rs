use std::sync::Arc;

use anyhow::Context;
use flightwatch_core::{
    Config, FlightRepository, InMemoryRepository, SqliteRepository, StorageBackend,
};
use flightwatch_detector::DisruptionDetector;
use flightwatch_notify::Notifier;
use flightwatch_stream::DisruptionMonitor;
use tracing::info;

pub struct AppState {
    pub config: Config,
    pub monitor: DisruptionMonitor,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let repository = open_repository(&config)?;
        let notifier =
            Notifier::from_config(&config.notify).context("failed to build notifier")?;
        let monitor = DisruptionMonitor::new(
            repository,
            Arc::new(notifier),
            DisruptionDetector::from(&config.detector),
            &config.pipeline,
        );

        Ok(AppState { config, monitor })
    }

    pub fn with_monitor(config: Config, monitor: DisruptionMonitor) -> Self {
        AppState { config, monitor }
    }
}

fn open_repository(config: &Config) -> anyhow::Result<Arc<dyn FlightRepository>> {
    match config.storage.backend {
        StorageBackend::Sqlite => {
            let path = &config.storage.path;
            let repository = SqliteRepository::open(path)
                .with_context(|| format!("failed to open database {}", path.display()))?;
            info!(path = %path.display(), "Using SQLite repository");
            Ok(Arc::new(repository))
        }
        StorageBackend::Memory => {
            info!("Using in-memory repository");
            Ok(Arc::new(InMemoryRepository::new()))
        }
    }
}
