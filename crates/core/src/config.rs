//! Configuration management for FlightWatch.
//!
//! Configuration is read from a TOML file and then overridden by environment
//! variables. Every section has defaults, so an empty file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Environment variable naming the TOML configuration file.
pub const ENV_CONFIG_PATH: &str = "FLIGHTWATCH_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub pipeline: PipelineConfig,
    pub detector: DetectorConfig,
    pub notify: NotifyConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub event_queue_capacity: usize,
    pub alert_queue_capacity: usize,
    /// Bounded wait of a worker's dequeue before it re-checks the running flag.
    pub poll_interval_ms: u64,
    /// How long `stop()` waits for each worker to drain.
    pub shutdown_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub delay_threshold_minutes: i64,
    pub high_severity_minutes: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub disabled: bool,
    pub log_sink: bool,
    pub webhook_url: Option<String>,
    pub webhook_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            port: 8090,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sqlite,
            path: PathBuf::from("data/flightwatch.db"),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            event_queue_capacity: 1024,
            alert_queue_capacity: 1024,
            poll_interval_ms: 1000,
            shutdown_timeout_ms: 5000,
        }
    }
}

impl PipelineConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            delay_threshold_minutes: 45,
            high_severity_minutes: 120,
        }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            disabled: false,
            log_sink: true,
            webhook_url: None,
            webhook_timeout_ms: 5000,
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// File named by `FLIGHTWATCH_CONFIG` (or defaults), then environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var(ENV_CONFIG_PATH) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default_config(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            pipeline: PipelineConfig::default(),
            detector: DetectorConfig::default(),
            notify: NotifyConfig::default(),
        }
    }

    /// Apply `PORT`, `BIND_ADDR`, `DATABASE_PATH`, `STORAGE_BACKEND`,
    /// `WEBHOOK_URL` and `NOTIFY_DISABLED` from `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| Error::Config(format!("PORT is not a valid port: {port}")))?;
        }
        if let Some(addr) = lookup("BIND_ADDR") {
            self.server.bind_addr = addr;
        }
        if let Some(path) = lookup("DATABASE_PATH") {
            self.storage.path = PathBuf::from(path);
        }
        if let Some(backend) = lookup("STORAGE_BACKEND") {
            self.storage.backend = match backend.to_ascii_lowercase().as_str() {
                "sqlite" => StorageBackend::Sqlite,
                "memory" => StorageBackend::Memory,
                other => {
                    return Err(Error::Config(format!(
                        "STORAGE_BACKEND must be sqlite or memory, got {other}"
                    )))
                }
            };
        }
        if let Some(url) = lookup("WEBHOOK_URL") {
            self.notify.webhook_url = Some(url).filter(|u| !u.is_empty());
        }
        if let Some(disabled) = lookup("NOTIFY_DISABLED") {
            self.notify.disabled = disabled.eq_ignore_ascii_case("true") || disabled == "1";
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let pipeline = &self.pipeline;
        if pipeline.event_queue_capacity == 0 || pipeline.alert_queue_capacity == 0 {
            return Err(Error::Config("queue capacities must be positive".to_string()));
        }
        if pipeline.poll_interval_ms == 0 {
            return Err(Error::Config("poll_interval_ms must be positive".to_string()));
        }
        let detector = &self.detector;
        if detector.delay_threshold_minutes < 0 {
            return Err(Error::Config(
                "delay_threshold_minutes must not be negative".to_string(),
            ));
        }
        if detector.high_severity_minutes < detector.delay_threshold_minutes {
            return Err(Error::Config(
                "high_severity_minutes must be at least delay_threshold_minutes".to_string(),
            ));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.bind_addr, self.server.port)
    }
}
