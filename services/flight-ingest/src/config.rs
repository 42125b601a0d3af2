use std::env;

use flightwatch_core::logging::LogFormat;
use flightwatch_core::Config;

/// Service settings: the pipeline configuration plus process-level knobs.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub core: Config,
    pub log_format: LogFormat,
}

impl ServiceConfig {
    pub fn from_env() -> flightwatch_core::Result<Self> {
        Ok(ServiceConfig {
            core: Config::load()?,
            log_format: LogFormat::from_env_value(env::var("LOG_FORMAT").ok().as_deref()),
        })
    }
}
