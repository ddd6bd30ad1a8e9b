//! Application configuration.
//!
//! Layers, later wins:
//! 1. built-in defaults
//! 2. `config/default.toml` (optional)
//! 3. `STOCKCAST__*` environment variables (e.g. `STOCKCAST__FORECAST_DAYS=28`)

use std::net::SocketAddr;
use std::path::Path;

use config::{Config, Environment, File};
use serde::Deserialize;
use tracing::info;

use stockcast_forecast::AgentConfig;

const CONFIG_DIR: &str = "config";
const ENV_PREFIX: &str = "STOCKCAST";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    /// Forecast horizon in days.
    pub forecast_days: usize,
    pub base_safety_stock: u32,
    /// Forecast worker threads; 0 = available cores.
    pub workers: usize,
    pub bind_addr: String,
    /// Postgres connection string; takes precedence over the CSV files.
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default)]
    pub sales_csv: Option<String>,
    #[serde(default)]
    pub inventory_csv: Option<String>,
    pub alert_queue_capacity: usize,
    /// In-flight HTTP requests before new ones wait.
    pub max_concurrent_requests: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            forecast_days: 14,
            base_safety_stock: 5,
            workers: 0,
            bind_addr: "0.0.0.0:8080".to_string(),
            database_url: None,
            sales_csv: None,
            inventory_csv: None,
            alert_queue_capacity: 256,
            max_concurrent_requests: 64,
        }
    }
}

impl AppConfig {
    /// Load from `./config` and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(
            Path::new(CONFIG_DIR),
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
    }

    /// Load with an explicit config directory and environment source.
    pub fn load_from(dir: &Path, env: Environment) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Config::builder()
            .set_default("forecast_days", defaults.forecast_days as i64)?
            .set_default("base_safety_stock", defaults.base_safety_stock as i64)?
            .set_default("workers", defaults.workers as i64)?
            .set_default("bind_addr", defaults.bind_addr)?
            .set_default("alert_queue_capacity", defaults.alert_queue_capacity as i64)?
            .set_default("max_concurrent_requests", defaults.max_concurrent_requests as i64)?
            .add_source(File::with_name(&dir.join("default").to_string_lossy()).required(false))
            .add_source(env)
            .build()?;

        let app_config: AppConfig = config.try_deserialize()?;
        app_config.validate()?;

        info!(
            forecast_days = app_config.forecast_days,
            base_safety_stock = app_config.base_safety_stock,
            workers = app_config.workers,
            bind_addr = %app_config.bind_addr,
            postgres = app_config.database_url.is_some(),
            "configuration loaded"
        );
        Ok(app_config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.forecast_days == 0 {
            return Err(ConfigError::Invalid("forecast_days must be >= 1".to_string()));
        }
        if self.alert_queue_capacity == 0 {
            return Err(ConfigError::Invalid("alert_queue_capacity must be >= 1".to_string()));
        }
        if self.max_concurrent_requests == 0 {
            return Err(ConfigError::Invalid("max_concurrent_requests must be >= 1".to_string()));
        }
        self.socket_addr()?;
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind_addr
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("bind_addr {:?}: {e}", self.bind_addr)))
    }

    pub fn agent_config(&self) -> AgentConfig {
        AgentConfig::default()
            .with_forecast_days(self.forecast_days)
            .with_base_safety_stock(self.base_safety_stock)
            .with_workers(self.workers)
    }
}
