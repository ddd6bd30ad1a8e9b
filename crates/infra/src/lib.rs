//! Infrastructure layer: data sources, alert adapters, config, request service.

pub mod alerts;
pub mod config;
pub mod service;
pub mod sources;

pub use alerts::{ChannelAlertSink, ChannelAlertSinkHandle, InMemoryAlertSink, LogAlertSink};
pub use config::{AppConfig, ConfigError};
pub use service::{DefaultProvider, ForecastService, ServiceError};
pub use sources::{
    CsvSource, DataAccessError, InMemoryInventory, InMemorySales, InventorySource, PostgresSource,
    SalesSource,
};
