//! `stockcast-forecast`
//!
//! **Responsibility:** the forecast-to-restock decision pipeline.
//!
//! - Per-unit series are forecast through a pluggable [`ForecastProvider`].
//! - Forecast + current stock become a [`RestockSuggestion`] via [`RestockPolicy`].
//! - Everything is merged into one [`Report`] keyed by unit.
//!
//! This crate stays storage-agnostic: sales and inventory rows are provided by
//! callers (infra/API). It never performs IO besides invoking the injected
//! [`AlertSink`].

pub mod agent;
pub mod alert;
pub mod error;
mod linalg;
pub mod provider;
pub mod report;
pub mod restock;
pub mod result;
pub mod seasonal;

pub use agent::{AgentConfig, ForecastAgent};
pub use alert::{AlertSink, LowStockAlert};
pub use error::{AgentError, AlertError, ModelFitError};
pub use provider::{
    degraded_forecast, ForecastModel, ForecastProvider, GuardedForecaster, MIN_MODEL_HISTORY,
};
pub use report::{assemble, Report, UnitReport};
pub use restock::{RestockPolicy, RestockStatus, RestockSuggestion};
pub use result::{ForecastPoint, ForecastResult};
pub use seasonal::{Seasonality, SeasonalTrendModel};
