//! Sales history domain module.
//!
//! This crate holds the event-level sales records and the aggregation that turns
//! them into per-unit time series, implemented purely as deterministic domain
//! logic (no IO, no HTTP, no storage).

pub mod aggregate;
pub mod record;
pub mod series;

pub use aggregate::{aggregate_by_unit, aggregate_unit};
pub use record::SalesRecord;
pub use series::{SeriesPoint, TimeSeries};
