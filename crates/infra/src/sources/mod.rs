//! Data-access collaborators: where sales and inventory rows come from.
//!
//! The pipeline itself is pure; a fetch either yields every row or fails as a
//! whole, so a report is never built from partial data.

use std::sync::Arc;

use stockcast_inventory::InventorySnapshot;
use stockcast_sales::SalesRecord;

pub mod csv;
pub mod in_memory;
pub mod postgres;

pub use self::csv::CsvSource;
pub use in_memory::{InMemoryInventory, InMemorySales};
pub use postgres::PostgresSource;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DataAccessError {
    /// Backing store could not be reached or read.
    #[error("data source unavailable: {0}")]
    Unavailable(String),

    /// Rows were read but do not form valid records.
    #[error("malformed data: {0}")]
    Malformed(String),
}

/// Source of historical sales rows.
#[async_trait::async_trait]
pub trait SalesSource: Send + Sync {
    async fn fetch_sales(&self) -> Result<Vec<SalesRecord>, DataAccessError>;
}

/// Source of current inventory rows.
#[async_trait::async_trait]
pub trait InventorySource: Send + Sync {
    async fn fetch_inventory(&self) -> Result<Vec<InventorySnapshot>, DataAccessError>;
}

#[async_trait::async_trait]
impl<S> SalesSource for Arc<S>
where
    S: SalesSource + ?Sized,
{
    async fn fetch_sales(&self) -> Result<Vec<SalesRecord>, DataAccessError> {
        (**self).fetch_sales().await
    }
}

#[async_trait::async_trait]
impl<S> InventorySource for Arc<S>
where
    S: InventorySource + ?Sized,
{
    async fn fetch_inventory(&self) -> Result<Vec<InventorySnapshot>, DataAccessError> {
        (**self).fetch_inventory().await
    }
}
