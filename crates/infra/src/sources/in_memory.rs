use std::sync::RwLock;

use stockcast_inventory::InventorySnapshot;
use stockcast_sales::SalesRecord;

use super::{DataAccessError, InventorySource, SalesSource};

/// In-memory sales rows for tests/dev.
#[derive(Debug, Default)]
pub struct InMemorySales {
    inner: RwLock<Vec<SalesRecord>>,
}

impl InMemorySales {
    pub fn new(records: Vec<SalesRecord>) -> Self {
        Self {
            inner: RwLock::new(records),
        }
    }

    /// Swap the whole data set (subsequent fetches see the new rows).
    pub fn replace(&self, records: Vec<SalesRecord>) {
        if let Ok(mut rows) = self.inner.write() {
            *rows = records;
        }
    }

    pub fn push(&self, record: SalesRecord) {
        if let Ok(mut rows) = self.inner.write() {
            rows.push(record);
        }
    }
}

#[async_trait::async_trait]
impl SalesSource for InMemorySales {
    async fn fetch_sales(&self) -> Result<Vec<SalesRecord>, DataAccessError> {
        self.inner
            .read()
            .map(|rows| rows.clone())
            .map_err(|_| DataAccessError::Unavailable("sales store lock poisoned".to_string()))
    }
}

/// In-memory inventory rows for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryInventory {
    inner: RwLock<Vec<InventorySnapshot>>,
}

impl InMemoryInventory {
    pub fn new(rows: Vec<InventorySnapshot>) -> Self {
        Self {
            inner: RwLock::new(rows),
        }
    }

    pub fn replace(&self, rows: Vec<InventorySnapshot>) {
        if let Ok(mut current) = self.inner.write() {
            *current = rows;
        }
    }
}

#[async_trait::async_trait]
impl InventorySource for InMemoryInventory {
    async fn fetch_inventory(&self) -> Result<Vec<InventorySnapshot>, DataAccessError> {
        self.inner
            .read()
            .map(|rows| rows.clone())
            .map_err(|_| DataAccessError::Unavailable("inventory store lock poisoned".to_string()))
    }
}
