use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use stockcast_core::{DomainError, DomainResult, UnitId};

/// One row of the `inventory` table: stock of a product at a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySnapshot {
    #[serde(rename = "router_id")]
    pub unit_id: UnitId,
    pub product_name: String,
    pub stock_level: i64,
}

impl InventorySnapshot {
    pub fn new(
        unit_id: impl Into<UnitId>,
        product_name: impl Into<String>,
        stock_level: i64,
    ) -> DomainResult<Self> {
        let product_name = product_name.into();
        if product_name.trim().is_empty() {
            return Err(DomainError::validation("product_name must not be empty"));
        }

        Ok(Self {
            unit_id: unit_id.into(),
            product_name,
            stock_level,
        })
    }
}

/// Group rows by unit, keeping the original row order within each unit.
pub fn group_by_unit<'a, I>(rows: I) -> BTreeMap<UnitId, Vec<InventorySnapshot>>
where
    I: IntoIterator<Item = &'a InventorySnapshot>,
{
    let mut grouped: BTreeMap<UnitId, Vec<InventorySnapshot>> = BTreeMap::new();
    for row in rows {
        grouped.entry(row.unit_id).or_default().push(row.clone());
    }
    grouped
}
