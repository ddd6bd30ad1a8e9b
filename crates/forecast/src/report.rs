//! Unified per-unit report.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use stockcast_core::UnitId;
use stockcast_inventory::{InventorySnapshot, group_by_unit};

use crate::restock::RestockSuggestion;
use crate::result::ForecastResult;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitReport {
    pub sales_forecast: ForecastResult,
    pub inventory: Vec<InventorySnapshot>,
    pub restock_suggestions: Vec<RestockSuggestion>,
}

/// Report keyed by unit, in ascending unit order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Report(BTreeMap<UnitId, UnitReport>);

impl Report {
    pub fn get(&self, unit: UnitId) -> Option<&UnitReport> {
        self.0.get(&unit)
    }

    pub fn unit_ids(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&UnitId, &UnitReport)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Merge forecasts, inventory rows and suggestions into one report.
///
/// The key set is the union of every unit seen in any input: a unit with
/// inventory but no sales gets an empty forecast, a unit with sales but no
/// inventory gets empty inventory and suggestion lists.
pub fn assemble(
    mut forecasts: BTreeMap<UnitId, ForecastResult>,
    inventory: &[InventorySnapshot],
    mut suggestions: BTreeMap<UnitId, Vec<RestockSuggestion>>,
) -> Report {
    let mut rows = group_by_unit(inventory);

    let mut units: Vec<UnitId> = forecasts
        .keys()
        .chain(rows.keys())
        .chain(suggestions.keys())
        .copied()
        .collect();
    units.sort_unstable();
    units.dedup();

    let merged = units
        .into_iter()
        .map(|unit| {
            let entry = UnitReport {
                sales_forecast: forecasts.remove(&unit).unwrap_or_default(),
                inventory: rows.remove(&unit).unwrap_or_default(),
                restock_suggestions: suggestions.remove(&unit).unwrap_or_default(),
            };
            (unit, entry)
        })
        .collect();

    Report(merged)
}
