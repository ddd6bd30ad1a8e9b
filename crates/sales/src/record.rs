use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockcast_core::UnitId;

/// A single sale as stored upstream (one row of the `sales` table).
///
/// Records are append-only; the aggregator never mutates them. Negative amounts
/// (refunds) are accepted as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub unit_id: UnitId,
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl SalesRecord {
    pub fn new(unit_id: impl Into<UnitId>, amount: Decimal, timestamp: DateTime<Utc>) -> Self {
        Self {
            unit_id: unit_id.into(),
            amount,
            timestamp,
        }
    }
}
