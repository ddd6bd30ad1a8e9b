//! Low-stock alert capability.

use serde::{Deserialize, Serialize};

use stockcast_core::UnitId;

use crate::error::AlertError;

/// Payload handed to an [`AlertSink`] when a product drops below safety stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowStockAlert {
    pub unit_id: UnitId,
    pub product_name: String,
    pub current_stock: i64,
    pub reorder_quantity: i64,
}

/// Side channel for low-stock notifications (chat, mail, logs...).
///
/// Injected at construction. Delivery is best-effort: errors are logged by the
/// caller and never abort a restock decision.
pub trait AlertSink: Send + Sync {
    fn alert(&self, alert: &LowStockAlert) -> Result<(), AlertError>;
}

/// Plain callbacks can act as sinks.
impl<F> AlertSink for F
where
    F: Fn(&LowStockAlert) -> Result<(), AlertError> + Send + Sync,
{
    fn alert(&self, alert: &LowStockAlert) -> Result<(), AlertError> {
        self(alert)
    }
}
