//! Forecast + current stock -> reorder decision.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use stockcast_inventory::InventorySnapshot;

use crate::alert::{AlertSink, LowStockAlert};
use crate::result::ForecastResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RestockStatus {
    Low,
    Ok,
}

/// Derived per (unit, product); recomputed on every request, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestockSuggestion {
    pub product_name: String,
    pub current_stock: i64,
    /// Sum of forecast point estimates, rounded to 2 decimals.
    pub expected_sales: Decimal,
    pub safety_stock: i64,
    pub reorder_quantity: i64,
    pub status: RestockStatus,
}

/// Reorder rule with a forecast-driven safety buffer.
///
/// - `expected_sales = sum(yhat)` over the horizon (0 without a forecast)
/// - `safety_stock = base + floor(stddev(yhat_upper))`
/// - `reorder_quantity = max(0, round(expected_sales) - current_stock + safety_stock)`
/// - `LOW` iff `current_stock < safety_stock`
#[derive(Clone)]
pub struct RestockPolicy {
    base_safety_stock: u32,
    alert_sink: Option<Arc<dyn AlertSink>>,
}

impl core::fmt::Debug for RestockPolicy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RestockPolicy")
            .field("base_safety_stock", &self.base_safety_stock)
            .field("alert_sink", &self.alert_sink.is_some())
            .finish()
    }
}

impl RestockPolicy {
    pub fn new(base_safety_stock: u32) -> Self {
        Self {
            base_safety_stock,
            alert_sink: None,
        }
    }

    pub fn with_alert_sink(mut self, sink: Arc<dyn AlertSink>) -> Self {
        self.alert_sink = Some(sink);
        self
    }

    pub fn base_safety_stock(&self) -> u32 {
        self.base_safety_stock
    }

    /// Expected demand over the horizon; negative model output is clamped to 0.
    pub fn expected_sales(forecast: Option<&ForecastResult>) -> f64 {
        match forecast {
            Some(f) if !f.is_empty() => {
                let total = f.expected_total();
                if total.is_finite() { total.max(0.0) } else { 0.0 }
            }
            _ => 0.0,
        }
    }

    pub fn safety_stock(&self, forecast: Option<&ForecastResult>) -> i64 {
        let base = i64::from(self.base_safety_stock);
        let spread = match forecast {
            Some(f) if !f.is_empty() => f.upper_bound_stddev(),
            _ => 0.0,
        };
        if spread.is_finite() && spread > 0.0 {
            base.saturating_add(spread.floor() as i64)
        } else {
            base
        }
    }

    pub fn decide(
        &self,
        forecast: Option<&ForecastResult>,
        row: &InventorySnapshot,
    ) -> RestockSuggestion {
        let expected = Self::expected_sales(forecast);
        let safety_stock = self.safety_stock(forecast);
        let reorder_quantity = (expected.round() as i64)
            .saturating_sub(row.stock_level)
            .saturating_add(safety_stock)
            .max(0);
        let status = if row.stock_level < safety_stock {
            RestockStatus::Low
        } else {
            RestockStatus::Ok
        };

        if status == RestockStatus::Low {
            self.notify(row, reorder_quantity);
        }

        let expected_sales = match Decimal::try_from(expected) {
            Ok(d) => d.round_dp(2),
            Err(_) => {
                warn!(
                    unit = %row.unit_id,
                    product = %row.product_name,
                    expected,
                    "expected sales exceed decimal range; clamping"
                );
                Decimal::MAX
            }
        };

        RestockSuggestion {
            product_name: row.product_name.clone(),
            current_stock: row.stock_level,
            expected_sales,
            safety_stock,
            reorder_quantity,
            status,
        }
    }

    /// Decide for every inventory row of one unit, in row order.
    pub fn decide_all(
        &self,
        forecast: Option<&ForecastResult>,
        rows: &[InventorySnapshot],
    ) -> Vec<RestockSuggestion> {
        rows.iter().map(|row| self.decide(forecast, row)).collect()
    }

    fn notify(&self, row: &InventorySnapshot, reorder_quantity: i64) {
        let Some(sink) = &self.alert_sink else {
            return;
        };

        let alert = LowStockAlert {
            unit_id: row.unit_id,
            product_name: row.product_name.clone(),
            current_stock: row.stock_level,
            reorder_quantity,
        };

        match sink.alert(&alert) {
            Ok(()) => debug!(unit = %row.unit_id, product = %row.product_name, "low stock alert sent"),
            Err(e) => warn!(
                unit = %row.unit_id,
                product = %row.product_name,
                error = %e,
                "low stock alert failed; continuing"
            ),
        }
    }
}
