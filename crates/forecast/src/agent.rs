//! Pipeline orchestration over already-fetched data.
//!
//! Units are forecast independently on a bounded worker pool: every task owns
//! its series and model fit, and results are collected rather than written into
//! shared state. Restock decisions and alerts run afterwards on the caller's
//! thread.

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use chrono::Utc;
use rayon::prelude::*;
use tracing::{debug, error, info};

use stockcast_core::UnitId;
use stockcast_inventory::{InventorySnapshot, group_by_unit};
use stockcast_sales::{SalesRecord, TimeSeries, aggregate_by_unit};

use crate::alert::AlertSink;
use crate::error::AgentError;
use crate::provider::{ForecastProvider, degraded_forecast};
use crate::report::{Report, assemble};
use crate::restock::{RestockPolicy, RestockStatus, RestockSuggestion};
use crate::result::ForecastResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentConfig {
    /// Horizon length in days.
    pub forecast_days: usize,
    pub base_safety_stock: u32,
    /// Worker threads for model fitting; 0 = one per available core.
    pub workers: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            forecast_days: 14,
            base_safety_stock: 5,
            workers: 0,
        }
    }
}

impl AgentConfig {
    pub fn with_forecast_days(mut self, days: usize) -> Self {
        self.forecast_days = days;
        self
    }

    pub fn with_base_safety_stock(mut self, base: u32) -> Self {
        self.base_safety_stock = base;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }
}

/// Forecast agent: sales + inventory in, forecasts / suggestions / report out.
pub struct ForecastAgent<P> {
    provider: P,
    policy: RestockPolicy,
    config: AgentConfig,
    pool: rayon::ThreadPool,
}

impl<P: ForecastProvider> ForecastAgent<P> {
    pub fn new(provider: P, config: AgentConfig) -> Result<Self, AgentError> {
        if config.forecast_days == 0 {
            return Err(AgentError::InvalidConfig(
                "forecast_days must be >= 1".to_string(),
            ));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .thread_name(|i| format!("stockcast-forecast-{i}"))
            .build()?;

        Ok(Self {
            provider,
            policy: RestockPolicy::new(config.base_safety_stock),
            config,
            pool,
        })
    }

    /// Install the low-stock alert side channel.
    pub fn with_alert_sink(mut self, sink: Arc<dyn AlertSink>) -> Self {
        self.policy = self.policy.with_alert_sink(sink);
        self
    }

    pub fn config(&self) -> AgentConfig {
        self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Forecast already-aggregated series, one task per unit.
    pub fn forecast_series(
        &self,
        series: BTreeMap<UnitId, TimeSeries>,
    ) -> BTreeMap<UnitId, ForecastResult> {
        let horizon = self.config.forecast_days;
        let provider = &self.provider;

        self.pool.install(|| {
            series
                .into_par_iter()
                .map(|(unit, s)| {
                    let result = forecast_isolated(provider, unit, &s, horizon);
                    debug!(
                        unit = %unit,
                        points = s.len(),
                        degraded = result.is_degraded(),
                        "unit forecast done"
                    );
                    (unit, result)
                })
                .collect()
        })
    }

    /// Group sales by unit and forecast every unit present.
    pub fn forecast_sales(&self, sales: &[SalesRecord]) -> BTreeMap<UnitId, ForecastResult> {
        self.forecast_series(aggregate_by_unit(sales))
    }

    /// Restock suggestions for every unit that has inventory rows.
    ///
    /// Units without a forecast are decided against zero expected sales.
    pub fn restock_suggestions(
        &self,
        forecasts: &BTreeMap<UnitId, ForecastResult>,
        inventory: &[InventorySnapshot],
    ) -> BTreeMap<UnitId, Vec<RestockSuggestion>> {
        group_by_unit(inventory)
            .into_iter()
            .map(|(unit, rows)| (unit, self.policy.decide_all(forecasts.get(&unit), &rows)))
            .collect()
    }

    /// Full report: forecasts are computed once and reused for the suggestions.
    pub fn report(&self, sales: &[SalesRecord], inventory: &[InventorySnapshot]) -> Report {
        let forecasts = self.forecast_sales(sales);
        let suggestions = self.restock_suggestions(&forecasts, inventory);
        let degraded = forecasts.values().filter(|f| f.is_degraded()).count();
        let low = suggestions
            .values()
            .flatten()
            .filter(|s| s.status == RestockStatus::Low)
            .count();

        let report = assemble(forecasts, inventory, suggestions);
        info!(
            units = report.len(),
            sales_rows = sales.len(),
            inventory_rows = inventory.len(),
            degraded_forecasts = degraded,
            low_stock = low,
            "forecast report assembled"
        );
        report
    }
}

/// Run one unit's forecast so that a panicking model cannot take the report down.
fn forecast_isolated<P: ForecastProvider>(
    provider: &P,
    unit: UnitId,
    series: &TimeSeries,
    horizon: usize,
) -> ForecastResult {
    match panic::catch_unwind(AssertUnwindSafe(|| provider.forecast(series, horizon))) {
        Ok(result) => result,
        Err(_) => {
            error!(unit = %unit, "forecast provider panicked; using degraded forecast");
            degraded_forecast(series, horizon, Utc::now())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::LowStockAlert;
    use crate::error::AlertError;
    use crate::provider::GuardedForecaster;
    use crate::seasonal::SeasonalTrendModel;
    use chrono::{DateTime, Duration, TimeZone};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(n)
    }

    fn agent() -> ForecastAgent<GuardedForecaster<SeasonalTrendModel>> {
        ForecastAgent::new(
            GuardedForecaster::new(SeasonalTrendModel::new()).with_clock(now),
            AgentConfig::default().with_workers(2),
        )
        .unwrap()
    }

    #[derive(Default)]
    struct RecordingSink {
        seen: Mutex<Vec<LowStockAlert>>,
    }

    impl AlertSink for RecordingSink {
        fn alert(&self, alert: &LowStockAlert) -> Result<(), AlertError> {
            self.seen.lock().unwrap().push(alert.clone());
            Ok(())
        }
    }

    struct PanickingProvider;

    impl ForecastProvider for PanickingProvider {
        fn forecast(&self, series: &TimeSeries, horizon: usize) -> ForecastResult {
            if series.len() > 1 {
                panic!("model exploded");
            }
            degraded_forecast(series, horizon, now())
        }
    }

    #[test]
    fn short_history_unit_gets_mean_forecast() {
        let sales = vec![
            SalesRecord::new(1, dec!(10), day(1)),
            SalesRecord::new(1, dec!(20), day(1)),
            SalesRecord::new(1, dec!(5), day(2)),
        ];

        let forecasts = agent().forecast_sales(&sales);
        let f = &forecasts[&UnitId::new(1)];

        assert_eq!(f.len(), 14);
        assert!(f.is_degraded());
        assert!(f.points().iter().all(|p| p.yhat == 17.5));
    }

    #[test]
    fn every_unit_is_forecast_with_full_horizon() {
        let mut sales = Vec::new();
        for unit in 1..=6i64 {
            for d in 0..(unit * 5) {
                sales.push(SalesRecord::new(unit, Decimal::from(10 + (d * unit) % 7), day(d)));
            }
        }

        let forecasts = agent().forecast_sales(&sales);
        assert_eq!(forecasts.len(), 6);
        for f in forecasts.values() {
            assert_eq!(f.len(), 14);
            for w in f.points().windows(2) {
                assert!(w[0].date < w[1].date);
            }
        }
    }

    #[test]
    fn inventory_only_unit_is_reported_with_zero_expected_sales() {
        let sink = Arc::new(RecordingSink::default());
        let agent = agent().with_alert_sink(sink.clone());

        let inventory = vec![InventorySnapshot::new(7, "antenna", 3).unwrap()];
        let report = agent.report(&[], &inventory);

        let entry = report.get(UnitId::new(7)).unwrap();
        assert!(entry.sales_forecast.is_empty());
        assert_eq!(entry.restock_suggestions.len(), 1);

        let s = &entry.restock_suggestions[0];
        assert_eq!(s.expected_sales, Decimal::ZERO);
        assert_eq!(s.safety_stock, 5);
        assert_eq!(s.status, RestockStatus::Low);
        assert_eq!(s.reorder_quantity, 2);

        let seen = sink.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].current_stock, 3);
        assert_eq!(seen[0].reorder_quantity, 2);
    }

    #[test]
    fn report_is_structurally_idempotent() {
        let mut sales = Vec::new();
        for d in 0..30 {
            sales.push(SalesRecord::new(1, Decimal::from(20 + d % 5), day(d)));
        }
        sales.push(SalesRecord::new(2, dec!(4), day(3)));
        let inventory = vec![
            InventorySnapshot::new(1, "modem", 40).unwrap(),
            InventorySnapshot::new(3, "cable", 2).unwrap(),
        ];

        let agent = agent();
        let a = agent.report(&sales, &inventory);
        let b = agent.report(&sales, &inventory);

        assert_eq!(a.unit_ids().collect::<Vec<_>>(), b.unit_ids().collect::<Vec<_>>());
        for (unit, entry) in a.iter() {
            let other = b.get(*unit).unwrap();
            assert_eq!(entry.restock_suggestions, other.restock_suggestions);
            assert_eq!(entry.sales_forecast.len(), other.sales_forecast.len());
        }
    }

    #[test]
    fn panicking_provider_degrades_single_unit() {
        let agent = ForecastAgent::new(PanickingProvider, AgentConfig::default().with_workers(1))
            .unwrap();
        let sales = vec![
            SalesRecord::new(1, dec!(3), day(0)),
            SalesRecord::new(1, dec!(5), day(1)),
            SalesRecord::new(2, dec!(8), day(0)),
        ];

        let forecasts = agent.forecast_sales(&sales);
        assert_eq!(forecasts.len(), 2);
        assert!(forecasts[&UnitId::new(1)].is_degraded());
        assert_eq!(forecasts[&UnitId::new(1)].points()[0].yhat, 4.0);
        assert_eq!(forecasts[&UnitId::new(2)].points()[0].yhat, 8.0);
    }

    #[test]
    fn zero_horizon_is_rejected() {
        let err = ForecastAgent::new(PanickingProvider, AgentConfig::default().with_forecast_days(0))
            .err()
            .unwrap();
        assert!(matches!(err, AgentError::InvalidConfig(_)));
    }
}
