//! Request-level entry points: fetch from the sources, then run the CPU-bound
//! pipeline off the async runtime.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{error, instrument};

use stockcast_core::UnitId;
use stockcast_forecast::{
    ForecastAgent, ForecastProvider, ForecastResult, GuardedForecaster, Report, RestockSuggestion,
    SeasonalTrendModel,
};

use crate::sources::{DataAccessError, InventorySource, SalesSource};

/// Provider used by the server binary.
pub type DefaultProvider = GuardedForecaster<SeasonalTrendModel>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Data(#[from] DataAccessError),

    #[error("forecast worker failed: {0}")]
    Worker(String),
}

pub struct ForecastService<P = DefaultProvider> {
    sales: Arc<dyn SalesSource>,
    inventory: Arc<dyn InventorySource>,
    agent: Arc<ForecastAgent<P>>,
}

impl<P> Clone for ForecastService<P> {
    fn clone(&self) -> Self {
        Self {
            sales: self.sales.clone(),
            inventory: self.inventory.clone(),
            agent: self.agent.clone(),
        }
    }
}

impl<P> ForecastService<P>
where
    P: ForecastProvider + 'static,
{
    pub fn new(
        sales: Arc<dyn SalesSource>,
        inventory: Arc<dyn InventorySource>,
        agent: ForecastAgent<P>,
    ) -> Self {
        Self {
            sales,
            inventory,
            agent: Arc::new(agent),
        }
    }

    pub fn agent(&self) -> &ForecastAgent<P> {
        &self.agent
    }

    /// Per-unit sales forecasts for every unit with sales history.
    #[instrument(skip(self), err)]
    pub async fn get_sales_forecast(
        &self,
    ) -> Result<BTreeMap<UnitId, ForecastResult>, ServiceError> {
        let sales = self.sales.fetch_sales().await?;
        let agent = self.agent.clone();
        run_blocking(move || agent.forecast_sales(&sales)).await
    }

    /// Restock suggestions for every unit with inventory rows.
    #[instrument(skip(self), err)]
    pub async fn get_restock_suggestions(
        &self,
    ) -> Result<BTreeMap<UnitId, Vec<RestockSuggestion>>, ServiceError> {
        let (sales, inventory) =
            tokio::try_join!(self.sales.fetch_sales(), self.inventory.fetch_inventory())?;
        let agent = self.agent.clone();
        run_blocking(move || {
            let forecasts = agent.forecast_sales(&sales);
            agent.restock_suggestions(&forecasts, &inventory)
        })
        .await
    }

    /// Combined report over the union of units seen in sales and inventory.
    #[instrument(skip(self), err)]
    pub async fn get_report(&self) -> Result<Report, ServiceError> {
        let (sales, inventory) =
            tokio::try_join!(self.sales.fetch_sales(), self.inventory.fetch_inventory())?;
        let agent = self.agent.clone();
        run_blocking(move || agent.report(&sales, &inventory)).await
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T, ServiceError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!(error = %e, "forecast worker task failed");
        ServiceError::Worker(e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::InMemoryAlertSink;
    use crate::sources::{InMemoryInventory, InMemorySales};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use stockcast_forecast::{AgentConfig, RestockStatus};
    use stockcast_inventory::InventorySnapshot;
    use stockcast_sales::{SalesRecord, TimeSeries};

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(n)
    }

    fn agent() -> ForecastAgent<DefaultProvider> {
        ForecastAgent::new(
            GuardedForecaster::new(SeasonalTrendModel::new()).with_clock(fixed_now),
            AgentConfig::default().with_workers(2),
        )
        .unwrap()
    }

    struct DownSource;

    #[async_trait::async_trait]
    impl SalesSource for DownSource {
        async fn fetch_sales(&self) -> Result<Vec<SalesRecord>, DataAccessError> {
            Err(DataAccessError::Unavailable("connection refused".to_string()))
        }
    }

    struct EmptyProvider;

    impl ForecastProvider for EmptyProvider {
        fn forecast(&self, _series: &TimeSeries, _horizon: usize) -> ForecastResult {
            ForecastResult::empty()
        }
    }

    #[tokio::test]
    async fn sales_forecast_covers_units_with_sales() {
        let sales = Arc::new(InMemorySales::new(vec![
            SalesRecord::new(1, dec!(10), day(1)),
            SalesRecord::new(1, dec!(20), day(1)),
            SalesRecord::new(1, dec!(5), day(2)),
            SalesRecord::new(2, dec!(3), day(1)),
        ]));
        let service = ForecastService::new(sales, Arc::new(InMemoryInventory::default()), agent());

        let forecasts = service.get_sales_forecast().await.unwrap();
        assert_eq!(forecasts.len(), 2);
        let unit1 = &forecasts[&UnitId::new(1)];
        assert_eq!(unit1.len(), 14);
        assert!(unit1.points().iter().all(|p| p.yhat == 17.5));
        assert_eq!(unit1.points()[0].date, fixed_now());
    }

    #[tokio::test]
    async fn restock_low_stock_raises_one_alert() {
        let sink = Arc::new(InMemoryAlertSink::new());
        let inventory = Arc::new(InMemoryInventory::new(vec![
            InventorySnapshot::new(1, "modem", 3).unwrap(),
            InventorySnapshot::new(1, "antenna", 50).unwrap(),
        ]));
        let service = ForecastService::new(
            Arc::new(InMemorySales::default()),
            inventory,
            agent().with_alert_sink(sink.clone()),
        );

        let suggestions = service.get_restock_suggestions().await.unwrap();
        let unit = &suggestions[&UnitId::new(1)];
        assert_eq!(unit.len(), 2);
        assert_eq!(unit[0].status, RestockStatus::Low);
        assert_eq!(unit[0].reorder_quantity, 2);
        assert_eq!(unit[1].status, RestockStatus::Ok);
        assert_eq!(unit[1].reorder_quantity, 0);

        let alerts = sink.all();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].product_name, "modem");
    }

    #[tokio::test]
    async fn report_is_union_of_sales_and_inventory_units() {
        let mut rows = Vec::new();
        for d in 0..21 {
            rows.push(SalesRecord::new(1, Decimal::from(30 + d % 4), day(d)));
        }
        let sales = Arc::new(InMemorySales::new(rows));
        let inventory = Arc::new(InMemoryInventory::new(vec![
            InventorySnapshot::new(1, "modem", 500).unwrap(),
            InventorySnapshot::new(9, "cable", 0).unwrap(),
        ]));
        let service = ForecastService::new(sales, inventory, agent());

        let report = service.get_report().await.unwrap();
        assert_eq!(report.unit_ids().collect::<Vec<_>>(), vec![UnitId::new(1), UnitId::new(9)]);

        let unit1 = report.get(UnitId::new(1)).unwrap();
        assert_eq!(unit1.sales_forecast.len(), 14);
        assert!(!unit1.sales_forecast.is_degraded());
        assert_eq!(unit1.restock_suggestions[0].status, RestockStatus::Ok);

        let unit9 = report.get(UnitId::new(9)).unwrap();
        assert!(unit9.sales_forecast.is_empty());
        assert_eq!(unit9.restock_suggestions[0].status, RestockStatus::Low);
    }

    #[tokio::test]
    async fn fetch_failure_surfaces_without_partial_report() {
        let service = ForecastService::new(
            Arc::new(DownSource),
            Arc::new(InMemoryInventory::default()),
            agent(),
        );

        let err = service.get_report().await.unwrap_err();
        assert!(matches!(err, ServiceError::Data(DataAccessError::Unavailable(_))));
        assert!(service.get_sales_forecast().await.is_err());
    }

    #[tokio::test]
    async fn custom_provider_is_used() {
        let agent = ForecastAgent::new(EmptyProvider, AgentConfig::default().with_workers(1)).unwrap();
        let sales = Arc::new(InMemorySales::new(vec![SalesRecord::new(4, dec!(1), day(0))]));
        let service = ForecastService::new(sales, Arc::new(InMemoryInventory::default()), agent);

        let forecasts = service.get_sales_forecast().await.unwrap();
        assert!(forecasts[&UnitId::new(4)].is_empty());
    }
}
