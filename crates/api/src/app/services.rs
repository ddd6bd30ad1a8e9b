//! Infrastructure wiring for the server: sources, agent, alert dispatcher.

use std::sync::Arc;

use stockcast_forecast::{AgentError, AlertError, ForecastAgent, GuardedForecaster, SeasonalTrendModel};
use stockcast_infra::{
    AppConfig, ChannelAlertSink, ChannelAlertSinkHandle, CsvSource, DataAccessError,
    ForecastService, InMemoryInventory, InMemorySales, InventorySource, LogAlertSink,
    PostgresSource, SalesSource,
};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Data(#[from] DataAccessError),

    #[error("failed to start alert dispatcher: {0}")]
    Alerts(#[from] AlertError),

    #[error(transparent)]
    Agent(#[from] AgentError),
}

/// Shared request-side state.
pub struct AppServices {
    pub forecast: ForecastService,
}

impl AppServices {
    pub fn new(forecast: ForecastService) -> Self {
        Self { forecast }
    }
}

/// Sources by precedence: Postgres (`database_url`), CSV files, empty in-memory.
async fn build_sources(
    config: &AppConfig,
) -> Result<(Arc<dyn SalesSource>, Arc<dyn InventorySource>), DataAccessError> {
    if let Some(url) = &config.database_url {
        let pg = Arc::new(PostgresSource::connect(url).await?);
        tracing::info!("using postgres data source");
        let sales: Arc<dyn SalesSource> = pg.clone();
        let inventory: Arc<dyn InventorySource> = pg;
        return Ok((sales, inventory));
    }

    if config.sales_csv.is_some() || config.inventory_csv.is_some() {
        let mut csv = CsvSource::new();
        if let Some(path) = &config.sales_csv {
            csv = csv.with_sales(path);
        }
        if let Some(path) = &config.inventory_csv {
            csv = csv.with_inventory(path);
        }
        tracing::info!(
            sales_csv = ?config.sales_csv,
            inventory_csv = ?config.inventory_csv,
            "using csv data source"
        );
        let csv = Arc::new(csv);
        let sales: Arc<dyn SalesSource> = csv.clone();
        let inventory: Arc<dyn InventorySource> = csv;
        return Ok((sales, inventory));
    }

    tracing::warn!("no database_url or csv paths configured; serving empty in-memory data");
    let sales: Arc<dyn SalesSource> = Arc::new(InMemorySales::default());
    let inventory: Arc<dyn InventorySource> = Arc::new(InMemoryInventory::default());
    Ok((sales, inventory))
}

/// Wire the server. The returned handle must be shut down after the server stops
/// so queued alerts are delivered.
pub async fn build_services(
    config: &AppConfig,
) -> Result<(AppServices, ChannelAlertSinkHandle), StartupError> {
    let (sales, inventory) = build_sources(config).await?;
    let (alerts, alerts_handle) =
        ChannelAlertSink::spawn(Arc::new(LogAlertSink), config.alert_queue_capacity)?;

    let agent = ForecastAgent::new(
        GuardedForecaster::new(SeasonalTrendModel::new()),
        config.agent_config(),
    )?
    .with_alert_sink(Arc::new(alerts));

    tracing::info!(workers = agent.workers(), "forecast agent ready");

    Ok((
        AppServices::new(ForecastService::new(sales, inventory, agent)),
        alerts_handle,
    ))
}
