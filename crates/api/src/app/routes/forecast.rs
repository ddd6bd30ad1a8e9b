use std::sync::Arc;

use axum::{
    extract::Extension,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/sales", get(sales_forecast))
        .route("/inventory", get(restock_suggestions))
        .route("/inventory-report", get(inventory_report))
}

/// `{unit_id: [ForecastPoint]}` for every unit with sales history.
pub async fn sales_forecast(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.forecast.get_sales_forecast().await {
        Ok(forecasts) => Json(forecasts).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// `{unit_id: [RestockSuggestion]}` for every unit with inventory rows.
pub async fn restock_suggestions(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.forecast.get_restock_suggestions().await {
        Ok(suggestions) => Json(suggestions).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn inventory_report(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.forecast.get_report().await {
        Ok(report) => Json(report).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
