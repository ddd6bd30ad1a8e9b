use axum::{http::StatusCode, response::IntoResponse, Json};

pub async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "service": "stockcast",
        "description": "sales forecast and restock API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": ["/forecast/sales", "/forecast/inventory", "/forecast/inventory-report"],
    }))
}

pub async fn health() -> StatusCode {
    StatusCode::OK
}
