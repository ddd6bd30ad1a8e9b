use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use stockcast_infra::{DataAccessError, ServiceError};

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::Data(DataAccessError::Unavailable(msg)) => {
            json_error(StatusCode::SERVICE_UNAVAILABLE, "data_unavailable", msg)
        }
        ServiceError::Data(DataAccessError::Malformed(msg)) => {
            json_error(StatusCode::BAD_GATEWAY, "malformed_data", msg)
        }
        ServiceError::Worker(msg) => json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
