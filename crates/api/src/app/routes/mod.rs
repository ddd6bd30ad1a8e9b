use axum::Router;

pub mod forecast;
pub mod system;

/// Router for the forecast endpoints.
pub fn router() -> Router {
    Router::new().nest("/forecast", forecast::router())
}
