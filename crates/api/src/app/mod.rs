//! Axum application wiring.
//!
//! - `services.rs`: data sources, forecast agent and alert dispatcher
//! - `routes/`: HTTP routes + handlers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::limit::GlobalConcurrencyLimitLayer;

pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router (used by `main.rs` and the black-box tests).
///
/// `max_concurrent_requests` bounds in-flight requests across all routes;
/// `Router::layer` clones the layer per route, so the semaphore must be shared.
pub fn build_app(services: Arc<AppServices>, max_concurrent_requests: usize) -> Router {
    Router::new()
        .route("/", get(routes::system::root))
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(Extension(services))
        .layer(GlobalConcurrencyLimitLayer::new(max_concurrent_requests.max(1)))
}
