//! Tracing/logging setup shared by binaries and integration tests.

/// Initialize process-wide logging.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    tracing::init(DEFAULT_FILTER);
}

const DEFAULT_FILTER: &str = "info";

/// Subscriber configuration (filters, formatting).
pub mod tracing;
