//! HTTP API: routing, service wiring and error mapping.

pub mod app;
