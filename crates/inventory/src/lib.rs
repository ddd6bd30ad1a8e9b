//! Inventory domain module.
//!
//! Current stock per (unit, product) as read from storage at query time. The
//! snapshot is mutated externally between queries; this crate only models it.

pub mod snapshot;

pub use snapshot::{InventorySnapshot, group_by_unit};
