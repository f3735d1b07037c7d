//! Repository layer over the SQLite schema
//!
//! Unit structs with associated functions, one per concern. All of them
//! accept a `Transaction` wherever a `&Connection` is asked for.

pub mod config_pv_registry;
pub mod hydration;
pub mod node_store;
pub mod snapshot_store;

pub use config_pv_registry::ConfigPvRegistry;
pub use node_store::NodeStore;
pub use snapshot_store::SnapshotStore;
