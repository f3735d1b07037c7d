//! Save/restore store - SQLite persistence for the PV archive
//!
//! Provides:
//! - Connection setup (foreign keys, WAL, busy timeout)
//! - Embedded, checksummed schema migrations that seed the root folder
//! - The node tree store, the shared ConfigPv registry and the snapshot lifecycle
//!
//! Reads take `&Connection`. Mutations take `&mut Connection` and run in a
//! single `IMMEDIATE` transaction, so every structural change and its
//! timestamp propagation commit together.

pub mod db;
pub mod errors;
pub mod migrations;
pub mod repo;

// Re-export key types
pub use errors::Result;
pub use repo::{ConfigPvRegistry, NodeStore, SnapshotStore};
