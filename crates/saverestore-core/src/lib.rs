//! Save/restore core - domain model and rules for the PV archive
//!
//! This crate holds everything the archive agrees on before touching storage:
//! - Folder / Configuration tree nodes, shared ConfigPv definitions, snapshots
//! - The sibling name-clash predicate and input validation
//! - The canonical error facility (`ExError`) and domain errors
//! - The structured logging facility
//! - The PV source contract consumed by the snapshot orchestrator
//! - Process settings

pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod pv_source;
pub mod rules;
pub mod settings;

// Re-export commonly used types
pub use errors::{ExError, ExErrorKind, Result, SaveRestoreError};
pub use model::{
    ConfigPv, ConfigPvDefinition, Configuration, ConfigurationUpdate, FetchStatus, Folder,
    NewConfiguration, Node, NodeId, NodeKind, Snapshot, SnapshotId, SnapshotPv, SnapshotState,
    ROOT_NODE_ID,
};
pub use pv_source::{PvReadFailure, PvReading, PvSource, StaticPvSource};
pub use settings::Settings;
