//! Save/restore engine - orchestration layer
//!
//! Drives take-snapshot requests against an injected PV source and exposes
//! every consumer-facing operation as one command type with boundary logging.

pub mod commands;

pub use commands::engine_command::{apply_engine_command, EngineCommand, EngineCommandResult};
pub use commands::take_snapshot::SnapshotOrchestrator;
