//! Command orchestration layer.
//!
//! Coordinates the core rules, the store and the PV source.

pub mod engine_command;
pub mod take_snapshot;
