//! Migration framework
//!
//! Provides:
//! - Migration runner with checksum verification
//! - Idempotent application, one transaction per migration
//! - Embedded SQL migrations

mod checksums;
mod embedded;
mod runner;

pub use runner::{applied_migrations, apply_migrations};
