//! Error handling for saverestore-store
//!
//! Maps SQLite failures onto the canonical `ExError` taxonomy

use rusqlite::ErrorCode;
use saverestore_core::errors::{ExError, ExErrorKind};

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create a migration error
pub fn migration_error(migration_id: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("migration")
        .with_message(format!("Migration {} failed: {}", migration_id, reason))
}

/// Create a checksum mismatch error for an already-applied migration
pub fn checksum_mismatch(migration_id: &str, expected: &str, actual: &str) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("migration_checksum")
        .with_entity_id(migration_id)
        .with_message(format!(
            "Checksum mismatch for migration {}: recorded {}, embedded {}",
            migration_id, expected, actual
        ))
}

/// Create a store error from rusqlite::Error
///
/// A UNIQUE violation means a concurrent writer won a name-clash race and is
/// reported as `InvalidArgument`; lock contention past the busy timeout is
/// `Timeout`. Everything else is `Persistence`.
pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    let kind = match err.sqlite_error_code() {
        Some(ErrorCode::ConstraintViolation) if is_unique_violation(&err) => {
            ExErrorKind::InvalidArgument
        }
        Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => ExErrorKind::Timeout,
        _ => ExErrorKind::Persistence,
    };
    ExError::new(kind)
        .with_op("sqlite")
        .with_message(err.to_string())
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => {
            e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        }
        _ => false,
    }
}

/// Create a serialization error for a stored PV value
pub fn value_codec_error(op: &str, err: serde_json::Error) -> ExError {
    ExError::new(ExErrorKind::Serialization)
        .with_op(op)
        .with_message(err.to_string())
}
