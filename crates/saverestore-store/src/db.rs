//! Database connection management
//!
//! Provides utilities for opening, configuring and locking SQLite connections

use crate::errors::{from_rusqlite, Result};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::Path;
use std::time::Duration;

/// Open a SQLite database at the given path
pub fn open<P: AsRef<Path>>(path: P) -> Result<Connection> {
    Connection::open(path).map_err(from_rusqlite)
}

/// Open an in-memory SQLite database (for testing)
pub fn open_in_memory() -> Result<Connection> {
    Connection::open_in_memory().map_err(from_rusqlite)
}

/// Configure a connection for use by the store
///
/// Foreign keys on, WAL journal (in-memory databases keep `memory`), and a
/// bounded wait for the write lock.
pub fn configure(conn: &Connection, busy_timeout: Duration) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", true)
        .map_err(from_rusqlite)?;

    let _mode: String = conn
        .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
        .map_err(from_rusqlite)?;

    conn.busy_timeout(busy_timeout).map_err(from_rusqlite)?;

    Ok(())
}

/// Begin a write transaction that takes the database write lock up front
///
/// Checks made inside the transaction cannot race a concurrent writer.
pub fn immediate(conn: &mut Connection) -> Result<Transaction<'_>> {
    conn.transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(from_rusqlite)
}

/// Current wall-clock time in Unix milliseconds
pub(crate) fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Decode a stored millisecond timestamp
pub(crate) fn from_ms(ms: i64) -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::from_timestamp_millis(ms).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configure_file_database_uses_wal() {
        let dir = tempfile::TempDir::new().unwrap();
        let conn = open(dir.path().join("test.db")).unwrap();
        configure(&conn, Duration::from_millis(100)).unwrap();

        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");

        let fk: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk, 1);
    }

    #[test]
    fn test_from_ms_round_trip() {
        let ms = 1_700_000_000_123;
        assert_eq!(from_ms(ms).timestamp_millis(), ms);
    }
}
