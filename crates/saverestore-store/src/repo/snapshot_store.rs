//! Snapshot lifecycle
//!
//! `preliminary` → `committed`, and either state → deleted. Values are
//! written once by [`SnapshotStore::capture`] and never updated; commit only
//! stamps user and comment. Only committed snapshots are visible to the
//! listing and detail reads.

use crate::db::{self, now_ms};
use crate::errors::{from_rusqlite, value_codec_error, Result};
use crate::repo::config_pv_registry::ConfigPvRegistry;
use crate::repo::hydration::{
    fetch_status_str, snapshot_from_row, snapshot_pv_from_row, SNAPSHOT_COLUMNS,
    SNAPSHOT_PV_COLUMNS,
};
use crate::repo::node_store::NodeStore;
use rusqlite::{params, Connection, OptionalExtension};
use saverestore_core::errors::{ExError, SaveRestoreError};
use saverestore_core::model::{ConfigPvId, NodeId, Snapshot, SnapshotId, SnapshotPv, SnapshotState};
use saverestore_core::rules;

pub struct SnapshotStore;

impl SnapshotStore {
    /// Persist a new preliminary snapshot of `config_id` with the given values
    ///
    /// `values` must hold one row per PV of the configuration as it stands
    /// when the write lock is taken, in configuration order; otherwise the
    /// call fails with `InvalidArgument` and nothing is written. The returned
    /// snapshot carries its values: this is the only read path for
    /// preliminary data.
    pub fn capture(
        conn: &mut Connection,
        config_id: NodeId,
        values: &[SnapshotPv],
    ) -> Result<Snapshot> {
        const OP: &str = "capture";
        let tx = db::immediate(conn)?;
        let config = NodeStore::get_configuration(&tx, config_id).map_err(|e| e.with_op(OP))?;
        rules::ensure_values_match(config_id, &config.pvs, values)
            .map_err(|e| ExError::from(e).with_op(OP))?;

        tx.execute(
            "INSERT INTO snapshot (config_id, created, state) VALUES (?1, ?2, ?3)",
            params![config_id, now_ms(), SnapshotState::Preliminary.as_str()],
        )
        .map_err(from_rusqlite)?;
        let snapshot_id = tx.last_insert_rowid();

        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO snapshot_pv (snapshot_id, config_pv_id, position, value,
                        severity, status, time_sec, time_ns, dtype, fetch_status)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                )
                .map_err(from_rusqlite)?;
            for (position, pv) in values.iter().enumerate() {
                let value =
                    serde_json::to_string(&pv.value).map_err(|e| value_codec_error(OP, e))?;
                stmt.execute(params![
                    snapshot_id,
                    pv.config_pv.id,
                    position as i64,
                    value,
                    pv.severity,
                    pv.status,
                    pv.time_sec,
                    pv.time_ns,
                    pv.dtype,
                    fetch_status_str(pv.fetch_status),
                ])
                .map_err(from_rusqlite)?;
            }
        }

        let snapshot =
            Self::load(&tx, snapshot_id, true)?.ok_or_else(|| not_found(OP, snapshot_id))?;
        tx.commit().map_err(from_rusqlite)?;

        tracing::debug!(
            snapshot_id,
            config_id,
            pv_count = snapshot.values.len(),
            failed_count = snapshot.failed_count(),
            "captured preliminary snapshot"
        );
        Ok(snapshot)
    }

    /// Commit a preliminary snapshot with the committing user and a comment
    ///
    /// A snapshot is committed at most once; a second commit is rejected and
    /// leaves the stored user and comment untouched.
    pub fn commit(
        conn: &mut Connection,
        snapshot_id: SnapshotId,
        user_name: Option<&str>,
        comment: Option<&str>,
    ) -> Result<Snapshot> {
        const OP: &str = "commit";
        let tx = db::immediate(conn)?;
        let current = Self::load(&tx, snapshot_id, false)?
            .ok_or_else(|| not_found(OP, snapshot_id))?;

        let (user_name, comment) = rules::validate_commit_fields(user_name, comment)
            .map_err(|e| ExError::from(e).with_op(OP))?;
        if current.is_committed() {
            return Err(ExError::from(SaveRestoreError::SnapshotAlreadyCommitted { snapshot_id })
                .with_op(OP));
        }

        tx.execute(
            "UPDATE snapshot SET state = ?1, user_name = ?2, comment = ?3 WHERE id = ?4",
            params![
                SnapshotState::Committed.as_str(),
                user_name,
                comment,
                snapshot_id
            ],
        )
        .map_err(from_rusqlite)?;

        let committed =
            Self::load(&tx, snapshot_id, true)?.ok_or_else(|| not_found(OP, snapshot_id))?;
        tx.commit().map_err(from_rusqlite)?;

        tracing::debug!(snapshot_id, "committed snapshot");
        Ok(committed)
    }

    /// A committed snapshot, optionally with its values
    ///
    /// Fails with `NotFound` if no such snapshot exists; a preliminary
    /// snapshot reads as `None`.
    pub fn get_snapshot(
        conn: &Connection,
        snapshot_id: SnapshotId,
        include_values: bool,
    ) -> Result<Option<Snapshot>> {
        let snapshot = Self::load(conn, snapshot_id, include_values)?
            .ok_or_else(|| not_found("get_snapshot", snapshot_id))?;
        Ok(snapshot.is_committed().then_some(snapshot))
    }

    /// Committed snapshots of a configuration, oldest first, without values
    ///
    /// An unknown configuration lists as empty.
    pub fn list_snapshots(conn: &Connection, config_id: NodeId) -> Result<Vec<Snapshot>> {
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM snapshot WHERE config_id = ?1 AND state = ?2 ORDER BY id",
                SNAPSHOT_COLUMNS
            ))
            .map_err(from_rusqlite)?;
        let snapshots = stmt
            .query_map(
                params![config_id, SnapshotState::Committed.as_str()],
                snapshot_from_row,
            )
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;
        Ok(snapshots)
    }

    /// Values of a committed snapshot; empty while preliminary
    pub fn get_snapshot_pv_values(
        conn: &Connection,
        snapshot_id: SnapshotId,
    ) -> Result<Vec<SnapshotPv>> {
        let snapshot = Self::get_snapshot(conn, snapshot_id, true)
            .map_err(|e| e.with_op("get_snapshot_pv_values"))?;
        Ok(snapshot.map(|s| s.values).unwrap_or_default())
    }

    /// Remove a snapshot and its values, in either state
    ///
    /// PV definitions only kept alive by this snapshot's values are removed.
    pub fn delete_snapshot(conn: &mut Connection, snapshot_id: SnapshotId) -> Result<()> {
        const OP: &str = "delete_snapshot";
        let tx = db::immediate(conn)?;
        if Self::load(&tx, snapshot_id, false)?.is_none() {
            return Err(not_found(OP, snapshot_id));
        }

        let referenced: Vec<ConfigPvId> = {
            let mut stmt = tx
                .prepare("SELECT DISTINCT config_pv_id FROM snapshot_pv WHERE snapshot_id = ?1")
                .map_err(from_rusqlite)?;
            let ids = stmt
                .query_map([snapshot_id], |row| row.get(0))
                .map_err(from_rusqlite)?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(from_rusqlite)?;
            ids
        };

        tx.execute(
            "DELETE FROM snapshot_pv WHERE snapshot_id = ?1",
            [snapshot_id],
        )
        .map_err(from_rusqlite)?;
        tx.execute("DELETE FROM snapshot WHERE id = ?1", [snapshot_id])
            .map_err(from_rusqlite)?;
        for config_pv_id in referenced {
            ConfigPvRegistry::release(&tx, config_pv_id)?;
        }
        tx.commit().map_err(from_rusqlite)?;

        tracing::debug!(snapshot_id, "deleted snapshot");
        Ok(())
    }

    /// Load a snapshot in any state
    fn load(
        conn: &Connection,
        snapshot_id: SnapshotId,
        include_values: bool,
    ) -> Result<Option<Snapshot>> {
        let snapshot = conn
            .query_row(
                &format!("SELECT {} FROM snapshot WHERE id = ?1", SNAPSHOT_COLUMNS),
                [snapshot_id],
                snapshot_from_row,
            )
            .optional()
            .map_err(from_rusqlite)?;

        let Some(mut snapshot) = snapshot else {
            return Ok(None);
        };
        if include_values {
            snapshot.values = Self::values(conn, snapshot_id)?;
        }
        Ok(Some(snapshot))
    }

    fn values(conn: &Connection, snapshot_id: SnapshotId) -> Result<Vec<SnapshotPv>> {
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM snapshot_pv sp
                 JOIN config_pv cp ON cp.id = sp.config_pv_id
                 WHERE sp.snapshot_id = ?1
                 ORDER BY sp.position",
                SNAPSHOT_PV_COLUMNS
            ))
            .map_err(from_rusqlite)?;
        let values = stmt
            .query_map([snapshot_id], snapshot_pv_from_row)
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;
        Ok(values)
    }
}

fn not_found(op: &str, snapshot_id: SnapshotId) -> ExError {
    ExError::from(SaveRestoreError::SnapshotNotFound { snapshot_id }).with_op(op)
}
