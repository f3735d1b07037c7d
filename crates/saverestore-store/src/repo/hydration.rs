//! Hydration layer - row mappers from SQLite rows to domain models
//!
//! Each mapper expects the column list declared next to it, in that order.

use crate::db::from_ms;
use rusqlite::types::Type;
use rusqlite::Row;
use saverestore_core::model::{
    ConfigPv, FetchStatus, Node, NodeKind, Snapshot, SnapshotPv, SnapshotState,
};

pub const NODE_COLUMNS: &str = "id, name, parent_id, kind, last_modified";

pub const CONFIG_PV_COLUMNS: &str = "id, pv_name, group_name, tags, readonly";

pub const SNAPSHOT_COLUMNS: &str = "id, config_id, created, state, user_name, comment";

/// `snapshot_pv` joined with `config_pv` as `cp`
pub const SNAPSHOT_PV_COLUMNS: &str = "cp.id, cp.pv_name, cp.group_name, cp.tags, cp.readonly, \
     sp.value, sp.severity, sp.status, sp.time_sec, sp.time_ns, sp.dtype, sp.fetch_status";

fn invalid_text(index: usize, value: &str, what: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        index,
        Type::Text,
        format!("unknown {} '{}'", what, value).into(),
    )
}

pub fn node_from_row(row: &Row<'_>) -> rusqlite::Result<Node> {
    let kind: String = row.get(3)?;
    let kind = NodeKind::parse(&kind).ok_or_else(|| invalid_text(3, &kind, "node kind"))?;
    Ok(Node {
        id: row.get(0)?,
        name: row.get(1)?,
        parent_id: row.get(2)?,
        kind,
        last_modified: from_ms(row.get(4)?),
    })
}

pub fn config_pv_from_row(row: &Row<'_>) -> rusqlite::Result<ConfigPv> {
    config_pv_at(row, 0)
}

fn config_pv_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<ConfigPv> {
    Ok(ConfigPv {
        id: row.get(offset)?,
        pv_name: row.get(offset + 1)?,
        group_name: row.get(offset + 2)?,
        tags: row.get(offset + 3)?,
        readonly: row.get(offset + 4)?,
    })
}

/// Snapshot header; values are loaded separately
pub fn snapshot_from_row(row: &Row<'_>) -> rusqlite::Result<Snapshot> {
    let state: String = row.get(3)?;
    let state =
        SnapshotState::parse(&state).ok_or_else(|| invalid_text(3, &state, "snapshot state"))?;
    Ok(Snapshot {
        id: row.get(0)?,
        config_id: row.get(1)?,
        created: from_ms(row.get(2)?),
        state,
        user_name: row.get(4)?,
        comment: row.get(5)?,
        values: Vec::new(),
    })
}

pub fn snapshot_pv_from_row(row: &Row<'_>) -> rusqlite::Result<SnapshotPv> {
    let config_pv = config_pv_at(row, 0)?;

    let raw: String = row.get(5)?;
    let value = serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;

    let fetch_status: String = row.get(11)?;
    let fetch_status = match fetch_status.as_str() {
        "succeeded" => FetchStatus::Succeeded,
        "failed" => FetchStatus::Failed,
        other => return Err(invalid_text(11, other, "fetch status")),
    };

    Ok(SnapshotPv {
        config_pv,
        value,
        severity: row.get(6)?,
        status: row.get(7)?,
        time_sec: row.get(8)?,
        time_ns: row.get(9)?,
        dtype: row.get(10)?,
        fetch_status,
    })
}

/// Column value for a fetch status
pub fn fetch_status_str(status: FetchStatus) -> &'static str {
    match status {
        FetchStatus::Succeeded => "succeeded",
        FetchStatus::Failed => "failed",
    }
}
