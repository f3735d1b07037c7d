use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::config_pv::ConfigPv;
use super::node::NodeId;
use crate::pv_source::PvReading;

pub type SnapshotId = i64;

/// Alarm severity recorded for a PV that could not be read (EPICS `INVALID`)
pub const SEVERITY_INVALID: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotState {
    /// Captured but not yet committed; invisible to listing and detail reads
    Preliminary,
    Committed,
}

impl SnapshotState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotState::Preliminary => "preliminary",
            SnapshotState::Committed => "committed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "preliminary" => Some(SnapshotState::Preliminary),
            "committed" => Some(SnapshotState::Committed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStatus {
    Succeeded,
    Failed,
}

impl FetchStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchStatus::Succeeded)
    }
}

/// One captured PV value within a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotPv {
    pub config_pv: ConfigPv,
    /// Opaque typed payload as produced by the PV source
    pub value: serde_json::Value,
    pub severity: i32,
    pub status: i32,
    pub time_sec: i64,
    pub time_ns: i32,
    pub dtype: i32,
    pub fetch_status: FetchStatus,
}

impl SnapshotPv {
    pub fn from_reading(config_pv: ConfigPv, reading: PvReading) -> Self {
        Self {
            config_pv,
            value: reading.value,
            severity: reading.severity,
            status: reading.status,
            time_sec: reading.timestamp_seconds,
            time_ns: reading.timestamp_nanos,
            dtype: reading.dtype,
            fetch_status: FetchStatus::Succeeded,
        }
    }

    /// Placeholder row for a PV whose read failed
    pub fn failed(config_pv: ConfigPv) -> Self {
        Self {
            config_pv,
            value: serde_json::Value::Null,
            severity: SEVERITY_INVALID,
            status: 0,
            time_sec: 0,
            time_ns: 0,
            dtype: 0,
            fetch_status: FetchStatus::Failed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: SnapshotId,
    pub config_id: NodeId,
    pub created: DateTime<Utc>,
    pub state: SnapshotState,
    /// Set on commit
    pub user_name: Option<String>,
    /// Set on commit
    pub comment: Option<String>,
    /// Empty when the snapshot was read without values
    pub values: Vec<SnapshotPv>,
}

impl Snapshot {
    pub fn is_committed(&self) -> bool {
        self.state == SnapshotState::Committed
    }

    pub fn failed_count(&self) -> usize {
        self.values
            .iter()
            .filter(|v| !v.fetch_status.is_success())
            .count()
    }
}
