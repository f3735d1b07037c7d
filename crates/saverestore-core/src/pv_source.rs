//! PV source adapter contract
//!
//! The live control-system client lives outside this workspace. The core only
//! sees a per-PV, timeout-bounded read that either yields a value or a
//! [`PvReadFailure`]. Implementations are constructed by the process and
//! handed to the snapshot orchestrator; nothing reaches them through globals.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::{ExError, ExErrorKind};

/// A single value read from a PV
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PvReading {
    pub value: serde_json::Value,
    #[serde(default)]
    pub severity: i32,
    #[serde(default)]
    pub status: i32,
    #[serde(default)]
    pub timestamp_seconds: i64,
    #[serde(default)]
    pub timestamp_nanos: i32,
    #[serde(default)]
    pub dtype: i32,
}

impl PvReading {
    pub fn new(value: serde_json::Value) -> Self {
        Self {
            value,
            severity: 0,
            status: 0,
            timestamp_seconds: 0,
            timestamp_nanos: 0,
            dtype: 0,
        }
    }
}

/// Why a single PV read did not produce a value
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PvReadFailure {
    #[error("PV '{pv_name}' is not connected")]
    Disconnected { pv_name: String },

    #[error("Timed out reading PV '{pv_name}' after {timeout_ms} ms")]
    Timeout { pv_name: String, timeout_ms: u64 },

    #[error("Failed to read PV '{pv_name}': {reason}")]
    Other { pv_name: String, reason: String },
}

impl PvReadFailure {
    pub fn pv_name(&self) -> &str {
        match self {
            PvReadFailure::Disconnected { pv_name }
            | PvReadFailure::Timeout { pv_name, .. }
            | PvReadFailure::Other { pv_name, .. } => pv_name,
        }
    }
}

impl From<PvReadFailure> for ExError {
    fn from(err: PvReadFailure) -> Self {
        ExError::new(ExErrorKind::ReadFailure)
            .with_entity_id(err.pv_name())
            .with_message(err.to_string())
    }
}

/// Reads live PV values
///
/// `read` must honour `timeout` and must never panic on an unreachable PV;
/// every failure is reported through [`PvReadFailure`].
#[async_trait]
pub trait PvSource: Send + Sync {
    async fn read(&self, pv_name: &str, timeout: Duration) -> Result<PvReading, PvReadFailure>;
}

/// A PV source answering from a fixed table of values
///
/// Used by the command-line front end (values loaded from a JSON file) and by
/// tests. Unknown PVs read as disconnected. Readings without a timestamp are
/// stamped with the time of the read.
#[derive(Debug, Clone, Default)]
pub struct StaticPvSource {
    readings: HashMap<String, PvReading>,
}

impl StaticPvSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reading(mut self, pv_name: impl Into<String>, reading: PvReading) -> Self {
        self.readings.insert(pv_name.into(), reading);
        self
    }

    pub fn with_value(self, pv_name: impl Into<String>, value: serde_json::Value) -> Self {
        self.with_reading(pv_name, PvReading::new(value))
    }

    /// Load a `{ "<pv name>": { "value": ..., "severity": ..., ... } }` table
    ///
    /// # Errors
    ///
    /// `Io` if the file cannot be read, `Serialization` if it is not a valid table.
    pub fn from_json_file(path: &Path) -> Result<Self, ExError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ExError::new(ExErrorKind::Io)
                .with_op("load_pv_values")
                .with_entity_id(path.display())
                .with_message(e.to_string())
        })?;
        let readings: HashMap<String, PvReading> =
            serde_json::from_str(&content).map_err(|e| {
                ExError::new(ExErrorKind::Serialization)
                    .with_op("load_pv_values")
                    .with_entity_id(path.display())
                    .with_message(e.to_string())
            })?;
        Ok(Self { readings })
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

#[async_trait]
impl PvSource for StaticPvSource {
    async fn read(&self, pv_name: &str, _timeout: Duration) -> Result<PvReading, PvReadFailure> {
        let mut reading =
            self.readings
                .get(pv_name)
                .cloned()
                .ok_or_else(|| PvReadFailure::Disconnected {
                    pv_name: pv_name.to_string(),
                })?;

        if reading.timestamp_seconds == 0 {
            let now = chrono::Utc::now();
            reading.timestamp_seconds = now.timestamp();
            reading.timestamp_nanos = now.timestamp_subsec_nanos() as i32;
        }
        Ok(reading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_static_source_unknown_pv_is_disconnected() {
        let source = StaticPvSource::new();
        let err = source
            .read("missing:pv", Duration::from_millis(10))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            PvReadFailure::Disconnected {
                pv_name: "missing:pv".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_static_source_stamps_missing_timestamp() {
        let source = StaticPvSource::new().with_value("a", serde_json::json!(1));
        let reading = source.read("a", Duration::from_millis(10)).await.unwrap();
        assert!(reading.timestamp_seconds > 0);
    }

    #[tokio::test]
    async fn test_static_source_keeps_explicit_timestamp() {
        let mut reading = PvReading::new(serde_json::json!("on"));
        reading.timestamp_seconds = 1_000;
        reading.timestamp_nanos = 5;
        let source = StaticPvSource::new().with_reading("b", reading.clone());
        assert_eq!(
            source.read("b", Duration::from_millis(10)).await.unwrap(),
            reading
        );
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"ring:current": {{"value": 401.2, "severity": 0, "dtype": 6}},
                 "ring:mode": {{"value": "top-up"}}}}"#
        )
        .unwrap();

        let source = StaticPvSource::from_json_file(file.path()).unwrap();
        assert_eq!(source.len(), 2);
    }

    #[test]
    fn test_from_json_file_rejects_garbage() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = StaticPvSource::from_json_file(file.path()).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Serialization);
    }

    #[test]
    fn test_read_failure_maps_to_read_failure_kind() {
        let err: ExError = PvReadFailure::Timeout {
            pv_name: "slow".to_string(),
            timeout_ms: 100,
        }
        .into();
        assert_eq!(err.kind(), ExErrorKind::ReadFailure);
        assert_eq!(err.entity_id(), Some("slow"));
    }
}
