//! Take-snapshot orchestration
//!
//! Resolves a configuration's PV list, reads every PV through the injected
//! [`PvSource`], and hands the result to the snapshot store as a preliminary
//! snapshot.
//!
//! ## Read policy
//! - One spawned task per PV, at most `max_concurrent_reads` in flight
//! - Each read is bounded by `read_timeout`, measured from when it starts
//! - A failed, timed-out or panicked read becomes a `Failed` row for that PV
//!   only; the snapshot is still taken
//! - Tasks are detached: if the caller goes away, reads already issued run
//!   to completion or timeout
//! - Rows come back in configuration order regardless of completion order
//! - A capture rejected because the PV list moved underneath the reads is
//!   retried against the fresh list

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use rusqlite::Connection;
use saverestore_core::errors::ExErrorKind;
use saverestore_core::model::{ConfigPv, NodeId, Snapshot, SnapshotPv};
use saverestore_core::pv_source::{PvReadFailure, PvReading, PvSource};
use saverestore_core::settings::Settings;
use saverestore_store::errors::Result;
use saverestore_store::{NodeStore, SnapshotStore};
use tokio::sync::Semaphore;

/// Reads-and-capture rounds for one request before a changing PV list is reported
pub const MAX_CAPTURE_ATTEMPTS: u32 = 3;

/// Drives take-snapshot requests against one PV source
#[derive(Clone)]
pub struct SnapshotOrchestrator {
    source: Arc<dyn PvSource>,
    read_timeout: Duration,
    max_concurrent_reads: usize,
}

impl SnapshotOrchestrator {
    /// `max_concurrent_reads` is clamped to at least one
    pub fn new(
        source: Arc<dyn PvSource>,
        read_timeout: Duration,
        max_concurrent_reads: usize,
    ) -> Self {
        Self {
            source,
            read_timeout,
            max_concurrent_reads: max_concurrent_reads.max(1),
        }
    }

    pub fn from_settings(source: Arc<dyn PvSource>, settings: &Settings) -> Self {
        Self::new(
            source,
            settings.pv_read_timeout(),
            settings.max_concurrent_reads,
        )
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Capture the current values of a configuration as a preliminary snapshot
    ///
    /// Fails with `NotFound` if `config_id` is not a configuration. Individual
    /// read failures never fail the call. If the PV list changes while reads
    /// are in flight, the list is resolved again and read again, up to
    /// [`MAX_CAPTURE_ATTEMPTS`] times in total.
    pub async fn take_snapshot(
        &self,
        conn: &mut Connection,
        config_id: NodeId,
    ) -> Result<Snapshot> {
        const OP: &str = "take_snapshot";
        let mut attempt = 1;
        loop {
            let config = NodeStore::get_configuration(conn, config_id).map_err(|e| e.with_op(OP))?;
            let values = self.read_all(&config.pvs).await;

            match SnapshotStore::capture(conn, config_id, &values) {
                Ok(snapshot) => {
                    tracing::debug!(
                        snapshot_id = snapshot.id,
                        config_id,
                        attempt,
                        pv_count = snapshot.values.len(),
                        failed_count = snapshot.failed_count(),
                        "took snapshot"
                    );
                    return Ok(snapshot);
                }
                Err(e)
                    if e.kind() == ExErrorKind::InvalidArgument
                        && attempt < MAX_CAPTURE_ATTEMPTS =>
                {
                    tracing::warn!(config_id, attempt, "PV list changed during read, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e.or_op(OP)),
            }
        }
    }

    /// Read every PV, one row per PV in input order
    pub async fn read_all(&self, pvs: &[ConfigPv]) -> Vec<SnapshotPv> {
        let permits = Arc::new(Semaphore::new(self.max_concurrent_reads));

        let handles: Vec<_> = pvs
            .iter()
            .map(|pv| {
                let source = Arc::clone(&self.source);
                let permits = Arc::clone(&permits);
                let pv_name = pv.pv_name.clone();
                let timeout = self.read_timeout;
                tokio::spawn(async move {
                    // The semaphore is never closed
                    let _permit = permits.acquire_owned().await.ok();
                    read_one(source.as_ref(), &pv_name, timeout).await
                })
            })
            .collect();

        join_all(handles)
            .await
            .into_iter()
            .zip(pvs)
            .map(|(joined, pv)| {
                let outcome = joined.unwrap_or_else(|join_err| {
                    Err(PvReadFailure::Other {
                        pv_name: pv.pv_name.clone(),
                        reason: format!("read task failed: {}", join_err),
                    })
                });
                match outcome {
                    Ok(reading) => SnapshotPv::from_reading(pv.clone(), reading),
                    Err(failure) => {
                        tracing::warn!(pv_name = %pv.pv_name, reason = %failure, "PV read failed");
                        SnapshotPv::failed(pv.clone())
                    }
                }
            })
            .collect()
    }
}

async fn read_one(
    source: &dyn PvSource,
    pv_name: &str,
    timeout: Duration,
) -> std::result::Result<PvReading, PvReadFailure> {
    match tokio::time::timeout(timeout, source.read(pv_name, timeout)).await {
        Ok(outcome) => outcome,
        Err(_) => Err(PvReadFailure::Timeout {
            pv_name: pv_name.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        }),
    }
}
