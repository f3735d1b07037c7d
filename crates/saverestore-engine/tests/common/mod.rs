#![allow(dead_code)]

use rusqlite::Connection;
use saverestore_core::model::{ConfigPvDefinition, Configuration, NewConfiguration, NodeId};
use saverestore_core::pv_source::PvSource;
use saverestore_engine::SnapshotOrchestrator;
use saverestore_store::{db, migrations, NodeStore};
use std::sync::Arc;
use std::time::Duration;

pub fn setup_test_db() -> Connection {
    let mut conn = db::open_in_memory().unwrap();
    db::configure(&conn, Duration::from_secs(5)).unwrap();
    migrations::apply_migrations(&mut conn).unwrap();
    conn
}

pub fn orchestrator(source: impl PvSource + 'static) -> SnapshotOrchestrator {
    SnapshotOrchestrator::new(Arc::new(source), Duration::from_millis(200), 8)
}

pub fn configuration(
    conn: &mut Connection,
    name: &str,
    parent_id: NodeId,
    pv_names: &[&str],
) -> Configuration {
    NodeStore::create_configuration(
        conn,
        &NewConfiguration {
            name: name.to_string(),
            parent_id: Some(parent_id),
            pvs: pv_names.iter().map(|n| ConfigPvDefinition::new(*n)).collect(),
            ..NewConfiguration::default()
        },
    )
    .unwrap()
}
