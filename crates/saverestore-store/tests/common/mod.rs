#![allow(dead_code)]

use rusqlite::Connection;
use saverestore_core::model::{
    ConfigPvDefinition, Configuration, ConfigurationUpdate, Folder, NewConfiguration, NodeId,
    SnapshotPv,
};
use saverestore_core::pv_source::PvReading;
use saverestore_store::{db, migrations, NodeStore};
use std::time::Duration;

pub fn setup_test_db() -> Connection {
    let mut conn = db::open_in_memory().unwrap();
    db::configure(&conn, Duration::from_secs(5)).unwrap();
    migrations::apply_migrations(&mut conn).unwrap();
    conn
}

pub fn folder(conn: &mut Connection, name: &str, parent_id: NodeId) -> Folder {
    NodeStore::create_folder(conn, name, Some(parent_id)).unwrap()
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
            description: format!("{} description", name),
            pvs: pv_names.iter().map(|n| ConfigPvDefinition::new(*n)).collect(),
            ..NewConfiguration::default()
        },
    )
    .unwrap()
}

/// One successful reading per PV, valued by position
pub fn readings_for(config: &Configuration) -> Vec<SnapshotPv> {
    config
        .pvs
        .iter()
        .enumerate()
        .map(|(i, pv)| {
            let mut reading = PvReading::new(serde_json::json!(i as f64 * 1.5));
            reading.timestamp_seconds = 1_700_000_000 + i as i64;
            reading.dtype = 6;
            SnapshotPv::from_reading(pv.clone(), reading)
        })
        .collect()
}

pub fn config_pv_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM config_pv", [], |row| row.get(0))
        .unwrap()
}

pub fn snapshot_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM snapshot", [], |row| row.get(0))
        .unwrap()
}

/// Replace a configuration's PV list, keeping its other details
pub fn set_pvs(conn: &mut Connection, config: &Configuration, pv_names: &[&str]) -> Configuration {
    NodeStore::update_configuration(
        conn,
        &ConfigurationUpdate {
            id: config.id(),
            name: config.name().to_string(),
            description: config.description.clone(),
            system: config.system.clone(),
            active: config.active,
            pvs: pv_names.iter().map(|n| ConfigPvDefinition::new(*n)).collect(),
        },
    )
    .unwrap()
}
