// Shared PV definitions: deduplication, update and garbage collection

mod common;

use common::{config_pv_count, configuration, setup_test_db};
use saverestore_core::errors::ExErrorKind;
use saverestore_core::model::{
    ConfigPvDefinition, ConfigurationUpdate, NewConfiguration, ROOT_NODE_ID,
};
use saverestore_store::{ConfigPvRegistry, NodeStore, SnapshotStore};

#[test]
fn test_configurations_share_pv_definitions() {
    // Given: Two configurations naming the same PV
    let mut conn = setup_test_db();
    let c1 = configuration(&mut conn, "C1", ROOT_NODE_ID, &["shared", "only1"]);
    let c2 = configuration(&mut conn, "C2", ROOT_NODE_ID, &["shared"]);

    // Then: They point at one definition
    assert_eq!(c1.pvs[0].id, c2.pvs[0].id);
    assert_eq!(config_pv_count(&conn), 2);
    assert_eq!(ConfigPvRegistry::usage(&conn, c1.pvs[0].id).unwrap(), 2);
}

#[test]
fn test_first_registration_metadata_wins() {
    let mut conn = setup_test_db();
    let first = ConfigPvDefinition {
        pv_name: "ring:current".to_string(),
        group_name: Some("ring".to_string()),
        tags: Some("beam".to_string()),
        readonly: true,
    };
    NodeStore::create_configuration(
        &mut conn,
        &NewConfiguration {
            name: "C1".to_string(),
            parent_id: Some(ROOT_NODE_ID),
            pvs: vec![first],
            ..NewConfiguration::default()
        },
    )
    .unwrap();

    let c2 = NodeStore::create_configuration(
        &mut conn,
        &NewConfiguration {
            name: "C2".to_string(),
            parent_id: Some(ROOT_NODE_ID),
            pvs: vec![ConfigPvDefinition::new("ring:current")],
            ..NewConfiguration::default()
        },
    )
    .unwrap();

    assert_eq!(c2.pvs[0].group_name.as_deref(), Some("ring"));
    assert!(c2.pvs[0].readonly);
}

#[test]
fn test_pv_order_preserved() {
    let mut conn = setup_test_db();
    let config = configuration(&mut conn, "C", ROOT_NODE_ID, &["c", "a", "b"]);

    let names: Vec<_> = config.pvs.iter().map(|p| p.pv_name.as_str()).collect();
    assert_eq!(names, vec!["c", "a", "b"]);
}

#[test]
fn test_duplicate_pv_in_one_configuration_is_invalid() {
    let mut conn = setup_test_db();

    let err = NodeStore::create_configuration(
        &mut conn,
        &NewConfiguration {
            name: "C".to_string(),
            parent_id: Some(ROOT_NODE_ID),
            pvs: vec![ConfigPvDefinition::new("x"), ConfigPvDefinition::new("x")],
            ..NewConfiguration::default()
        },
    )
    .unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::InvalidArgument);
    assert_eq!(config_pv_count(&conn), 0);
}

#[test]
fn test_delete_keeps_pv_still_referenced() {
    // Given: Two configurations sharing "shared"
    let mut conn = setup_test_db();
    let c1 = configuration(&mut conn, "C1", ROOT_NODE_ID, &["shared", "only1"]);
    let c2 = configuration(&mut conn, "C2", ROOT_NODE_ID, &["shared"]);

    // When: C1 is deleted
    NodeStore::delete_node(&mut conn, c1.id()).unwrap();

    // Then: "shared" survives, "only1" is gone
    assert!(ConfigPvRegistry::find_by_name(&conn, "shared").unwrap().is_some());
    assert!(ConfigPvRegistry::find_by_name(&conn, "only1").unwrap().is_none());
    let c2 = NodeStore::get_configuration(&conn, c2.id()).unwrap();
    assert_eq!(c2.pvs.len(), 1);

    // When: The last referencing configuration is deleted
    NodeStore::delete_node(&mut conn, c2.id()).unwrap();

    // Then: The definition is collected
    assert_eq!(config_pv_count(&conn), 0);
}

#[test]
fn test_update_replaces_pv_list_and_collects_orphans() {
    // Given: A configuration with PVs a and b
    let mut conn = setup_test_db();
    let config = configuration(&mut conn, "C", ROOT_NODE_ID, &["a", "b"]);

    // When: It is updated to b and c
    let updated = NodeStore::update_configuration(
        &mut conn,
        &ConfigurationUpdate {
            id: config.id(),
            name: "C renamed".to_string(),
            description: "new".to_string(),
            system: Some("vacuum".to_string()),
            active: true,
            pvs: vec![ConfigPvDefinition::new("b"), ConfigPvDefinition::new("c")],
        },
    )
    .unwrap();

    // Then: Details and list are replaced, "b" kept its id, "a" was collected
    assert_eq!(updated.name(), "C renamed");
    assert_eq!(updated.description, "new");
    assert_eq!(updated.system.as_deref(), Some("vacuum"));
    assert!(updated.active);
    let names: Vec<_> = updated.pvs.iter().map(|p| p.pv_name.as_str()).collect();
    assert_eq!(names, vec!["b", "c"]);
    assert_eq!(updated.pvs[0].id, config.pvs[1].id);
    assert!(ConfigPvRegistry::find_by_name(&conn, "a").unwrap().is_none());
    assert!(updated.node.last_modified > config.node.last_modified);
}

#[test]
fn test_update_missing_or_folder_is_not_found() {
    let mut conn = setup_test_db();

    let err = NodeStore::update_configuration(
        &mut conn,
        &ConfigurationUpdate {
            id: ROOT_NODE_ID,
            name: "x".to_string(),
            description: String::new(),
            system: None,
            active: false,
            pvs: vec![],
        },
    )
    .unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::NotFound);
}

#[test]
fn test_update_rename_clash_is_invalid() {
    let mut conn = setup_test_db();
    configuration(&mut conn, "C1", ROOT_NODE_ID, &["a"]);
    let c2 = configuration(&mut conn, "C2", ROOT_NODE_ID, &["a"]);

    let err = NodeStore::update_configuration(
        &mut conn,
        &ConfigurationUpdate {
            id: c2.id(),
            name: "C1".to_string(),
            description: String::new(),
            system: None,
            active: false,
            pvs: vec![ConfigPvDefinition::new("z")],
        },
    )
    .unwrap_err();

    // Then: Nothing changed, "z" was never registered
    assert_eq!(err.kind(), ExErrorKind::InvalidArgument);
    assert!(ConfigPvRegistry::find_by_name(&conn, "z").unwrap().is_none());
}

#[test]
fn test_snapshot_values_keep_dropped_pv_alive() {
    // Given: A committed snapshot of a configuration with PV "a"
    let mut conn = setup_test_db();
    let config = configuration(&mut conn, "C", ROOT_NODE_ID, &["a"]);
    let snapshot =
        SnapshotStore::capture(&mut conn, config.id(), &common::readings_for(&config)).unwrap();
    SnapshotStore::commit(&mut conn, snapshot.id, Some("alice"), Some("keep")).unwrap();

    // When: The configuration drops "a"
    NodeStore::update_configuration(
        &mut conn,
        &ConfigurationUpdate {
            id: config.id(),
            name: "C".to_string(),
            description: String::new(),
            system: None,
            active: false,
            pvs: vec![],
        },
    )
    .unwrap();

    // Then: The stored snapshot still resolves "a"
    let values = SnapshotStore::get_snapshot_pv_values(&conn, snapshot.id).unwrap();
    assert_eq!(values[0].config_pv.pv_name, "a");

    // When: The snapshot is deleted, "a" is finally collected
    SnapshotStore::delete_snapshot(&mut conn, snapshot.id).unwrap();
    assert_eq!(config_pv_count(&conn), 0);
}

#[test]
fn test_release_ignores_referenced_definition() {
    let mut conn = setup_test_db();
    let config = configuration(&mut conn, "C", ROOT_NODE_ID, &["a"]);

    assert!(!ConfigPvRegistry::release(&conn, config.pvs[0].id).unwrap());
    assert_eq!(config_pv_count(&conn), 1);
}
