// Schema creation, root seeding and idempotent reopen

use saverestore_core::model::{NodeKind, ROOT_NODE_ID};
use saverestore_store::{db, migrations, NodeStore};
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_root_folder_seeded() {
    // Given: A freshly migrated database
    let mut conn = db::open_in_memory().unwrap();
    migrations::apply_migrations(&mut conn).unwrap();

    // When: The root is fetched
    let root = NodeStore::get_folder(&conn, ROOT_NODE_ID).unwrap();

    // Then: It is an empty folder without a parent
    assert_eq!(root.node.kind, NodeKind::Folder);
    assert!(root.node.parent_id.is_none());
    assert!(root.node.is_root());
    assert!(root.children.is_empty());
}

#[test]
fn test_reopen_file_database_keeps_data() {
    // Given: A file database with one folder
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("archive.db");
    {
        let mut conn = db::open(&path).unwrap();
        db::configure(&conn, Duration::from_secs(1)).unwrap();
        migrations::apply_migrations(&mut conn).unwrap();
        NodeStore::create_folder(&mut conn, "A", Some(ROOT_NODE_ID)).unwrap();
    }

    // When: It is reopened and migrated again
    let mut conn = db::open(&path).unwrap();
    db::configure(&conn, Duration::from_secs(1)).unwrap();
    migrations::apply_migrations(&mut conn).unwrap();

    // Then: Nothing was re-applied and the folder survived
    assert_eq!(migrations::applied_migrations(&conn).unwrap().len(), 1);
    let root = NodeStore::get_folder(&conn, ROOT_NODE_ID).unwrap();
    assert_eq!(root.children.len(), 1);
    assert_eq!(root.children[0].name, "A");
}

#[test]
fn test_sibling_name_index_present() {
    let mut conn = db::open_in_memory().unwrap();
    migrations::apply_migrations(&mut conn).unwrap();

    let unique: i64 = conn
        .query_row(
            "SELECT \"unique\" FROM pragma_index_list('node') WHERE name = 'idx_node_sibling_name'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(unique, 1);
}
