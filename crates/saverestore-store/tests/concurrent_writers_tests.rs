// Two connections racing on one database file

use saverestore_core::errors::ExErrorKind;
use saverestore_core::model::ROOT_NODE_ID;
use saverestore_store::{db, migrations, NodeStore};
use std::path::Path;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

fn connect(path: &Path) -> rusqlite::Connection {
    let conn = db::open(path).unwrap();
    db::configure(&conn, Duration::from_secs(10)).unwrap();
    conn
}

#[test]
fn test_racing_creates_admit_exactly_one_name() {
    // Given: A migrated file database
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("race.db");
    {
        let mut conn = connect(&path);
        migrations::apply_migrations(&mut conn).unwrap();
    }

    // When: Several writers create the same folder name at once
    let writers = 4;
    let barrier = Arc::new(Barrier::new(writers));
    let handles: Vec<_> = (0..writers)
        .map(|_| {
            let path = path.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let mut conn = connect(&path);
                barrier.wait();
                NodeStore::create_folder(&mut conn, "contended", Some(ROOT_NODE_ID))
            })
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    // Then: One wins and every other sees a name clash
    let wins = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert_eq!(err.kind(), ExErrorKind::InvalidArgument);
    }

    let conn = connect(&path);
    let root = NodeStore::get_folder(&conn, ROOT_NODE_ID).unwrap();
    assert_eq!(root.children.len(), 1);
}

#[test]
fn test_timestamps_strictly_increase_under_rapid_touches() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("touch.db");
    let mut conn = connect(&path);
    migrations::apply_migrations(&mut conn).unwrap();

    let mut previous = NodeStore::get_node(&conn, ROOT_NODE_ID)
        .unwrap()
        .last_modified;
    for i in 0..20 {
        NodeStore::create_folder(&mut conn, &format!("f{}", i), Some(ROOT_NODE_ID)).unwrap();
        let current = NodeStore::get_node(&conn, ROOT_NODE_ID)
            .unwrap()
            .last_modified;
        assert!(current > previous);
        previous = current;
    }
}
