//! Integration tests for the edge-collections-sqlite crate.

use edge_collections_core::{
    CoreError, DEFAULT_BLOB_FIELDS, FieldValue, ItemSummary, RowMap, Table, decode_blob,
    truncate_blobs,
};
use edge_collections_sqlite::{
    CollectionsQuery, Database, SqliteError, TitleMatch, backup_database,
    snapshot_database,
};
use rusqlite::{Connection, params};

const SCHEMA: &str = include_str!("../fixtures/edge_schema.sql");

/// Creates an in-memory database with the Edge table layout.
fn empty_db() -> Database {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(SCHEMA).unwrap();
    Database::new(conn)
}

fn insert_collection(db: &Database, id: &str, title: &str) {
    db.connection()
        .execute(
            "INSERT INTO collections (id, title, tag, thumbnail) VALUES (?1, ?2, ?3, ?4)",
            params![id, title, r#"{"color":"green"}"#, vec![b'T'; 64]],
        )
        .unwrap();
}

fn insert_item(db: &Database, id: &str, title: &str) {
    db.connection()
        .execute(
            "INSERT INTO items (id, title, source, entity_blob) VALUES (?1, ?2, ?3, ?4)",
            params![
                id,
                title,
                format!(r#"{{"url":"https://example.com/{id}"}}"#).into_bytes(),
                br#"{"kind":"recipe"}"#.to_vec()
            ],
        )
        .unwrap();
}

fn link(db: &Database, item: &str, parent: &str, position: i64) {
    db.connection()
        .execute(
            "INSERT INTO collections_items_relationship (item_id, parent_id, position) VALUES (?1, ?2, ?3)",
            params![item, parent, position],
        )
        .unwrap();
}

/// The "Recipes" scenario: `c1` holds `i1` and `i2` at positions 0 and 1.
fn recipes_db() -> Database {
    let db = empty_db();
    insert_collection(&db, "c1", "Recipes");
    insert_item(&db, "i1", "Pancakes");
    insert_item(&db, "i2", "Waffles");
    link(&db, "i1", "c1", 0);
    link(&db, "i2", "c1", 1);
    db
}

// =============================================================================
// Collections
// =============================================================================

#[test]
fn test_list_collections() {
    let db = recipes_db();
    insert_collection(&db, "c2", "Travel");
    let query = CollectionsQuery::new(&db);

    let summaries = query.list_collections().unwrap();
    let pairs: Vec<(&str, &str)> = summaries
        .iter()
        .map(|s| (s.id.as_str(), s.title.as_str()))
        .collect();
    assert_eq!(pairs, vec![("c1", "Recipes"), ("c2", "Travel")]);
}

#[test]
fn test_get_collection() {
    let db = recipes_db();
    let query = CollectionsQuery::new(&db);

    let collection = query.get_collection("c1").unwrap().unwrap();
    assert_eq!(collection.title, "Recipes");
    assert_eq!(collection.decode_tag().unwrap()["color"], "green");
    assert!(collection.is_syncable);

    assert!(query.get_collection("nope").unwrap().is_none());
}

#[test]
fn test_find_collections_exact_and_substring() {
    let db = recipes_db();
    insert_collection(&db, "c2", "Recipes");
    insert_collection(&db, "c3", "Old recipes");
    let query = CollectionsQuery::new(&db);

    let exact = query.find_collections_by_title("Recipes", TitleMatch::Exact).unwrap();
    assert_eq!(exact.len(), 2);

    let like = query.find_collections_by_title("ecipe", TitleMatch::Substring).unwrap();
    assert_eq!(like.len(), 3);

    let none = query.find_collections_by_title("Recipe", TitleMatch::Exact).unwrap();
    assert!(none.is_empty());
}

#[test]
fn test_rename_then_get_returns_new_title() {
    let db = recipes_db();
    let query = CollectionsQuery::new(&db);

    assert_eq!(query.rename_collection("c1", "Breakfast").unwrap(), 1);
    assert_eq!(query.get_collection("c1").unwrap().unwrap().title, "Breakfast");
}

#[test]
fn test_rename_missing_collection_is_noop() {
    let db = recipes_db();
    let query = CollectionsQuery::new(&db);

    assert_eq!(query.rename_collection("missing", "X").unwrap(), 0);
    assert_eq!(query.list_collections().unwrap().len(), 1);
}

#[test]
fn test_rename_does_not_validate_title() {
    let db = recipes_db();
    let query = CollectionsQuery::new(&db);

    assert_eq!(query.rename_collection("c1", "").unwrap(), 1);
    assert_eq!(query.get_collection("c1").unwrap().unwrap().title, "");
}

#[test]
fn test_delete_then_get_returns_none() {
    let db = recipes_db();
    let query = CollectionsQuery::new(&db);

    assert_eq!(query.delete_collection("c1").unwrap(), 1);
    assert!(query.get_collection("c1").unwrap().is_none());
    assert_eq!(query.delete_collection("c1").unwrap(), 0);
}

#[test]
fn test_delete_leaves_relationship_rows() {
    let db = recipes_db();
    let query = CollectionsQuery::new(&db);

    query.delete_collection("c1").unwrap();
    assert_eq!(query.count_rows(Table::CollectionsItemsRelationship).unwrap(), 2);
    assert_eq!(query.list_relationships().unwrap().len(), 2);
}

#[test]
fn test_rolled_back_edit_is_discarded() {
    let db = recipes_db();
    let query = CollectionsQuery::new(&db);

    let tx = db.transaction().unwrap();
    query.rename_collection("c1", "Scratch").unwrap();
    tx.rollback().unwrap();
    assert_eq!(query.get_collection("c1").unwrap().unwrap().title, "Recipes");

    let tx = db.transaction().unwrap();
    query.rename_collection("c1", "Kept").unwrap();
    tx.commit().unwrap();
    assert_eq!(query.get_collection("c1").unwrap().unwrap().title, "Kept");
}

// =============================================================================
// Items and memberships
// =============================================================================

#[test]
fn test_items_mirror_collections() {
    let db = recipes_db();
    let query = CollectionsQuery::new(&db);

    assert_eq!(query.list_items().unwrap().len(), 2);

    let item = query.get_item("i2").unwrap().unwrap();
    assert_eq!(item.title, "Waffles");
    assert_eq!(item.item_type.as_deref(), Some("website"));
    assert_eq!(item.decode_source().unwrap()["url"], "https://example.com/i2");
    assert_eq!(item.decode_entity_blob().unwrap()["kind"], "recipe");

    assert!(query.get_item("missing").unwrap().is_none());
    assert_eq!(query.find_items_by_title("waff", TitleMatch::Substring).unwrap().len(), 1);
    assert_eq!(query.find_items_by_title("Pancakes", TitleMatch::Exact).unwrap().len(), 1);
}

#[test]
fn test_items_in_collection_scenario() {
    let db = recipes_db();
    let query = CollectionsQuery::new(&db);

    let by_id: Vec<String> = query
        .get_items_in_collection("c1")
        .unwrap()
        .into_iter()
        .map(|i| i.id)
        .collect();
    assert_eq!(by_id, vec!["i1", "i2"]);

    let collection = query.get_collection("c1").unwrap().unwrap();
    let by_record = query.get_items_in_collection(&collection).unwrap();
    assert_eq!(by_record.len(), 2);

    assert!(query.get_items_in_collection("missing").unwrap().is_empty());
}

#[test]
fn test_link_items_scenario() {
    let db = recipes_db();
    let query = CollectionsQuery::new(&db);

    let items = query.list_items().unwrap();
    let linked = query.link_items_to_collections(&items).unwrap();
    assert_eq!(linked.len(), 2);

    for entry in &linked {
        assert_eq!(entry.memberships.len(), 1);
        let membership = &entry.memberships[0];
        assert_eq!(membership.item_id, entry.record.id);
        assert_eq!(membership.parent_id, "c1");
        assert_eq!(membership.parent.as_ref().unwrap().title, "Recipes");
    }
    assert_eq!(linked[0].memberships[0].position, Some(0));
    assert_eq!(linked[1].memberships[0].position, Some(1));
}

#[test]
fn test_link_item_without_relationships_has_no_memberships() {
    let db = recipes_db();
    insert_item(&db, "i3", "Loose");
    let query = CollectionsQuery::new(&db);

    let item = query.get_item("i3").unwrap().unwrap();
    let linked = query.link_items_to_collections(&[item]).unwrap();
    assert_eq!(linked.len(), 1);
    assert!(linked[0].memberships.is_empty());
}

#[test]
fn test_link_item_in_two_collections() {
    let db = recipes_db();
    insert_collection(&db, "c2", "Favourites");
    link(&db, "i1", "c2", 5);
    let query = CollectionsQuery::new(&db);

    let items = vec![query.get_item("i1").unwrap().unwrap()];
    let linked = query.link_items_to_collections(&items).unwrap();
    let memberships = &linked[0].memberships;
    assert_eq!(memberships.len(), 2);

    let parents: Vec<(&str, &str)> = memberships
        .iter()
        .map(|m| (m.parent_id.as_str(), m.parent.as_ref().unwrap().title.as_str()))
        .collect();
    assert_eq!(parents, vec![("c1", "Recipes"), ("c2", "Favourites")]);
    assert!(linked[0].is_in("c2"));
}

#[test]
fn test_link_is_idempotent() {
    let db = recipes_db();
    insert_collection(&db, "c2", "Favourites");
    link(&db, "i2", "c2", 0);
    let query = CollectionsQuery::new(&db);

    let items = query.list_items().unwrap();
    let first = query.link_items_to_collections(&items).unwrap();
    let second = query.link_items_to_collections(&items).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_link_tolerates_orphaned_relationships() {
    let db = recipes_db();
    let query = CollectionsQuery::new(&db);
    query.delete_collection("c1").unwrap();

    let items = query.list_items().unwrap();
    let linked = query.link_items_to_collections(&items).unwrap();
    assert_eq!(linked[0].memberships.len(), 1);
    assert_eq!(linked[0].memberships[0].parent_id, "c1");
    assert!(linked[0].memberships[0].parent.is_none());
}

#[test]
fn test_link_deduplicates_items() {
    let db = recipes_db();
    let query = CollectionsQuery::new(&db);

    let items = query.list_items().unwrap();
    let doubled: Vec<ItemSummary> = items.iter().chain(items.iter()).cloned().collect();
    let linked = query.link_items_to_collections(&doubled).unwrap();
    assert_eq!(linked.len(), 2);
    assert_eq!(linked[0].memberships.len(), 1);
}

#[test]
fn test_link_requires_ids() {
    let db = recipes_db();
    let query = CollectionsQuery::new(&db);

    let rows = vec![RowMap::from_iter([("title", "no id")])];
    let err = query.link_items_to_collections(&rows).unwrap_err();
    assert!(matches!(err, SqliteError::RecordError(CoreError::MissingId)));

    assert!(query.link_items_to_collections::<ItemSummary>(&[]).unwrap().is_empty());
}

#[test]
fn test_link_row_map_with_numeric_id() {
    let db = recipes_db();
    link(&db, "42", "c1", 7);
    let query = CollectionsQuery::new(&db);

    let rows = vec![RowMap::from_iter([("id", FieldValue::Integer(42))])];
    let linked = query.link_items_to_collections(&rows).unwrap();
    assert_eq!(linked.len(), 1);
    assert_eq!(linked[0].memberships.len(), 1);
    assert_eq!(linked[0].memberships[0].position, Some(7));
}

#[test]
fn test_link_accepts_row_maps() {
    let db = recipes_db();
    let query = CollectionsQuery::new(&db);

    let rows = query.scan_table(Table::Items).unwrap();
    let linked = query.link_items_to_collections(&rows).unwrap();
    assert_eq!(linked.len(), 2);
    assert!(linked.iter().all(|l| l.is_in("c1")));
}

#[test]
fn test_link_spans_batches() {
    let db = empty_db();
    insert_collection(&db, "c1", "Big");
    for n in 0..1200 {
        let id = format!("i{n}");
        insert_item(&db, &id, "bulk");
        link(&db, &id, "c1", n);
    }
    let query = CollectionsQuery::new(&db);

    let items = query.list_items().unwrap();
    let linked = query.link_items_to_collections(&items).unwrap();
    assert_eq!(linked.len(), 1200);
    assert!(linked.iter().all(|l| l.memberships.len() == 1));
}

// =============================================================================
// Sync flags
// =============================================================================

#[test]
fn test_check_syncable_collections() {
    let db = empty_db();
    let conn = db.connection();
    conn.execute_batch(
        "INSERT INTO collections (id, title, is_syncable) VALUES ('own', 'Own flag', 1);
         INSERT INTO collections (id, title, is_syncable) VALUES ('side', 'Side flag', 0);
         INSERT INTO collections (id, title, is_syncable) VALUES ('off', 'Neither', 0);
         INSERT INTO collections_sync VALUES ('side', 1, 'srv-1', 12.5);
         INSERT INTO collections_sync VALUES ('off', 0, 'srv-2', NULL);",
    )
    .unwrap();
    let query = CollectionsQuery::new(&db);

    let syncable = query.check_syncable_collections().unwrap();
    let ids: Vec<&str> = syncable.iter().map(|s| s.collection.id.as_str()).collect();
    assert_eq!(ids, vec!["own", "side"]);

    assert!(syncable[0].sync.is_none());
    let side = syncable[1].sync.as_ref().unwrap();
    assert!(side.is_syncable);
    assert_eq!(side.server_id.as_deref(), Some("srv-1"));
    assert!(!syncable[1].collection.is_syncable);
}

#[test]
fn test_check_syncable_items() {
    let db = empty_db();
    db.connection()
        .execute_batch(
            "INSERT INTO items (id, title, is_syncable) VALUES ('a', 'A', 0);
             INSERT INTO items (id, title, is_syncable) VALUES ('b', 'B', 0);
             INSERT INTO items_sync VALUES ('b', 1, NULL, NULL);",
        )
        .unwrap();
    let query = CollectionsQuery::new(&db);

    let syncable = query.check_syncable_items().unwrap();
    assert_eq!(syncable.len(), 1);
    assert_eq!(syncable[0].item.id, "b");
}

// =============================================================================
// Generic scans
// =============================================================================

#[test]
fn test_scan_every_registry_table() {
    let db = recipes_db();
    let query = CollectionsQuery::new(&db);

    for table in Table::ALL {
        let rows = query.scan_table(table).unwrap();
        assert_eq!(rows.len() as u64, query.count_rows(table).unwrap());
    }
}

#[test]
fn test_scan_unknown_table_name() {
    let db = recipes_db();
    let query = CollectionsQuery::new(&db);

    let err = query.scan_table_named("sqlite_master").unwrap_err();
    assert!(matches!(err, SqliteError::RecordError(CoreError::UnknownTable(_))));
    assert_eq!(query.scan_table_named("META").unwrap().len(), 0);
}

#[test]
fn test_sample_and_truncate() {
    let db = recipes_db();
    insert_collection(&db, "c2", "Travel");
    let query = CollectionsQuery::new(&db);

    let mut rows = query.sample_table(Table::Collections, 1).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(decode_blob(&rows[0], "tag").unwrap()["color"], "green");

    truncate_blobs(&mut rows, DEFAULT_BLOB_FIELDS, 40);
    let mut expected = vec![b'T'; 40];
    expected.extend_from_slice(b"...");
    assert_eq!(rows[0].get("thumbnail"), Some(&FieldValue::Blob(expected)));
}

#[test]
fn test_filter_table() {
    let db = recipes_db();
    let query = CollectionsQuery::new(&db);

    let exact = query.filter_table(Table::Items, "title", "Waffles", false).unwrap();
    assert_eq!(exact.len(), 1);
    assert_eq!(exact[0].text("id").as_deref(), Some("i2"));

    let like = query.filter_table(Table::Items, "TITLE", "a", true).unwrap();
    assert_eq!(like.len(), 2);

    let by_parent = query
        .filter_table(Table::CollectionsItemsRelationship, "parent_id", "c1", false)
        .unwrap();
    assert_eq!(by_parent.len(), 2);

    let by_position = query
        .filter_table(Table::CollectionsItemsRelationship, "position", 1i64, false)
        .unwrap();
    assert_eq!(by_position.len(), 1);
}

// =============================================================================
// Files
// =============================================================================

#[test]
fn test_open_file_and_backup_twice() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("collectionsSQLite");
    {
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(SCHEMA).unwrap();
    }

    let (db, resolved) = Database::open(Some(&path)).unwrap();
    assert_eq!(resolved, path);
    insert_collection(&db, "c1", "On disk");
    drop(db);

    let first = backup_database(&path).unwrap();
    let second = backup_database(&path).unwrap();
    assert_eq!(first, dir.path().join("collectionsSQLite_backup"));
    assert_eq!(second, dir.path().join("collectionsSQLite_backup1"));

    let (backup, _) = Database::open(Some(&first)).unwrap();
    let query = CollectionsQuery::new(&backup);
    assert_eq!(query.get_collection("c1").unwrap().unwrap().title, "On disk");
}

#[test]
fn test_snapshot_before_edit_keeps_old_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("collectionsSQLite");
    {
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch("PRAGMA journal_mode=WAL;").unwrap();
        conn.execute_batch(SCHEMA).unwrap();
    }

    let (db, _) = Database::open(Some(&path)).unwrap();
    db.connection().execute_batch("PRAGMA wal_autocheckpoint=0;").unwrap();
    insert_collection(&db, "c1", "Recipes");

    let snapshot = snapshot_database(&db, &path).unwrap();
    let query = CollectionsQuery::new(&db);
    let tx = db.transaction().unwrap();
    query.rename_collection("c1", "Breakfast").unwrap();
    tx.commit().unwrap();

    let (copy, _) = Database::open(Some(&snapshot)).unwrap();
    let copied = CollectionsQuery::new(&copy).get_collection("c1").unwrap().unwrap();
    assert_eq!(copied.title, "Recipes");
    assert_eq!(query.get_collection("c1").unwrap().unwrap().title, "Breakfast");
}

#[test]
fn test_open_directory_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let result = Database::open(Some(dir.path()));
    assert!(matches!(result, Err(SqliteError::InvalidPath(_))));
}
