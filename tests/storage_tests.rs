use chrono::{Duration, TimeZone, Utc};
use dedup_file_store::storage::models::{FileRecord, ListFilter};
use dedup_file_store::storage::{Database, DatabaseError, FILE_HASHES};

fn test_db() -> (tempfile::TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("data")).unwrap();
    (dir, db)
}

fn sample_file(id: &str, hash: &str) -> FileRecord {
    FileRecord {
        id: id.to_string(),
        stored_location: format!("uploads/{id}.txt"),
        original_filename: format!("{id}.txt"),
        content_type: "text/plain".to_string(),
        size: 1024,
        uploaded_at: Utc::now(),
        content_hash: hash.to_string(),
        reference_count: 1,
    }
}

#[test]
fn test_insert_and_get_file() {
    let (_dir, db) = test_db();
    let file = sample_file("file-1", "hash-1");

    db.insert_file(&file).unwrap();

    let retrieved = db.get_file("file-1").unwrap().expect("file should exist");
    assert_eq!(retrieved, file);
}

#[test]
fn test_get_file_by_location() {
    let (_dir, db) = test_db();
    db.insert_file(&sample_file("file-2", "hash-2")).unwrap();

    let by_location = db
        .get_file_by_location("uploads/file-2.txt")
        .unwrap()
        .expect("location should resolve");
    assert_eq!(by_location.id, "file-2");
}

#[test]
fn test_get_file_not_found() {
    let (_dir, db) = test_db();
    assert!(db.get_file("nonexistent").unwrap().is_none());
    assert!(db.get_file_by_location("uploads/none").unwrap().is_none());
}

#[test]
fn test_insert_duplicate_hash_conflicts() {
    let (_dir, db) = test_db();
    db.insert_file(&sample_file("first", "same-hash")).unwrap();

    let err = db
        .insert_file(&sample_file("second", "same-hash"))
        .unwrap_err();
    match err {
        DatabaseError::HashConflict { existing_id } => assert_eq!(existing_id, "first"),
        other => panic!("expected hash conflict, got {other:?}"),
    }

    // Nothing from the rejected insert is visible
    assert!(db.get_file("second").unwrap().is_none());
    assert!(db
        .get_file_by_location("uploads/second.txt")
        .unwrap()
        .is_none());
    assert_eq!(db.get_all_files().unwrap().len(), 1);
}

#[test]
fn test_insert_duplicate_location_conflicts() {
    let (_dir, db) = test_db();
    db.insert_file(&sample_file("a", "hash-a")).unwrap();

    let mut clash = sample_file("b", "hash-b");
    clash.stored_location = "uploads/a.txt".to_string();

    assert!(matches!(
        db.insert_file(&clash),
        Err(DatabaseError::LocationConflict(_))
    ));
    // The rejected record's hash was not indexed
    assert!(db.increment_reference("hash-b").unwrap().is_none());
}

#[test]
fn test_increment_reference() {
    let (_dir, db) = test_db();
    db.insert_file(&sample_file("ref", "ref-hash")).unwrap();

    let updated = db.increment_reference("ref-hash").unwrap().unwrap();
    assert_eq!(updated.reference_count, 2);

    db.increment_reference("ref-hash").unwrap();
    let file = db.get_file("ref").unwrap().unwrap();
    assert_eq!(file.reference_count, 3);
}

#[test]
fn test_increment_reference_unknown_hash() {
    let (_dir, db) = test_db();
    assert!(db.increment_reference("missing").unwrap().is_none());
}

#[test]
fn test_increment_reference_drops_dangling_hash_entry() {
    let (_dir, db) = test_db();
    let txn = db.begin_write().unwrap();
    {
        let mut hashes = txn.open_table(FILE_HASHES).unwrap();
        hashes.insert("orphan-hash", "missing-id").unwrap();
    }
    txn.commit().unwrap();

    assert!(matches!(
        db.insert_file(&sample_file("blocked", "orphan-hash")),
        Err(DatabaseError::HashConflict { .. })
    ));
    assert!(db.increment_reference("orphan-hash").unwrap().is_none());

    db.insert_file(&sample_file("fresh", "orphan-hash")).unwrap();
    let bumped = db.increment_reference("orphan-hash").unwrap().unwrap();
    assert_eq!(bumped.id, "fresh");
}

#[test]
fn test_delete_file_cleans_indexes() {
    let (_dir, db) = test_db();
    db.insert_file(&sample_file("gone", "gone-hash")).unwrap();

    assert!(db.delete_file("gone").unwrap());
    assert!(db.get_file("gone").unwrap().is_none());
    assert!(db.increment_reference("gone-hash").unwrap().is_none());
    assert!(db.get_file_by_location("uploads/gone.txt").unwrap().is_none());

    // The same content can be stored again afterwards
    db.insert_file(&sample_file("again", "gone-hash")).unwrap();
}

#[test]
fn test_delete_file_not_found() {
    let (_dir, db) = test_db();
    assert!(!db.delete_file("nonexistent").unwrap());
}

#[test]
fn test_list_files_newest_first() {
    let (_dir, db) = test_db();
    let base = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

    for (i, id) in ["old", "middle", "new"].iter().enumerate() {
        let mut file = sample_file(id, &format!("hash-{id}"));
        file.uploaded_at = base + Duration::hours(i as i64);
        db.insert_file(&file).unwrap();
    }

    let ids: Vec<String> = db
        .list_files(&ListFilter::default())
        .unwrap()
        .into_iter()
        .map(|f| f.id)
        .collect();
    assert_eq!(ids, vec!["new", "middle", "old"]);
}

#[test]
fn test_list_files_with_filter() {
    let (_dir, db) = test_db();

    let mut small = sample_file("small", "h-small");
    small.size = 5;
    let mut report = sample_file("report", "h-report");
    report.original_filename = "Annual REPORT.pdf".to_string();
    report.content_type = "application/pdf".to_string();
    report.size = 50;
    let mut big = sample_file("big", "h-big");
    big.size = 5000;

    for f in [&small, &report, &big] {
        db.insert_file(f).unwrap();
    }

    let in_range = db
        .list_files(&ListFilter {
            size_range: Some((10, 100)),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(in_range.len(), 1);
    assert_eq!(in_range[0].id, "report");

    let searched = db
        .list_files(&ListFilter {
            search: Some("report".to_string()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(searched.len(), 1);
    assert_eq!(searched[0].id, "report");

    let text = db
        .list_files(&ListFilter {
            content_type_contains: Some("TEXT".to_string()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(text.len(), 2);
}

#[test]
fn test_list_files_uploaded_after() {
    let (_dir, db) = test_db();

    let mut old = sample_file("old", "h-old");
    old.uploaded_at = Utc::now() - Duration::days(30);
    db.insert_file(&old).unwrap();
    db.insert_file(&sample_file("fresh", "h-fresh")).unwrap();

    let recent = db
        .list_files(&ListFilter {
            uploaded_after: Some(Utc::now() - Duration::days(7)),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].id, "fresh");
}

#[test]
fn test_records_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let db = Database::open(dir.path().join("data")).unwrap();
        db.insert_file(&sample_file("persisted", "p-hash")).unwrap();
    }

    let db = Database::open(dir.path().join("data")).unwrap();
    assert!(db.get_file("persisted").unwrap().is_some());
    let bumped = db.increment_reference("p-hash").unwrap().expect("hash index persisted");
    assert_eq!(bumped.id, "persisted");
}
