use trailscope_codec::{field_index, TrailUuid, NO_MATCH};
use trailscope_store::{
    StoreCursor, StoreError, TrailDb, TrailDbConstructor, TrailStore, RECORD_HEADER_SIZE,
};
use tempfile::TempDir;

fn uuid(n: u8) -> TrailUuid {
    TrailUuid::from_bytes([n; 16])
}

fn record_timestamp(record: &[u8]) -> u64 {
    u64::from_le_bytes(record[0..8].try_into().unwrap())
}

fn record_items(record: &[u8]) -> Vec<u64> {
    let count = u64::from_le_bytes(record[8..16].try_into().unwrap()) as usize;
    (0..count)
        .map(|i| {
            let start = RECORD_HEADER_SIZE + 8 * i;
            u64::from_le_bytes(record[start..start + 8].try_into().unwrap())
        })
        .collect()
}

fn build_sample(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("sample.tdb");
    let mut cons = TrailDbConstructor::create(&path, &["field1", "field2"]).unwrap();
    cons.add(&uuid(1), 124, &["b", "c"]).unwrap();
    cons.add(&uuid(1), 123, &["a", ""]).unwrap();
    cons.add(&uuid(2), 125, &["b", "e"]).unwrap();
    cons.add(&uuid(2), 126, &["d", "e"]).unwrap();
    cons.finalize().unwrap();
    path
}

#[test]
fn test_build_and_open() {
    let temp_dir = TempDir::new().unwrap();
    let db = TrailDb::open(build_sample(&temp_dir)).unwrap();

    assert_eq!(db.num_trails(), 2);
    assert_eq!(db.num_events(), 4);
    assert_eq!(db.num_fields(), 3);
    assert_eq!(db.min_timestamp(), 123);
    assert_eq!(db.max_timestamp(), 126);
    assert_eq!(db.field_names(), &["field1".to_string(), "field2".to_string()]);
    assert_eq!(db.field_index("field2"), Some(2));
    assert_eq!(db.field_name(0), Some("time"));
}

#[test]
fn test_trails_keep_first_seen_order() {
    let temp_dir = TempDir::new().unwrap();
    let db = TrailDb::open(build_sample(&temp_dir)).unwrap();

    assert_eq!(db.uuid(0), Some(uuid(1)));
    assert_eq!(db.uuid(1), Some(uuid(2)));
    assert_eq!(db.uuid(2), None);
    assert_eq!(db.trail_id(&uuid(2)), Some(1));
    assert_eq!(db.trail_id(&uuid(9)), None);
}

#[test]
fn test_item_lookups() {
    let temp_dir = TempDir::new().unwrap();
    let db = TrailDb::open(build_sample(&temp_dir)).unwrap();

    let b = db.item(1, "b");
    assert_ne!(b, NO_MATCH);
    assert_eq!(field_index(b), 1);
    assert_eq!(db.item_value(b), Some("b"));

    let empty = db.item(2, "");
    assert_eq!(db.item_value(empty), Some(""));

    assert_eq!(db.item(1, "zzz"), NO_MATCH);
    assert_eq!(db.item(0, "a"), NO_MATCH);
    assert_eq!(db.item(7, "a"), NO_MATCH);
    assert_eq!(db.item_value(NO_MATCH), None);
}

#[test]
fn test_cursor_yields_sorted_records() {
    let temp_dir = TempDir::new().unwrap();
    let db = TrailDb::open(build_sample(&temp_dir)).unwrap();

    let mut cursor = db.cursor().unwrap();
    cursor.get_trail(0).unwrap();

    let first = cursor.next_record().unwrap().to_vec();
    assert_eq!(record_timestamp(&first), 123);
    let values: Vec<_> = record_items(&first)
        .into_iter()
        .map(|item| db.item_value(item).unwrap())
        .collect();
    assert_eq!(values, vec!["a", ""]);

    let second = cursor.next_record().unwrap().to_vec();
    assert_eq!(record_timestamp(&second), 124);

    assert!(cursor.next_record().is_none());
    assert!(cursor.next_record().is_none());
}

#[test]
fn test_cursor_rejects_invalid_trail() {
    let temp_dir = TempDir::new().unwrap();
    let db = TrailDb::open(build_sample(&temp_dir)).unwrap();

    let mut cursor = db.cursor().unwrap();
    match cursor.get_trail(2) {
        Err(StoreError::InvalidTrail {
            trail_id,
            num_trails,
        }) => {
            assert_eq!(trail_id, 2);
            assert_eq!(num_trails, 2);
        }
        other => panic!("Expected InvalidTrail, got {:?}", other),
    }
}

#[test]
fn test_append_copies_events() {
    let temp_dir = TempDir::new().unwrap();
    let source = TrailDb::open(build_sample(&temp_dir)).unwrap();

    let path = temp_dir.path().join("merged.tdb");
    let mut cons = TrailDbConstructor::create(&path, &["field1", "field2"]).unwrap();
    cons.add(&uuid(3), 1, &["x", "y"]).unwrap();
    cons.append(&source).unwrap();
    assert_eq!(cons.num_trails(), 3);
    assert_eq!(cons.num_events(), 5);
    cons.finalize().unwrap();

    let merged = TrailDb::open(&path).unwrap();
    assert_eq!(merged.uuid(0), Some(uuid(3)));
    assert_eq!(merged.trail_id(&uuid(2)), Some(2));
    assert_ne!(merged.item(2, "e"), NO_MATCH);
}

#[test]
fn test_append_rejects_different_fields() {
    let temp_dir = TempDir::new().unwrap();
    let source = TrailDb::open(build_sample(&temp_dir)).unwrap();

    let path = temp_dir.path().join("other.tdb");
    let mut cons = TrailDbConstructor::create(&path, &["field2", "field1"]).unwrap();
    assert!(matches!(
        cons.append(&source),
        Err(StoreError::AppendMismatch { .. })
    ));
}

#[test]
fn test_add_rejects_wrong_value_count() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("test.tdb");
    let mut cons = TrailDbConstructor::create(&path, &["field1", "field2"]).unwrap();

    match cons.add(&uuid(1), 1, &["only-one"]) {
        Err(StoreError::AppendMismatch { expected, actual }) => {
            assert_eq!(expected, "2 values");
            assert_eq!(actual, "1 values");
        }
        other => panic!("Expected AppendMismatch, got {:?}", other),
    }
}

#[test]
fn test_empty_store() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("empty.tdb");
    TrailDbConstructor::create(&path, &["field1"])
        .unwrap()
        .finalize()
        .unwrap();

    let db = TrailDb::open(&path).unwrap();
    assert_eq!(db.num_trails(), 0);
    assert_eq!(db.num_events(), 0);
    assert_eq!(db.min_timestamp(), 0);
    assert_eq!(db.max_timestamp(), 0);
}
