use tempfile::TempDir;
use trailscope_codec::item::encode;
use trailscope_codec::TrailUuid;
use trailscope_store::{EventFilter, StoreCursor, StoreError, TrailDb, TrailDbConstructor, TrailStore};

fn open_sample(dir: &TempDir) -> TrailDb {
    let path = dir.path().join("sample.tdb");
    let mut cons = TrailDbConstructor::create(&path, &["kind", "user"]).unwrap();
    let trail = TrailUuid::from_bytes([4; 16]);
    cons.add(&trail, 1, &["view", "alice"]).unwrap();
    cons.add(&trail, 2, &["click", "alice"]).unwrap();
    cons.add(&trail, 3, &["view", "bob"]).unwrap();
    cons.add(&trail, 4, &["buy", ""]).unwrap();
    cons.finalize().unwrap();
    TrailDb::open(&path).unwrap()
}

fn timestamps(db: &TrailDb, filter: Option<&EventFilter>) -> Vec<u64> {
    let mut cursor = db.cursor().unwrap();
    if let Some(filter) = filter {
        cursor.set_filter(filter).unwrap();
    }
    cursor.get_trail(0).unwrap();

    let mut out = Vec::new();
    while let Some(record) = cursor.next_record() {
        out.push(u64::from_le_bytes(record[0..8].try_into().unwrap()));
    }
    out
}

#[test]
fn test_unfiltered_cursor_sees_everything() {
    let temp_dir = TempDir::new().unwrap();
    let db = open_sample(&temp_dir);
    assert_eq!(timestamps(&db, None), vec![1, 2, 3, 4]);
}

#[test]
fn test_empty_filter_matches_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let db = open_sample(&temp_dir);
    let filter = db.new_filter().unwrap();
    assert!(timestamps(&db, Some(&filter)).is_empty());
}

#[test]
fn test_single_term() {
    let temp_dir = TempDir::new().unwrap();
    let db = open_sample(&temp_dir);
    let mut filter = db.new_filter().unwrap();
    filter.add_term(db.item(1, "view"), false).unwrap();
    assert_eq!(timestamps(&db, Some(&filter)), vec![1, 3]);
}

#[test]
fn test_negated_term_and_empty_value() {
    let temp_dir = TempDir::new().unwrap();
    let db = open_sample(&temp_dir);
    let mut filter = db.new_filter().unwrap();
    filter.add_term(db.item(2, ""), true).unwrap();
    assert_eq!(timestamps(&db, Some(&filter)), vec![1, 2, 3]);
}

#[test]
fn test_conjunction_of_disjunctions() {
    let temp_dir = TempDir::new().unwrap();
    let db = open_sample(&temp_dir);
    let mut filter = db.new_filter().unwrap();
    filter.add_term(db.item(1, "view"), false).unwrap();
    filter.add_term(db.item(1, "buy"), false).unwrap();
    filter.new_clause().unwrap();
    filter.add_term(db.item(2, "bob"), false).unwrap();
    filter.add_term(db.item(2, ""), false).unwrap();
    assert_eq!(timestamps(&db, Some(&filter)), vec![3, 4]);
}

#[test]
fn test_terms_in_one_clause_are_alternatives() {
    let temp_dir = TempDir::new().unwrap();
    let db = open_sample(&temp_dir);
    let mut filter = db.new_filter().unwrap();
    filter.add_term(db.item(1, "click"), false).unwrap();
    filter.add_term(db.item(2, "bob"), false).unwrap();
    assert_eq!(timestamps(&db, Some(&filter)), vec![2, 3]);
}

#[test]
fn test_detached_filter_stops_applying() {
    let temp_dir = TempDir::new().unwrap();
    let db = open_sample(&temp_dir);
    let filter = db.new_filter().unwrap();

    let mut cursor = db.cursor().unwrap();
    cursor.set_filter(&filter).unwrap();
    cursor.unset_filter();
    cursor.get_trail(0).unwrap();
    assert!(cursor.next_record().is_some());
}

#[test]
fn test_filter_from_wider_schema_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let db = open_sample(&temp_dir);
    let mut filter = EventFilter::new();
    filter.add_term(encode(9, 1), false).unwrap();

    let mut cursor = db.cursor().unwrap();
    assert!(matches!(
        cursor.set_filter(&filter),
        Err(StoreError::FilterRejected(_))
    ));
}
