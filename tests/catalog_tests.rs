use mkswitch::db::*;
use mkswitch::error::CatalogError;
use mkswitch::snowflake::IdWorker;

fn test_db() -> CatalogDB {
    CatalogDB::open(":memory:").expect("in-memory db")
}

#[test]
fn search_matches_any_of_four_fields() {
    let db = test_db();
    db.upsert_switch(SwitchInput::new("abc Red", "Gateron")).unwrap();
    db.upsert_switch(SwitchInput::new("Brown", "xabcx")).unwrap();
    db.upsert_switch(SwitchInput::new("Blue", "Kailh").manufacturer("abc")).unwrap();
    db.upsert_switch(SwitchInput::new("Black", "Kailh").tag("linear,abc")).unwrap();
    db.upsert_switch(SwitchInput::new("Silver", "Cherry").kind("abc")).unwrap();
    db.upsert_switch(SwitchInput::new("Green", "Cherry")).unwrap();

    let page = db.list_switches(0, 100, Some("abc")).unwrap();
    let mut names: Vec<_> = page.items.iter().map(|s| s.name.as_str()).collect();
    names.sort();
    // `type` is not a search field
    assert_eq!(names, vec!["Black", "Blue", "Brown", "abc Red"]);
    assert_eq!(page.total, 4);
}

#[test]
fn search_is_case_sensitive() {
    let db = test_db();
    db.upsert_switch(SwitchInput::new("Box White", "Kailh")).unwrap();
    assert_eq!(db.list_switches(0, 10, Some("box")).unwrap().total, 0);
    assert_eq!(db.list_switches(0, 10, Some("Box")).unwrap().total, 1);
}

#[test]
fn total_ignores_pagination() {
    let db = test_db();
    for i in 0..7 {
        db.upsert_switch(SwitchInput::new(format!("sw{i}"), "Kailh")).unwrap();
    }
    let p = db.list_switches(5, 5, None).unwrap();
    assert_eq!(p.items.len(), 2);
    assert_eq!(p.total, 7);

    let all = db.list_switches(-3, -1, None).unwrap();
    assert_eq!(all.items.len(), 7);

    let none = db.list_switches(0, 0, None).unwrap();
    assert!(none.items.is_empty());
    assert_eq!(none.total, 7);
}

#[test]
fn duplicate_create_writes_no_row_but_keeps_keyword() {
    let db = test_db();
    let first = db.upsert_switch(SwitchInput::new("Box White", "Kailh")).unwrap();
    let err = db.upsert_switch(SwitchInput::new("Box White", "Gateron")).unwrap_err();
    assert!(matches!(err, CatalogError::NameExists));

    let page = db.list_switches(0, 10, None).unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].id, first.id);
    assert_eq!(page.items[0].studio, "Kailh");
    assert_eq!(db.list_keyword_words(STUDIO_KEYWORD_TYPE, None).unwrap(), vec!["Gateron", "Kailh"]);
}

#[test]
fn rejected_update_leaves_target_unchanged() {
    let db = test_db();
    db.upsert_switch(SwitchInput::new("Box White", "Kailh")).unwrap();
    let target = db
        .upsert_switch(SwitchInput::new("Oil King", "Gateron").price(0.6))
        .unwrap();
    let before = db.get_switch(&target.id).unwrap().unwrap();

    let err = db
        .upsert_switch(SwitchInput::new("Box White", "Gateron").id(target.id.clone()).price(9.9))
        .unwrap_err();
    assert!(matches!(err, CatalogError::DuplicateName));
    assert_eq!(db.get_switch(&target.id).unwrap().unwrap(), before);
}

#[test]
fn custom_worker_ids_are_used() {
    let db = test_db().with_id_worker(IdWorker::new(3, 1).unwrap());
    let out = db.upsert_switch(SwitchInput::new("Box White", "Kailh")).unwrap();
    let id: u64 = out.id.parse().unwrap();
    assert_eq!((id >> 12) & 0x1f, 3);
    assert_eq!((id >> 17) & 0x1f, 1);
}

#[test]
fn ids_are_unique_across_many_creates() {
    let db = test_db();
    let mut ids = std::collections::HashSet::new();
    for i in 0..200 {
        let out = db.upsert_switch(SwitchInput::new(format!("sw{i}"), "Kailh")).unwrap();
        assert!(ids.insert(out.id));
    }
}

#[test]
fn concurrent_creates_with_same_name_store_one_row() {
    let path = std::env::temp_dir().join(format!("mkswitch-race-{}.db", std::process::id()));
    let path_str = path.to_string_lossy().to_string();
    let _ = std::fs::remove_file(&path);
    let db = std::sync::Arc::new(CatalogDB::open(&path_str).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let db = db.clone();
            std::thread::spawn(move || db.upsert_switch(SwitchInput::new("Box White", "Kailh")))
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, CatalogError::NameExists)));
    assert_eq!(db.stats().unwrap().switches, 1);

    drop(db);
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{path_str}{suffix}"));
    }
}

#[test]
fn keyword_upsert_is_idempotent_per_word_and_type() {
    let db = test_db();
    db.upsert_keyword(KeywordInput::new("Kailh", "studio").rank(1)).unwrap();
    db.upsert_keyword(KeywordInput::new("Kailh", "studio").rank(4)).unwrap();
    let page = db.page_keywords("studio", None, 0, None).unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].rank, 4);
}
