mod common;

use common::{quick, read_json};
use json_sets::persist::tmp_path;
use serde_json::json;
use std::fs;

#[test]
fn valid_temp_file_is_promoted_on_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("db.json");
    let tmp = tmp_path(&path);
    assert_eq!(tmp, dir.path().join("db.tmp.json"));

    let newer = r#"{"a": {"name": "a", "rows": [1, 2]}, "v": 2}"#;
    fs::write(&path, r#"{"v": 1}"#).unwrap();
    fs::write(&tmp, newer).unwrap();

    let db = quick(&path).build().unwrap();
    db.wait_for_load();

    assert_eq!(fs::read_to_string(&path).unwrap(), newer);
    assert!(!tmp.exists());
    assert_eq!(db.get("v"), Some(json!(2)));
    assert_eq!(db.get_collection("a").unwrap().to_array(), vec![json!(1), json!(2)]);
}

#[test]
fn valid_temp_file_without_canonical_is_promoted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("db.json");
    fs::write(tmp_path(&path), r#"{"only": "tmp"}"#).unwrap();

    let db = quick(&path).build().unwrap();
    db.wait_for_load();

    assert!(path.exists());
    assert!(!tmp_path(&path).exists());
    assert_eq!(db.get("only"), Some(json!("tmp")));
}

#[test]
fn torn_temp_file_is_left_alone() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("db.json");
    let canonical = r#"{"items": {"name": "items", "rows": [{"id": 1}]}}"#;
    fs::write(&path, canonical).unwrap();
    fs::write(tmp_path(&path), r#"{"items": {"name": "items", "rows": [{"id"#).unwrap();

    let db = quick(&path).build().unwrap();
    db.wait_for_load();

    assert_eq!(fs::read_to_string(&path).unwrap(), canonical);
    assert!(tmp_path(&path).exists());
    assert_eq!(
        db.get_collection("items").unwrap().to_array(),
        vec![json!({"id": 1})]
    );
}

#[test]
fn save_leaves_no_temp_file_behind() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("db.json");
    let db = quick(&path).build().unwrap();
    db.wait_for_load();

    db.collection("log").add("first");
    assert!(db.save());
    db.collection("log").add("second");
    assert!(db.save());

    assert!(!tmp_path(&path).exists());
    assert_eq!(read_json(&path), json!({"log": {"name": "log", "rows": ["first", "second"]}}));
}

#[test]
fn save_overwrites_a_stale_torn_temp_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("db.json");
    fs::write(&path, r#"{"n": 1}"#).unwrap();
    fs::write(tmp_path(&path), "{\"n\": ").unwrap();

    let db = quick(&path).build().unwrap();
    db.wait_for_load();
    db.set("n", 2);
    assert!(db.save());

    assert!(!tmp_path(&path).exists());
    assert_eq!(read_json(&path), json!({"n": 2}));
}

#[test]
fn extensionless_path_uses_appended_tmp() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("database");
    fs::write(dir.path().join("database.tmp"), r#"{"x": true}"#).unwrap();

    let db = quick(&path).build().unwrap();
    db.wait_for_load();

    assert_eq!(db.get("x"), Some(json!(true)));
    assert!(!dir.path().join("database.tmp").exists());
}

#[test]
fn canonical_is_always_complete_across_many_saves() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("db.json");
    let db = quick(&path).pretty(false).build().unwrap();
    db.wait_for_load();
    let rows = db.collection("rows");

    for i in 0..50 {
        rows.add(json!({"i": i, "pad": "x".repeat(256)}));
        assert!(db.save());
        let on_disk = read_json(&path);
        assert_eq!(on_disk["rows"]["rows"].as_array().unwrap().len(), i + 1);
    }
}
