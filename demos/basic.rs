use json_sets::Store;
use serde_json::json;

fn main() -> Result<(), json_sets::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let path = std::env::temp_dir().join("json_sets_example_basic.json");
    let db = Store::open(&path)?;
    db.wait_for_load();

    let users = db.collection("users");
    let books = db.collection("books");
    println!("users = {:?}", users.to_array());
    println!("books = {:?}", books.to_array());

    users.add(json!({"id": 1, "name": "John Doe", "age": 25}));
    books.add(json!({"id": 1, "name": "The Lord of the Rings"}));

    println!("users = {:?}", users.to_array());
    println!("books = {:?}", books.to_array());

    // the autosave timer would pick this up; close flushes right away
    db.close();
    println!("On-disk JSON:\n{}", std::fs::read_to_string(&path)?);

    let _ = std::fs::remove_file(&path);
    Ok(())
}
