use json_sets::Store;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize, Deserialize)]
struct Task {
    id: u32,
    title: String,
    done: bool,
}

fn main() -> Result<(), json_sets::Error> {
    let path = std::env::temp_dir().join("json_sets_example_builder.json");

    // compact JSON, autosave every second, no settle delay
    let db = Store::builder(&path)
        .pretty(false)
        .save_interval(Duration::from_secs(1))
        .settle_delay(Duration::ZERO)
        .build()?;
    db.wait_for_load();

    let tasks = db.collection("tasks");
    tasks.add_serialized(&Task { id: 1, title: "write docs".into(), done: false })?;
    tasks.add_serialized(&Task { id: 2, title: "ship it".into(), done: true })?;
    db.set("owner", "json-sets");

    // give the timer a chance to run
    std::thread::sleep(Duration::from_millis(1500));
    println!("On-disk JSON: {}", std::fs::read_to_string(db.path())?);

    let typed: Vec<Task> = tasks.rows_as()?;
    println!("typed rows: {typed:?}");
    println!("\nDebug output: {db:?}");

    db.close();
    let _ = std::fs::remove_file(&path);
    Ok(())
}
