#![allow(dead_code)]

use json_sets::{Store, StoreBuilder};
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Route store logs to the test output. Set `RUST_LOG=json_sets=debug` to see them.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Builder with no settle delay, no debounce, and an autosave interval long
/// enough that it never fires during a test.
pub fn quick(path: &Path) -> StoreBuilder {
    init_logging();
    Store::builder(path)
        .settle_delay(Duration::ZERO)
        .save_debounce(Duration::ZERO)
        .save_interval(Duration::from_secs(3600))
}

pub fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}
