//! Embeddable single-file JSON document store.
//!
//! Declare named collections of records and plain values, mutate them in
//! memory, and the store writes the whole thing to one JSON file on a timer.
//! Writes go through a temporary file and a rename, and a leftover temporary
//! file is promoted on the next start, so a crash mid-write never leaves a
//! half-written database behind.
//!
//! ```rust,no_run
//! use json_sets::Store;
//! use serde_json::json;
//!
//! let db = Store::open("db.json").unwrap();
//! db.wait_for_load();
//!
//! let users = db.collection("users");
//! users.add(json!({"id": 1, "name": "John Doe"}));
//! db.set("schema_version", 3);
//!
//! db.close();
//! ```
//!
//! **Single-process only.** If two stores (in one process or several) point at
//! the same file they will clobber each other. There is no file locking.
//!
//! All persistence problems are logged through `tracing` and never returned;
//! install a subscriber if you want to see them.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod autosave;
pub mod collection;
pub mod config;
pub mod error;
pub mod field;
pub mod persist;
pub mod serializer;
pub mod signal;
pub mod store;

pub use collection::Collection;
pub use config::StoreOptions;
pub use error::{Error, Result};
pub use field::Field;
pub use store::{Store, StoreBuilder, StoreHandle, Tick};
