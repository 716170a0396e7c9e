//! Named, ordered collection of JSON records.

use crate::error::{Error, Result};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::sync::Arc;

/// An ordered list of records with a stable name.
///
/// `Collection` is a handle: clones share the same rows, so the copy you get
/// from [`Store::collection`](crate::Store::collection) sees every record the
/// store persists and vice versa. Rows keep insertion order and duplicates are
/// allowed.
///
/// Persists as `{ "name": <string>, "rows": [<record>, ...] }`.
#[derive(Clone)]
pub struct Collection {
    inner: Arc<Inner>,
}

struct Inner {
    name: String,
    rows: RwLock<Vec<Value>>,
}

impl Collection {
    /// Empty collection called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_rows(name, Vec::new())
    }

    /// Collection called `name`, pre-populated with `rows` in order.
    pub fn with_rows(name: impl Into<String>, rows: Vec<Value>) -> Self {
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                rows: RwLock::new(rows),
            }),
        }
    }

    /// The collection's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Append a record. No uniqueness check.
    pub fn add(&self, record: impl Into<Value>) {
        self.inner.rows.write().push(record.into());
    }

    /// Append any serde-serializable record.
    pub fn add_serialized<T: Serialize + ?Sized>(&self, record: &T) -> Result<()> {
        let value = serde_json::to_value(record).map_err(|e| Error::Serialize(e.to_string()))?;
        self.add(value);
        Ok(())
    }

    /// Copy of all rows in insertion order. Mutating it doesn't touch the
    /// collection.
    #[must_use]
    pub fn to_array(&self) -> Vec<Value> {
        self.inner.rows.read().clone()
    }

    /// Decode every row as `T`. Fails on the first row that doesn't fit.
    pub fn rows_as<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        self.inner
            .rows
            .read()
            .iter()
            .enumerate()
            .map(|(i, row)| {
                T::deserialize(row).map_err(|e| {
                    Error::TypeMismatch(format!("row {i} of '{}': {e}", self.inner.name))
                })
            })
            .collect()
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.rows.read().len()
    }

    /// `true` when there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.rows.read().is_empty()
    }

    /// Drop all rows.
    pub fn clear(&self) {
        self.inner.rows.write().clear();
    }

    /// `true` if both handles point at the same rows.
    #[must_use]
    pub fn ptr_eq(&self, other: &Collection) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn replace_rows(&self, rows: Vec<Value>) {
        *self.inner.rows.write() = rows;
    }

    pub(crate) fn take_rows(&self) -> Vec<Value> {
        std::mem::take(&mut *self.inner.rows.write())
    }
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.inner.name)
            .field("rows", &self.len())
            .finish()
    }
}

#[derive(Serialize)]
struct WireRef<'a> {
    name: &'a str,
    rows: &'a [Value],
}

#[derive(Deserialize)]
struct Wire {
    name: String,
    rows: Vec<Value>,
}

impl Serialize for Collection {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let rows = self.inner.rows.read();
        WireRef {
            name: &self.inner.name,
            rows: &rows,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Collection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let wire = Wire::deserialize(deserializer)?;
        Ok(Collection::with_rows(wire.name, wire.rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn add_keeps_order_and_duplicates() {
        let c = Collection::new("users");
        c.add(json!({"id": 1}));
        c.add(json!({"id": 2}));
        c.add(json!({"id": 1}));
        assert_eq!(c.to_array(), vec![json!({"id": 1}), json!({"id": 2}), json!({"id": 1})]);
        assert_eq!(c.len(), 3);
    }

    #[test]
    fn to_array_is_a_copy() {
        let c = Collection::with_rows("n", vec![json!(1)]);
        let mut snap = c.to_array();
        snap.push(json!(2));
        snap[0] = json!("changed");
        assert_eq!(c.to_array(), vec![json!(1)]);
    }

    #[test]
    fn clones_share_rows() {
        let a = Collection::new("shared");
        let b = a.clone();
        b.add("x");
        assert_eq!(a.to_array(), vec![json!("x")]);
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&Collection::new("shared")));
    }

    #[test]
    fn serializes_as_name_and_rows() {
        let c = Collection::with_rows("items", vec![json!({"id": 1, "name": "a"})]);
        assert_eq!(
            serde_json::to_string(&c).unwrap(),
            r#"{"name":"items","rows":[{"id":1,"name":"a"}]}"#
        );
    }

    #[test]
    fn deserializes_from_name_and_rows() {
        let c: Collection = serde_json::from_value(json!({"name": "b", "rows": [1, 2]})).unwrap();
        assert_eq!(c.name(), "b");
        assert_eq!(c.to_array(), vec![json!(1), json!(2)]);
    }

    #[test]
    fn typed_rows() {
        #[derive(Serialize, Deserialize, Debug, PartialEq)]
        struct Book {
            id: u32,
            title: String,
        }

        let c = Collection::new("books");
        c.add_serialized(&Book { id: 1, title: "Dune".into() }).unwrap();
        assert_eq!(
            c.rows_as::<Book>().unwrap(),
            vec![Book { id: 1, title: "Dune".into() }]
        );

        c.add("not a book");
        assert!(matches!(c.rows_as::<Book>(), Err(Error::TypeMismatch(_))));
    }
}
