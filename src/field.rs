//! Top-level store values: a [`Collection`] or a plain JSON value.
//!
//! The file format has no type tags. A persisted object that carries a `rows`
//! array comes back as a collection; anything else is a scalar. That rule is
//! the only way the loader tells the two apart, so a scalar object that
//! happens to have a `rows` array will reload as a collection.

use crate::collection::Collection;
use serde_json::Value;

/// One named entry of a [`Store`](crate::Store).
#[derive(Debug, Clone)]
pub enum Field {
    /// A named, ordered list of records.
    Collection(Collection),
    /// Any other JSON value, persisted verbatim.
    Scalar(Value),
}

impl Field {
    /// Rebuild a field from its persisted form under `key`.
    pub fn from_persisted(key: &str, value: Value) -> Self {
        match value {
            Value::Object(mut obj) if obj.get("rows").map_or(false, Value::is_array) => {
                let rows = match obj.remove("rows") {
                    Some(Value::Array(rows)) => rows,
                    _ => Vec::new(),
                };
                let name = match obj.remove("name") {
                    Some(Value::String(name)) => name,
                    _ => key.to_owned(),
                };
                Field::Collection(Collection::with_rows(name, rows))
            }
            other => Field::Scalar(other),
        }
    }

    /// The value written to disk for this field.
    pub fn to_value(&self) -> Value {
        match self {
            Field::Collection(c) => serde_json::json!({
                "name": c.name(),
                "rows": c.to_array(),
            }),
            Field::Scalar(v) => v.clone(),
        }
    }

    /// The collection, if this is one.
    pub fn as_collection(&self) -> Option<&Collection> {
        match self {
            Field::Collection(c) => Some(c),
            Field::Scalar(_) => None,
        }
    }

    /// The scalar value, if this is one.
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            Field::Scalar(v) => Some(v),
            Field::Collection(_) => None,
        }
    }
}

impl From<Collection> for Field {
    fn from(c: Collection) -> Self {
        Field::Collection(c)
    }
}

impl From<Value> for Field {
    fn from(v: Value) -> Self {
        Field::Scalar(v)
    }
}
