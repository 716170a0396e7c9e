//! Serialization layer. JSON via serde_json, key order preserved.
//!
//! Implement [`Serializer`] if you need a different JSON flavour (sorted keys,
//! a different indent, etc.). The on-disk shape is always a single top-level
//! object mapping field names to values.

use crate::error::{Error, Result};
use serde::de::IgnoredAny;
use serde::Serialize;
use serde_json::{Map, Value};

/// Converts store snapshots to/from bytes for persistence.
pub trait Serializer: Send + Sync {
    /// Encode a snapshot to bytes.
    fn serialize(&self, snapshot: &Map<String, Value>) -> Result<Vec<u8>>;

    /// Decode bytes back into a snapshot. Fails if the bytes aren't JSON or the
    /// top level isn't an object.
    fn deserialize(&self, bytes: &[u8]) -> Result<Map<String, Value>>;

    /// `true` if `bytes` parse as any JSON value. Used to tell a finished write
    /// from a torn one.
    fn is_valid(&self, bytes: &[u8]) -> bool;
}

/// JSON serializer, pretty-printed with a four-space indent by default.
#[derive(Clone, Debug)]
pub struct JsonSerializer {
    pretty: bool,
}

impl Default for JsonSerializer {
    fn default() -> Self {
        Self::pretty()
    }
}

impl JsonSerializer {
    /// Compact JSON (single line, no extra whitespace).
    pub fn compact() -> Self {
        Self { pretty: false }
    }

    /// Pretty-printed JSON with indentation, easier to read by hand.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }

    /// Whether this serializer indents its output.
    pub fn is_pretty(&self) -> bool {
        self.pretty
    }
}

impl Serializer for JsonSerializer {
    fn serialize(&self, snapshot: &Map<String, Value>) -> Result<Vec<u8>> {
        if !self.pretty {
            return serde_json::to_vec(snapshot).map_err(Error::from);
        }
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        snapshot.serialize(&mut ser)?;
        Ok(buf)
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Map<String, Value>> {
        match serde_json::from_slice::<Value>(bytes)? {
            Value::Object(map) => Ok(map),
            other => Err(Error::Deserialize(format!(
                "expected a JSON object at the top level, found {}",
                kind_of(&other)
            ))),
        }
    }

    fn is_valid(&self, bytes: &[u8]) -> bool {
        serde_json::from_slice::<IgnoredAny>(bytes).is_ok()
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
