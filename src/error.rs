//! Unified error type for the store.
//!
//! The persistence engine logs these and moves on; only the builder and the
//! typed accessors hand them back to the caller.

/// Things that can go wrong when using the store.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// File system problem (read, write, rename).
    Io(String),
    /// Failed to serialize the snapshot or a record to JSON.
    Serialize(String),
    /// Failed to parse bytes as JSON.
    Deserialize(String),
    /// Bad configuration (empty path, zero interval, etc.).
    Config(String),
    /// The temporary file did not survive post-write validation.
    Verify(String),
    /// A field exists but doesn't have the requested shape.
    TypeMismatch(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(msg) => write!(f, "i/o error: {msg}"),
            Error::Serialize(msg) => write!(f, "serialization error: {msg}"),
            Error::Deserialize(msg) => write!(f, "deserialization error: {msg}"),
            Error::Config(msg) => write!(f, "config error: {msg}"),
            Error::Verify(msg) => write!(f, "verification error: {msg}"),
            Error::TypeMismatch(msg) => write!(f, "type mismatch: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        use serde_json::error::Category;
        match err.classify() {
            Category::Io => Error::Io(err.to_string()),
            Category::Syntax | Category::Eof => Error::Deserialize(err.to_string()),
            // well-formed JSON that doesn't fit the requested type
            Category::Data => Error::TypeMismatch(err.to_string()),
        }
    }
}

/// Result alias using our [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;
