//! Error types for dialog-memory.
//!
//! Read misses are not errors: lookups return `Option`. Everything here is a
//! write-side or configuration failure.

use thiserror::Error;

/// Result type alias using dialog-memory's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while addressing memory.
#[derive(Error, Debug)]
pub enum Error {
    /// Index is strictly greater than the current list length
    #[error("Index {index} out of range for list of length {len} at '{path}'")]
    IndexOutOfRange { path: String, index: i64, len: usize },

    /// Numeric segment applied to a value that is not a list
    #[error("'{segment}' in '{path}' indexes a value that is not a list")]
    NotAList { path: String, segment: String },

    /// Name segment applied to a value that is not a container
    #[error("'{segment}' in '{path}' names a property of a value that is not an object")]
    NotAnObject { path: String, segment: String },

    /// An intermediate container does not exist
    #[error("'{segment}' in '{path}' does not exist")]
    PathNotFound { path: String, segment: String },

    /// Write against a read-only view, scope or property
    #[error("'{target}' is read-only")]
    ReadOnly { target: String },

    /// Path does not start with a registered scope
    #[error("'{name}' does not match memory scopes: [{available}]")]
    UnknownScope { name: String, available: String },

    /// A typed property rejected the assigned value
    #[error("Property '{property}' rejected value: {message}")]
    PropertyType { property: String, message: String },

    /// Value cannot be represented in the requested form
    #[error("Unsupported conversion: {0}")]
    UnsupportedConversion(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an index out of range error.
    pub fn index_out_of_range(path: impl Into<String>, index: i64, len: usize) -> Self {
        Self::IndexOutOfRange {
            path: path.into(),
            index,
            len,
        }
    }

    /// Create a not-a-list error.
    pub fn not_a_list(path: impl Into<String>, segment: impl Into<String>) -> Self {
        Self::NotAList {
            path: path.into(),
            segment: segment.into(),
        }
    }

    /// Create a not-an-object error.
    pub fn not_an_object(path: impl Into<String>, segment: impl Into<String>) -> Self {
        Self::NotAnObject {
            path: path.into(),
            segment: segment.into(),
        }
    }

    /// Create a path not found error.
    pub fn path_not_found(path: impl Into<String>, segment: impl Into<String>) -> Self {
        Self::PathNotFound {
            path: path.into(),
            segment: segment.into(),
        }
    }

    /// Create a read-only error.
    pub fn read_only(target: impl Into<String>) -> Self {
        Self::ReadOnly {
            target: target.into(),
        }
    }

    /// Create an unknown scope error listing the scopes that do exist.
    pub fn unknown_scope<'a>(
        name: impl Into<String>,
        available: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        Self::UnknownScope {
            name: name.into(),
            available: available.into_iter().collect::<Vec<_>>().join(","),
        }
    }

    /// Create a property type error.
    pub fn property_type(property: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PropertyType {
            property: property.into(),
            message: message.into(),
        }
    }

    /// Whether this error is a read-only violation.
    ///
    /// Stores that swallow write failures still propagate these.
    pub fn is_read_only(&self) -> bool {
        matches!(self, Self::ReadOnly { .. })
    }
}
