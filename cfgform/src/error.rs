//! Error types for the codec.
//!
//! Path and type errors are data errors: they abort the current projection
//! or assembly and always carry the offending field path. Transport errors
//! live in [`crate::transport`].

use thiserror::Error;

/// A field path could not be parsed or resolved.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PathError {
    /// The path string is not well formed.
    #[error("malformed path `{path}`: {reason}")]
    Malformed {
        /// Offending path.
        path: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A non-terminal segment points at something that is not a container.
    #[error("cannot descend into {found} at `{segment}` of `{path}`")]
    NotAContainer {
        /// Offending path.
        path: String,
        /// Segment that could not be descended into.
        segment: String,
        /// Kind of value found there.
        found: &'static str,
    },

    /// An indexed segment addresses an element past the end of a sequence.
    #[error("index {index} out of range (len {len}) at `{segment}` of `{path}`")]
    IndexOutOfRange {
        /// Offending path.
        path: String,
        /// Indexed segment.
        segment: String,
        /// Requested index.
        index: usize,
        /// Actual sequence length.
        len: usize,
    },
}

impl PathError {
    pub(crate) fn malformed(path: &str, reason: impl Into<String>) -> Self {
        PathError::Malformed {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    /// Path the error refers to.
    pub fn path(&self) -> &str {
        match self {
            PathError::Malformed { path, .. }
            | PathError::NotAContainer { path, .. }
            | PathError::IndexOutOfRange { path, .. } => path,
        }
    }
}

/// A value cannot be parsed as, or does not have the shape of, its declared kind.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("type mismatch at `{path}`: expected {expected}, got {actual}")]
pub struct TypeError {
    /// Path of the field.
    pub path: String,
    /// Description of the expected kind.
    pub expected: String,
    /// The rejected input, rendered for humans.
    pub actual: String,
}

impl TypeError {
    pub(crate) fn new(path: impl Into<String>, expected: impl Into<String>, actual: impl ToString) -> Self {
        TypeError {
            path: path.into(),
            expected: expected.into(),
            actual: actual.to_string(),
        }
    }
}

/// Any failure raised while projecting or assembling a document.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    /// Path parsing or resolution failed.
    #[error(transparent)]
    Path(#[from] PathError),
    /// Value decoding or encoding failed.
    #[error(transparent)]
    Type(#[from] TypeError),
}

impl CodecError {
    /// Path of the field that caused the error.
    pub fn path(&self) -> &str {
        match self {
            CodecError::Path(e) => e.path(),
            CodecError::Type(e) => &e.path,
        }
    }
}

/// Name of a JSON value's type, for error messages.
pub(crate) fn value_type_name(value: &serde_json::Value) -> &'static str {
    use serde_json::Value;
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}
