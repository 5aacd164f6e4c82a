//! Error types for the lookup crate.

use thiserror::Error;

/// Errors raised while building records or evaluating lookups.
///
/// Every error is surfaced to the caller of the top-level operation. A
/// failing predicate is never skipped and no partial result is returned.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The raw input has a shape the classifier cannot map to a field.
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// The compound key is empty or tries to descend past a scalar.
    #[error("invalid path '{key}': {reason}")]
    InvalidPath { key: String, reason: String },

    /// A path segment names a field absent from the current node.
    #[error("field '{field}' not found (available: {available})")]
    UnknownField { field: String, available: String },

    /// The lookup does not accept the shape of the resolved field.
    #[error("lookup '{lookup}' cannot be applied to {shape} fields")]
    UnsupportedLookup { lookup: String, shape: &'static str },

    /// The two sides of a comparison cannot be compared.
    #[error("type mismatch in '{lookup}': cannot compare {left} with {right}")]
    TypeMismatch {
        lookup: String,
        left: &'static str,
        right: &'static str,
    },

    /// The operand does not have the shape the lookup expects.
    #[error("invalid argument for '{lookup}': {reason}")]
    InvalidArgument { lookup: String, reason: String },

    /// Invalid regular expression pattern.
    #[error("invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// `Node::filter` did not match.
    #[error("object not found")]
    ObjectNotFound,

    /// Input text is not valid JSON.
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading input failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl LookupError {
    pub(crate) fn invalid_path(key: &str, reason: impl Into<String>) -> Self {
        LookupError::InvalidPath {
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_argument(lookup: &str, reason: impl Into<String>) -> Self {
        LookupError::InvalidArgument {
            lookup: lookup.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for lookup operations.
pub type Result<T> = std::result::Result<T, LookupError>;
