use thiserror::Error;

use crate::attribute::AttributeType;

/// Errors raised while converting between entities and store items.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// A value's encoding disagrees with the attribute's declared type.
    #[error("type mismatch for attribute {attribute}: expected {expected}, found {found}")]
    TypeMismatch {
        attribute: String,
        expected: AttributeType,
        found: String,
    },

    /// A number attribute holds text that is not a finite decimal.
    #[error("invalid number for attribute {attribute}: {value}")]
    InvalidNumber { attribute: String, value: String },

    /// A versioned JSON attribute is missing its payload or version.
    #[error("malformed versioned attribute {attribute}: {reason}")]
    MalformedVersioned { attribute: String, reason: String },

    /// The attribute is not declared by the entity's type map.
    #[error("unknown attribute: {0}")]
    UnknownAttribute(String),

    /// The entity did not serialize to a JSON object.
    #[error("entity {0} does not serialize to an object")]
    NotAnObject(String),

    /// JSON encoding or decoding failed.
    #[error("json error: {0}")]
    Json(String),
}

impl From<serde_json::Error> for CodecError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e.to_string())
    }
}

/// Result alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;
