use crate::item::ItemKey;

/// Errors from key-value store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The requested item was not found.
    #[error("item not found: {0}")]
    NotFound(ItemKey),

    /// A write precondition did not hold (item exists on a non-overwriting
    /// put, expected attribute value differs, item missing).
    #[error("condition failed for {key}: {reason}")]
    ConditionFailed { key: ItemKey, reason: String },

    /// An increment targeted an attribute that does not hold a number.
    #[error("attribute {attribute} of {key} is not a number")]
    NotANumber { key: ItemKey, attribute: String },

    /// The backend could not serve the request.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Returns `true` if the error is a failed write precondition.
    pub fn is_condition_failed(&self) -> bool {
        matches!(self, Self::ConditionFailed { .. })
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
