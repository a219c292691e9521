use vw_entity::CodecError;
use vw_store::{ItemKey, StoreError};

/// Errors produced by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// The account version could not be incremented within the retry budget.
    #[error("version conflict for account {account_id} after {attempts} attempts")]
    VersionConflict { account_id: String, attempts: u32 },

    /// The change set record itself could not be written.
    #[error("failed to persist change set {version} of account {account_id}: {source}")]
    Persistence {
        account_id: String,
        version: u64,
        #[source]
        source: StoreError,
    },

    /// A counter record came back without a usable value.
    #[error("counter {attribute} of {key} is missing or invalid")]
    CorruptCounter { key: ItemKey, attribute: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

/// Result alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors reported by an event bus transport.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BusError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}
