use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("store error: {0}")]
    Store(#[from] vw_store::StoreError),

    #[error("codec error: {0}")]
    Codec(#[from] vw_entity::CodecError),

    #[error("ledger error: {0}")]
    Ledger(#[from] vw_ledger::LedgerError),
}

pub type SdkResult<T> = Result<T, SdkError>;
