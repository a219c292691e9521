//! Typed entities for Virtwallet.
//!
//! This crate sits between domain records and the raw key-value store:
//!
//! - [`AttributeType`] / [`AttributeTypeMap`]: per-entity declaration of how
//!   each field is stored
//! - [`codec`]: marshal/unmarshal entities and build conditional updates
//! - [`Entity`]: the capability every persisted record implements: hash key,
//!   range key, attribute types, type tag
//! - [`keys`]: the key policy (`ACCOUNT#…`, `USER#…`, `{TAG}#{id}`)
//! - [`Versioned`]: values that carry their own sub-version

pub mod attribute;
pub mod codec;
pub mod entity;
pub mod error;
pub mod keys;
pub mod versioned;

pub use attribute::{AttributeType, AttributeTypeMap};
pub use codec::{marshal, marshal_update, unmarshal, unmarshal_into};
pub use entity::Entity;
pub use error::{CodecError, CodecResult};
pub use keys::{account_hash_key, format_local_id, range_key, range_prefix, user_hash_key};
pub use versioned::{Versioned, INITIAL_VERSION, VERSION_FIELD};
