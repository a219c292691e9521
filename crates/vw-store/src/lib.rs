//! Key-value store boundary for Virtwallet.
//!
//! Every Virtwallet record lives in a store addressed by a composite
//! hash/range key. This crate defines the store-native data model and the
//! primitive operations the persistence layer is allowed to use.
//!
//! # Data Model
//!
//! - [`AttributeValue`] -- store-native value (string, decimal number, map, ...)
//! - [`ItemKey`] -- hash/range primary key
//! - [`Item`] -- key plus attribute map
//! - [`ItemUpdate`] -- atomic single-item update with [`Condition`]s
//!
//! # Storage Backends
//!
//! All backends implement the [`KeyValueStore`] trait:
//!
//! - [`InMemoryKeyValueStore`] -- `BTreeMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. Single-item operations are atomic; there are no multi-item transactions.
//! 2. Batch writes report per-item outcomes and never fail as a unit.
//! 3. The store never interprets attribute semantics -- typing is the codec's job.

pub mod error;
pub mod item;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use item::{
    AttributePath, AttributeValue, Attributes, Condition, Item, ItemKey, ItemUpdate,
    RangeCondition, ValueKind,
};
pub use memory::InMemoryKeyValueStore;
pub use traits::KeyValueStore;
