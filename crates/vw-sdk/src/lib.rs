//! Virtwallet SDK.
//!
//! Account and category services built on the typed persistence layer:
//! every mutation goes through the attribute codec and is recorded as an
//! account version. [`Virtwallet`] is the main entry point.

pub mod account;
pub mod category;
pub mod client;
pub mod error;

pub use account::{Account, AccountService, NewAccount};
pub use category::{
    Budget, BudgetType, Category, CategoryList, CategoryService, NewCategory, UPDATABLE_ATTRIBUTES,
};
pub use client::Virtwallet;
pub use error::{SdkError, SdkResult};

// Re-export key types
pub use vw_ledger::{ChangeSet, ItemChange, LedgerConfig, Operation};
pub use vw_store::{KeyValueStore, StoreError};
