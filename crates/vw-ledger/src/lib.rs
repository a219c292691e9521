//! Account version history for Virtwallet.
//!
//! Every mutation of an account's entities is recorded as a [`ChangeSet`]:
//! the list of items it touched, stamped with the next account version.
//!
//! - [`SequenceAllocator`]: increasing entity identifiers per key prefix
//! - [`VersionCounter`]: atomic, retry-bounded account version increments
//! - [`builder`]: per-item write results to [`ItemChange`] lists
//! - [`ChangeSetPublisher`]: durable save plus best-effort bus notification
//! - [`AccountLedger`]: the above wired to one store, bus and config

pub mod builder;
pub mod bus;
pub mod change;
pub mod config;
pub mod counter;
pub mod error;
pub mod ledger;
pub mod metadata;
pub mod publisher;
pub mod retry;
pub mod sequence;

pub use builder::{changes_from_results, created_changes, deleted_changes, updated_changes};
pub use bus::{BusEvent, BusMode, EventBus, InMemoryEventBus, PublishAck};
pub use change::{ChangeSet, ItemChange, Operation, VERSION_TAG};
pub use config::{LedgerConfig, DEFAULT_EVENT_DETAIL_TYPE, DEFAULT_EVENT_SOURCE};
pub use counter::VersionCounter;
pub use error::{BusError, LedgerError, LedgerResult};
pub use ledger::{AccountLedger, Recorded};
pub use metadata::{AccountMetadata, METADATA_TAG, VERSION_ATTRIBUTE};
pub use publisher::{ChangeSetPublisher, PublishOutcome};
pub use retry::{Backoff, RetryPolicy, MAX_RETRIES};
pub use sequence::{SequenceAllocator, SEQUENCE_ATTRIBUTE, SEQUENCE_TAG};
