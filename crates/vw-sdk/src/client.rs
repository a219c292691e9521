use std::sync::Arc;

use tracing::info;
use vw_ledger::{AccountLedger, EventBus, InMemoryEventBus, LedgerConfig};
use vw_store::{InMemoryKeyValueStore, KeyValueStore};

use crate::account::AccountService;
use crate::category::CategoryService;

/// Entry point for applications embedding Virtwallet.
///
/// Wires one store, one event bus, and one [`LedgerConfig`] into the
/// entity services.
pub struct Virtwallet<S: ?Sized, B: ?Sized> {
    ledger: Arc<AccountLedger<S, B>>,
    accounts: AccountService<S, B>,
    categories: CategoryService<S, B>,
}

impl Virtwallet<InMemoryKeyValueStore, InMemoryEventBus> {
    /// A self-contained instance backed by the in-memory store and bus.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryKeyValueStore::new()),
            Arc::new(InMemoryEventBus::new()),
        )
    }
}

impl<S, B> Virtwallet<S, B>
where
    S: KeyValueStore + ?Sized,
    B: EventBus + ?Sized,
{
    pub fn new(store: Arc<S>, bus: Arc<B>) -> Self {
        Self::with_config(store, bus, LedgerConfig::default())
    }

    pub fn with_config(store: Arc<S>, bus: Arc<B>, config: LedgerConfig) -> Self {
        info!(
            event_source = %config.event_source,
            max_retries = config.retry.max_retries,
            id_width = config.id_width,
            "initializing virtwallet"
        );
        let ledger = Arc::new(AccountLedger::with_config(store, bus, config));
        Self {
            accounts: AccountService::new(Arc::clone(&ledger)),
            categories: CategoryService::new(Arc::clone(&ledger)),
            ledger,
        }
    }

    pub fn accounts(&self) -> &AccountService<S, B> {
        &self.accounts
    }

    pub fn categories(&self) -> &CategoryService<S, B> {
        &self.categories
    }

    pub fn ledger(&self) -> &AccountLedger<S, B> {
        &self.ledger
    }
}
