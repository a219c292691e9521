use std::sync::Arc;

use tracing::{debug, instrument};
use vw_store::KeyValueStore;

use crate::bus::EventBus;
use crate::change::{ChangeSet, ItemChange};
use crate::config::LedgerConfig;
use crate::counter::VersionCounter;
use crate::error::LedgerResult;
use crate::metadata::AccountMetadata;
use crate::publisher::{ChangeSetPublisher, PublishOutcome};
use crate::sequence::SequenceAllocator;

/// A recorded account version.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Recorded {
    pub change_set: ChangeSet,
    pub publication: PublishOutcome,
}

/// The persistence primitives entity services build on: identifier
/// allocation, account versioning, and change set publication, sharing one
/// store and one bus.
pub struct AccountLedger<S: ?Sized, B: ?Sized> {
    store: Arc<S>,
    sequences: SequenceAllocator<S>,
    counter: VersionCounter<S>,
    publisher: ChangeSetPublisher<S, B>,
    config: LedgerConfig,
}

impl<S, B> AccountLedger<S, B>
where
    S: KeyValueStore + ?Sized,
    B: EventBus + ?Sized,
{
    pub fn new(store: Arc<S>, bus: Arc<B>) -> Self {
        Self::with_config(store, bus, LedgerConfig::default())
    }

    pub fn with_config(store: Arc<S>, bus: Arc<B>, config: LedgerConfig) -> Self {
        Self {
            sequences: SequenceAllocator::new(Arc::clone(&store)),
            counter: VersionCounter::new(Arc::clone(&store), config.retry.clone()),
            publisher: ChangeSetPublisher::with_event_type(
                Arc::clone(&store),
                bus,
                config.event_source.clone(),
                config.event_detail_type.clone(),
            ),
            store,
            config,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn sequences(&self) -> &SequenceAllocator<S> {
        &self.sequences
    }

    pub fn counter(&self) -> &VersionCounter<S> {
        &self.counter
    }

    pub fn publisher(&self) -> &ChangeSetPublisher<S, B> {
        &self.publisher
    }

    /// Write the metadata record of a new account at version 0.
    pub async fn open_account(&self, account_id: &str) -> LedgerResult<AccountMetadata> {
        let metadata = AccountMetadata::new(account_id);
        self.store
            .put_item(vw_entity::marshal(&metadata)?, false)
            .await?;
        Ok(metadata)
    }

    /// Give `changes` the next version of `account_id`, then save and publish
    /// the resulting change set.
    ///
    /// No version is consumed when `changes` is empty.
    #[instrument(skip(self, changes), fields(changes = changes.len()))]
    pub async fn record(
        &self,
        account_id: &str,
        changes: Vec<ItemChange>,
    ) -> LedgerResult<Option<Recorded>> {
        if changes.is_empty() {
            debug!("nothing changed, no version recorded");
            return Ok(None);
        }
        let change_set = self.counter.get_version(account_id, changes).await?;
        let publication = self.publisher.commit(&change_set).await?;
        Ok(Some(Recorded {
            change_set,
            publication,
        }))
    }
}
