use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info};
use vw_store::{KeyValueStore, StoreError};

use crate::bus::{BusEvent, EventBus};
use crate::change::ChangeSet;
use crate::config::{DEFAULT_EVENT_DETAIL_TYPE, DEFAULT_EVENT_SOURCE};
use crate::error::{LedgerError, LedgerResult};

/// What became of a change set notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The bus accepted the event.
    Delivered,
    /// The bus answered but reported the event as failed.
    Rejected { failed_count: usize, details: Vec<String> },
    /// The event could not be handed to the bus.
    Failed(String),
}

impl PublishOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

/// Persists change sets and announces them on the event bus.
///
/// Saving is durable and its failure is returned to the caller. Publishing
/// is best effort: failures are logged and reported as a [`PublishOutcome`],
/// never as an error.
pub struct ChangeSetPublisher<S: ?Sized, B: ?Sized> {
    store: Arc<S>,
    bus: Arc<B>,
    source: String,
    detail_type: String,
}

impl<S, B> ChangeSetPublisher<S, B>
where
    S: KeyValueStore + ?Sized,
    B: EventBus + ?Sized,
{
    pub fn new(store: Arc<S>, bus: Arc<B>) -> Self {
        Self::with_event_type(store, bus, DEFAULT_EVENT_SOURCE, DEFAULT_EVENT_DETAIL_TYPE)
    }

    pub fn with_event_type(
        store: Arc<S>,
        bus: Arc<B>,
        source: impl Into<String>,
        detail_type: impl Into<String>,
    ) -> Self {
        Self {
            store,
            bus,
            source: source.into(),
            detail_type: detail_type.into(),
        }
    }

    /// Write `change_set` at `(ACCOUNT#id, VERSION#n)`, replacing any record
    /// already there.
    pub async fn save_change_set(&self, change_set: &ChangeSet) -> LedgerResult<()> {
        let persistence = |source: StoreError| LedgerError::Persistence {
            account_id: change_set.account_id().to_string(),
            version: change_set.version(),
            source,
        };

        let item = vw_entity::marshal(change_set)?;
        self.store.put_item(item, true).await.map_err(persistence)?;

        debug!(
            account_id = change_set.account_id(),
            version = change_set.version(),
            changes = change_set.len(),
            "saved change set"
        );
        Ok(())
    }

    /// Announce `change_set` on the bus.
    pub async fn publish_change_set(&self, change_set: &ChangeSet) -> PublishOutcome {
        let account_id = change_set.account_id();
        let version = change_set.version();

        let detail = match serde_json::to_string(change_set) {
            Ok(detail) => detail,
            Err(e) => {
                error!(fatal = true, account_id, version, error = %e, "failed to serialize change set");
                return PublishOutcome::Failed(e.to_string());
            }
        };
        let event = BusEvent {
            source: self.source.clone(),
            detail_type: self.detail_type.clone(),
            time: Utc::now(),
            detail,
        };

        match self.bus.publish(vec![event]).await {
            Ok(ack) if ack.is_complete() => {
                info!(account_id, version, "published change set");
                PublishOutcome::Delivered
            }
            Ok(ack) => {
                error!(
                    fatal = true,
                    account_id,
                    version,
                    failed_count = ack.failed_count,
                    details = ?ack.details,
                    "change set event rejected"
                );
                PublishOutcome::Rejected {
                    failed_count: ack.failed_count,
                    details: ack.details,
                }
            }
            Err(e) => {
                error!(fatal = true, account_id, version, error = %e, "failed to publish change set");
                PublishOutcome::Failed(e.to_string())
            }
        }
    }

    /// Save, then publish.
    pub async fn commit(&self, change_set: &ChangeSet) -> LedgerResult<PublishOutcome> {
        self.save_change_set(change_set).await?;
        Ok(self.publish_change_set(change_set).await)
    }
}
