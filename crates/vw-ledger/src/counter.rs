use std::sync::Arc;

use tracing::{debug, warn};
use vw_entity::Entity;
use vw_store::{ItemKey, KeyValueStore};

use crate::change::{ChangeSet, ItemChange};
use crate::error::{LedgerError, LedgerResult};
use crate::metadata::{AccountMetadata, VERSION_ATTRIBUTE};
use crate::retry::RetryPolicy;

/// Hands out account versions through an atomic increment of the account's
/// metadata record.
///
/// Every successful call yields a version strictly greater than any version
/// previously handed out for the same account. Failed increments are retried
/// under the configured [`RetryPolicy`]; once the budget is spent the call
/// fails with [`LedgerError::VersionConflict`].
pub struct VersionCounter<S: ?Sized> {
    store: Arc<S>,
    policy: RetryPolicy,
}

impl<S: KeyValueStore + ?Sized> VersionCounter<S> {
    pub fn new(store: Arc<S>, policy: RetryPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Key of the metadata record holding `account_id`'s version.
    pub fn metadata_key(account_id: &str) -> ItemKey {
        AccountMetadata::new(account_id).key()
    }

    /// Allocate the next version of `account_id` and wrap `changes` in a
    /// change set carrying it.
    pub async fn get_version(
        &self,
        account_id: &str,
        changes: Vec<ItemChange>,
    ) -> LedgerResult<ChangeSet> {
        let version = self.next_version(account_id).await?;
        Ok(ChangeSet::new(account_id, version, changes))
    }

    /// Allocate the next version of `account_id`.
    pub async fn next_version(&self, account_id: &str) -> LedgerResult<u64> {
        let key = Self::metadata_key(account_id);
        let attempts = self.policy.max_attempts();

        for attempt in 1..=attempts {
            if attempt > 1 {
                let delay = self.policy.delay_for_retry(attempt - 1);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }

            match self.store.atomic_increment(&key, VERSION_ATTRIBUTE, 1).await {
                Ok(item) => {
                    let metadata: AccountMetadata = vw_entity::unmarshal(&item)?;
                    debug!(account_id, version = metadata.version, attempt, "allocated account version");
                    return Ok(metadata.version);
                }
                Err(e) => {
                    warn!(account_id, attempt, attempts, error = %e, "version increment failed");
                }
            }
        }

        Err(LedgerError::VersionConflict {
            account_id: account_id.to_string(),
            attempts,
        })
    }

    /// The version last handed out for `account_id`, 0 if none.
    pub async fn current_version(&self, account_id: &str) -> LedgerResult<u64> {
        let key = Self::metadata_key(account_id);
        match self.store.get_item(&key).await? {
            Some(item) => Ok(vw_entity::unmarshal::<AccountMetadata>(&item)?.version),
            None => Ok(0),
        }
    }
}

impl<S: ?Sized> Clone for VersionCounter<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            policy: self.policy.clone(),
        }
    }
}
