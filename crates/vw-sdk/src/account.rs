//! Wallet accounts, owned by users.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;
use vw_entity::keys::ACCOUNT_TAG;
use vw_entity::{range_key, user_hash_key, AttributeType, AttributeTypeMap, Entity};
use vw_ledger::{AccountLedger, EventBus};
use vw_store::{KeyValueStore, RangeCondition};

use crate::error::{SdkError, SdkResult};

static ACCOUNT_ATTRIBUTES: AttributeTypeMap = AttributeTypeMap::new(&[
    ("accountId", AttributeType::String),
    ("ownerId", AttributeType::String),
    ("name", AttributeType::String),
    ("description", AttributeType::String),
]);

/// A wallet account, stored at `(USER#{owner_id}, ACCOUNT#{owner_id}#{account_id})`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub account_id: String,
    pub owner_id: String,
    pub name: String,
    pub description: String,
}

impl Entity for Account {
    const TYPE_TAG: &'static str = "Account";

    fn attribute_types() -> &'static AttributeTypeMap {
        &ACCOUNT_ATTRIBUTES
    }

    fn hash_key(&self) -> String {
        user_hash_key(&self.owner_id)
    }

    fn range_key(&self) -> String {
        range_key(ACCOUNT_TAG, &format!("{}#{}", self.owner_id, self.account_id))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewAccount {
    pub name: String,
    pub description: String,
}

impl NewAccount {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

pub struct AccountService<S: ?Sized, B: ?Sized> {
    ledger: Arc<AccountLedger<S, B>>,
}

impl<S, B> AccountService<S, B>
where
    S: KeyValueStore + ?Sized,
    B: EventBus + ?Sized,
{
    pub fn new(ledger: Arc<AccountLedger<S, B>>) -> Self {
        Self { ledger }
    }

    /// Create an account for `owner_id`, starting its version history at 0.
    ///
    /// The metadata record is written before the account record, so a failed
    /// account write leaves at most an unreferenced metadata record at
    /// version 0 and never an account without one.
    #[instrument(skip(self, details))]
    pub async fn create(&self, owner_id: &str, details: NewAccount) -> SdkResult<Account> {
        if details.name.trim().is_empty() {
            return Err(SdkError::Validation("account name must not be empty".into()));
        }
        let account = Account {
            account_id: Uuid::now_v7().to_string(),
            owner_id: owner_id.to_string(),
            name: details.name,
            description: details.description,
        };

        let item = vw_entity::marshal(&account)?;
        self.ledger.open_account(&account.account_id).await?;
        self.ledger.store().put_item(item, false).await?;

        info!(account_id = %account.account_id, "created account");
        Ok(account)
    }

    /// Every account of `owner_id`.
    pub async fn list(&self, owner_id: &str) -> SdkResult<Vec<Account>> {
        let items = self
            .ledger
            .store()
            .query(
                &user_hash_key(owner_id),
                &RangeCondition::begins_with(range_key(ACCOUNT_TAG, &format!("{owner_id}#"))),
            )
            .await?;
        Ok(items
            .iter()
            .map(vw_entity::unmarshal)
            .collect::<Result<Vec<Account>, _>>()?)
    }

    pub async fn get(&self, owner_id: &str, account_id: &str) -> SdkResult<Account> {
        let key = Account {
            account_id: account_id.to_string(),
            owner_id: owner_id.to_string(),
            ..Account::default()
        }
        .key();
        let item = self
            .ledger
            .store()
            .get_item(&key)
            .await?
            .ok_or_else(|| SdkError::NotFound {
                entity: Account::TYPE_TAG,
                key: key.to_string(),
            })?;
        Ok(vw_entity::unmarshal(&item)?)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use vw_ledger::{AccountMetadata, InMemoryEventBus};
    use vw_store::{InMemoryKeyValueStore, Item, ItemKey, ItemUpdate, StoreError, StoreResult};

    use super::*;

    fn service() -> (
        Arc<AccountLedger<InMemoryKeyValueStore, InMemoryEventBus>>,
        AccountService<InMemoryKeyValueStore, InMemoryEventBus>,
    ) {
        let store = Arc::new(InMemoryKeyValueStore::new());
        let ledger = Arc::new(AccountLedger::new(store, Arc::new(InMemoryEventBus::new())));
        (Arc::clone(&ledger), AccountService::new(ledger))
    }

    #[test]
    fn account_keys() {
        let account = Account {
            account_id: "ad7d".into(),
            owner_id: "10v2".into(),
            ..Account::default()
        };
        assert_eq!(account.hash_key(), "USER#10v2");
        assert_eq!(account.range_key(), "ACCOUNT#10v2#ad7d");
    }

    #[tokio::test]
    async fn create_writes_account_and_metadata() {
        let (ledger, service) = service();

        let account = service
            .create("owner", NewAccount::new("Account Name", "Account Description"))
            .await
            .unwrap();

        assert_eq!(account.owner_id, "owner");
        assert_eq!(account.name, "Account Name");
        assert!(Uuid::parse_str(&account.account_id).is_ok());
        assert_eq!(
            ledger.counter().current_version(&account.account_id).await.unwrap(),
            0
        );
        assert_eq!(ledger.store().len(), 2);
    }

    #[tokio::test]
    async fn list_and_get_are_scoped_to_the_owner() {
        let (_, service) = service();
        let first = service.create("u1", NewAccount::new("One", "")).await.unwrap();
        service.create("u1", NewAccount::new("Two", "")).await.unwrap();
        service.create("u2", NewAccount::new("Other", "")).await.unwrap();

        let listed = service.list("u1").await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|a| a.owner_id == "u1"));

        assert_eq!(service.get("u1", &first.account_id).await.unwrap(), first);
        assert!(matches!(
            service.get("u2", &first.account_id).await,
            Err(SdkError::NotFound { entity: "Account", .. })
        ));
    }

    /// In-memory store refusing writes under user partitions.
    struct NoUserWrites {
        inner: InMemoryKeyValueStore,
    }

    #[async_trait]
    impl KeyValueStore for NoUserWrites {
        async fn get_item(&self, key: &ItemKey) -> StoreResult<Option<Item>> {
            self.inner.get_item(key).await
        }

        async fn query(&self, hash_key: &str, condition: &RangeCondition) -> StoreResult<Vec<Item>> {
            self.inner.query(hash_key, condition).await
        }

        async fn put_item(&self, item: Item, overwrite: bool) -> StoreResult<()> {
            if item.key.hash.starts_with("USER#") {
                return Err(StoreError::Unavailable("user partition offline".into()));
            }
            self.inner.put_item(item, overwrite).await
        }

        async fn conditional_update_item(&self, key: &ItemKey, update: &ItemUpdate) -> StoreResult<Item> {
            self.inner.conditional_update_item(key, update).await
        }
    }

    #[tokio::test]
    async fn failed_account_write_leaves_only_metadata() {
        let store = Arc::new(NoUserWrites {
            inner: InMemoryKeyValueStore::new(),
        });
        let ledger = Arc::new(AccountLedger::new(
            Arc::clone(&store),
            Arc::new(InMemoryEventBus::new()),
        ));
        let service = AccountService::new(Arc::clone(&ledger));

        let err = service.create("u1", NewAccount::new("One", "")).await.unwrap_err();

        assert!(matches!(err, SdkError::Store(StoreError::Unavailable(_))));
        assert_eq!(store.inner.len(), 1);
        assert!(service.list("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn metadata_is_written_at_version_zero() {
        let (ledger, service) = service();
        let account = service.create("u1", NewAccount::new("One", "")).await.unwrap();

        let item = ledger
            .store()
            .get_item(&AccountMetadata::new(&account.account_id).key())
            .await
            .unwrap()
            .unwrap();
        let metadata: AccountMetadata = vw_entity::unmarshal(&item).unwrap();
        assert_eq!(metadata.version, 0);
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let (ledger, service) = service();
        let err = service.create("u1", NewAccount::new("  ", "")).await.unwrap_err();
        assert!(matches!(err, SdkError::Validation(_)));
        assert!(ledger.store().is_empty());
    }
}
