use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{StoreError, StoreResult};
use crate::item::{Attributes, Item, ItemKey, ItemUpdate, RangeCondition};
use crate::traits::KeyValueStore;

type Partitions = BTreeMap<String, BTreeMap<String, Attributes>>;

/// In-memory, BTreeMap-based key-value store.
///
/// Intended for tests and embedding. Items are grouped by hash key and kept
/// sorted by range key, so queries come back in range order. Every operation
/// runs under a single lock acquisition, which is what makes increments and
/// conditional updates atomic.
pub struct InMemoryKeyValueStore {
    partitions: RwLock<Partitions>,
}

impl InMemoryKeyValueStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            partitions: RwLock::new(Partitions::new()),
        }
    }

    /// Number of items currently stored.
    pub fn len(&self) -> usize {
        self.partitions
            .read()
            .map(|p| p.values().map(BTreeMap::len).sum())
            .unwrap_or(0)
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove all items from the store.
    pub fn clear(&self) -> StoreResult<()> {
        self.partitions.write().map_err(poisoned)?.clear();
        Ok(())
    }

    fn put_locked(partitions: &mut Partitions, item: Item, overwrite: bool) -> StoreResult<()> {
        let partition = partitions.entry(item.key.hash.clone()).or_default();
        if !overwrite && partition.contains_key(&item.key.range) {
            return Err(StoreError::ConditionFailed {
                key: item.key,
                reason: "item already exists".into(),
            });
        }
        partition.insert(item.key.range, item.attributes);
        Ok(())
    }
}

impl Default for InMemoryKeyValueStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::Unavailable(format!("lock poisoned: {e}"))
}

fn apply_update(key: &ItemKey, current: Option<&Attributes>, update: &ItemUpdate) -> StoreResult<Attributes> {
    if let Some(failed) = update.conditions.iter().find(|c| !c.holds(current)) {
        return Err(StoreError::ConditionFailed {
            key: key.clone(),
            reason: format!("expected {failed}"),
        });
    }

    let mut attributes = current.cloned().unwrap_or_default();
    for (path, value) in &update.set {
        if !path.assign(&mut attributes, value.clone()) {
            return Err(StoreError::Serialization(format!(
                "cannot assign {path} on {key}: parent is not a map"
            )));
        }
    }
    for (attribute, delta) in &update.add {
        let base = match attributes.get(attribute) {
            None => 0,
            Some(value) => value.as_i64().ok_or_else(|| StoreError::NotANumber {
                key: key.clone(),
                attribute: attribute.clone(),
            })?,
        };
        let sum = base.checked_add(*delta).ok_or_else(|| {
            StoreError::Serialization(format!("increment of {attribute} on {key} overflows"))
        })?;
        attributes.insert(attribute.clone(), crate::AttributeValue::number(sum));
    }
    Ok(attributes)
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get_item(&self, key: &ItemKey) -> StoreResult<Option<Item>> {
        let partitions = self.partitions.read().map_err(poisoned)?;
        Ok(partitions
            .get(&key.hash)
            .and_then(|p| p.get(&key.range))
            .map(|attributes| Item {
                key: key.clone(),
                attributes: attributes.clone(),
            }))
    }

    async fn query(&self, hash_key: &str, condition: &RangeCondition) -> StoreResult<Vec<Item>> {
        let partitions = self.partitions.read().map_err(poisoned)?;
        let Some(partition) = partitions.get(hash_key) else {
            return Ok(Vec::new());
        };
        Ok(partition
            .iter()
            .filter(|(range, _)| condition.matches(range))
            .map(|(range, attributes)| Item {
                key: ItemKey::new(hash_key, range.clone()),
                attributes: attributes.clone(),
            })
            .collect())
    }

    async fn put_item(&self, item: Item, overwrite: bool) -> StoreResult<()> {
        let mut partitions = self.partitions.write().map_err(poisoned)?;
        Self::put_locked(&mut partitions, item, overwrite)
    }

    async fn batch_put_items(
        &self,
        items: Vec<Item>,
        overwrite: bool,
    ) -> StoreResult<Vec<StoreResult<()>>> {
        let mut partitions = self.partitions.write().map_err(poisoned)?;
        Ok(items
            .into_iter()
            .map(|item| Self::put_locked(&mut partitions, item, overwrite))
            .collect())
    }

    async fn conditional_update_item(&self, key: &ItemKey, update: &ItemUpdate) -> StoreResult<Item> {
        let mut partitions = self.partitions.write().map_err(poisoned)?;
        let current = partitions.get(&key.hash).and_then(|p| p.get(&key.range));
        let attributes = apply_update(key, current, update)?;

        partitions
            .entry(key.hash.clone())
            .or_default()
            .insert(key.range.clone(), attributes.clone());
        Ok(Item {
            key: key.clone(),
            attributes,
        })
    }
}

impl std::fmt::Debug for InMemoryKeyValueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryKeyValueStore")
            .field("item_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use super::*;
    use crate::item::{AttributePath, AttributeValue, Condition};

    fn category_item(id: &str, name: &str) -> Item {
        Item::new(ItemKey::new("ACCOUNT#a1", format!("CATEGORY#{id}")))
            .with("name", AttributeValue::string(name))
    }

    // -----------------------------------------------------------------------
    // Core CRUD
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn put_and_get_item() {
        let store = InMemoryKeyValueStore::new();
        let item = category_item("01", "Food");
        store.put_item(item.clone(), false).await.unwrap();

        let read_back = store.get_item(&item.key).await.unwrap().expect("should exist");
        assert_eq!(read_back, item);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn get_missing_item_returns_none() {
        let store = InMemoryKeyValueStore::new();
        let missing = store
            .get_item(&ItemKey::new("ACCOUNT#a1", "CATEGORY#99"))
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn put_without_overwrite_rejects_existing() {
        let store = InMemoryKeyValueStore::new();
        store.put_item(category_item("01", "Food"), false).await.unwrap();

        let err = store
            .put_item(category_item("01", "Rent"), false)
            .await
            .unwrap_err();
        assert!(err.is_condition_failed());

        store.put_item(category_item("01", "Rent"), true).await.unwrap();
        let item = store
            .get_item(&ItemKey::new("ACCOUNT#a1", "CATEGORY#01"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(item.get("name"), Some(&AttributeValue::string("Rent")));
    }

    #[tokio::test]
    async fn batch_put_reports_each_item() {
        let store = InMemoryKeyValueStore::new();
        store.put_item(category_item("02", "Taken"), false).await.unwrap();

        let outcomes = store
            .batch_put_items(
                vec![
                    category_item("01", "Food"),
                    category_item("02", "Rent"),
                    category_item("03", "Fun"),
                ],
                false,
            )
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].is_ok());
        assert!(outcomes[1].as_ref().unwrap_err().is_condition_failed());
        assert!(outcomes[2].is_ok());
        assert_eq!(store.len(), 3);
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn query_begins_with_is_ordered_and_scoped() {
        let store = InMemoryKeyValueStore::new();
        for (id, name) in [("03", "c"), ("01", "a"), ("02", "b")] {
            store.put_item(category_item(id, name), false).await.unwrap();
        }
        store
            .put_item(Item::new(ItemKey::new("ACCOUNT#a1", "VERSION#1")), false)
            .await
            .unwrap();
        store
            .put_item(Item::new(ItemKey::new("ACCOUNT#a2", "CATEGORY#01")), false)
            .await
            .unwrap();

        let items = store
            .query("ACCOUNT#a1", &RangeCondition::begins_with("CATEGORY#"))
            .await
            .unwrap();
        let ranges: Vec<_> = items.iter().map(|i| i.key.range.as_str()).collect();
        assert_eq!(ranges, vec!["CATEGORY#01", "CATEGORY#02", "CATEGORY#03"]);
    }

    #[tokio::test]
    async fn query_exact_and_unknown_partition() {
        let store = InMemoryKeyValueStore::new();
        store.put_item(category_item("01", "a"), false).await.unwrap();

        let exact = store
            .query("ACCOUNT#a1", &RangeCondition::equals("CATEGORY#01"))
            .await
            .unwrap();
        assert_eq!(exact.len(), 1);

        let none = store
            .query("ACCOUNT#zz", &RangeCondition::begins_with(""))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    // -----------------------------------------------------------------------
    // Updates
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn increment_creates_missing_item() {
        let store = InMemoryKeyValueStore::new();
        let key = ItemKey::new("ACCOUNT#a1", "SEQUENCE#CATEGORY#");

        let first = store.atomic_increment(&key, "sequence", 1).await.unwrap();
        assert_eq!(first.get("sequence").and_then(AttributeValue::as_i64), Some(1));

        let second = store.atomic_increment(&key, "sequence", 5).await.unwrap();
        assert_eq!(second.get("sequence").and_then(AttributeValue::as_i64), Some(6));
    }

    #[tokio::test]
    async fn increment_non_number_fails() {
        let store = InMemoryKeyValueStore::new();
        let item = category_item("01", "Food");
        store.put_item(item.clone(), false).await.unwrap();

        let err = store.atomic_increment(&item.key, "name", 1).await.unwrap_err();
        assert!(matches!(err, StoreError::NotANumber { .. }));
    }

    #[tokio::test]
    async fn conditional_update_checks_expected_values() {
        let store = InMemoryKeyValueStore::new();
        let item = category_item("01", "Food");
        store.put_item(item.clone(), false).await.unwrap();

        let stale = ItemUpdate::new()
            .set(AttributePath::attribute("name"), AttributeValue::string("Groceries"))
            .expect(Condition::Equals {
                path: AttributePath::attribute("name"),
                value: AttributeValue::string("Something else"),
            });
        let err = store.conditional_update_item(&item.key, &stale).await.unwrap_err();
        assert!(err.is_condition_failed());

        let fresh = ItemUpdate::new()
            .set(AttributePath::attribute("name"), AttributeValue::string("Groceries"))
            .expect(Condition::Equals {
                path: AttributePath::attribute("name"),
                value: AttributeValue::string("Food"),
            });
        let updated = store.conditional_update_item(&item.key, &fresh).await.unwrap();
        assert_eq!(updated.get("name"), Some(&AttributeValue::string("Groceries")));
    }

    #[tokio::test]
    async fn conditional_update_on_missing_item_fails() {
        let store = InMemoryKeyValueStore::new();
        let update = ItemUpdate::new()
            .set(AttributePath::attribute("name"), AttributeValue::string("x"))
            .expect(Condition::ItemExists);
        let err = store
            .conditional_update_item(&ItemKey::new("ACCOUNT#a1", "CATEGORY#01"), &update)
            .await
            .unwrap_err();
        assert!(err.is_condition_failed());
        assert!(store.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_increments_are_unique() {
        let store = Arc::new(InMemoryKeyValueStore::new());
        let key = ItemKey::new("ACCOUNT#a1", "METADATA#a1");

        let mut handles = Vec::new();
        for _ in 0..64 {
            let store = Arc::clone(&store);
            let key = key.clone();
            handles.push(tokio::spawn(async move {
                let item = store.atomic_increment(&key, "version", 1).await.unwrap();
                item.get("version").and_then(AttributeValue::as_i64).unwrap()
            }));
        }

        let mut seen = HashSet::new();
        for handle in handles {
            assert!(seen.insert(handle.await.unwrap()));
        }
        assert_eq!(seen.len(), 64);
        assert_eq!(seen.iter().max(), Some(&64));
    }
}
