use async_trait::async_trait;

use crate::error::StoreResult;
use crate::item::{Item, ItemKey, ItemUpdate, RangeCondition};

/// Hash/range keyed item store.
///
/// All implementations must satisfy these invariants:
/// - Every single-item operation is atomic: concurrent callers never observe
///   or produce a partially applied update.
/// - `atomic_increment` is an increment-and-read, never a read-then-write.
/// - Batch writes report one outcome per input item, in input order. A batch
///   is never all-or-nothing.
/// - Query results are ordered by range key.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Point lookup by exact key. Returns `Ok(None)` if the item does not exist.
    async fn get_item(&self, key: &ItemKey) -> StoreResult<Option<Item>>;

    /// All items under `hash_key` whose range key satisfies `condition`.
    async fn query(&self, hash_key: &str, condition: &RangeCondition) -> StoreResult<Vec<Item>>;

    /// Write a whole item.
    ///
    /// With `overwrite == false` the write fails with `ConditionFailed` if an
    /// item already exists at the same key.
    async fn put_item(&self, item: Item, overwrite: bool) -> StoreResult<()>;

    /// Write several items, reporting each outcome independently.
    ///
    /// The outer `Err` is reserved for failures that prevented the batch from
    /// being attempted at all. The default implementation issues one
    /// `put_item` per item.
    async fn batch_put_items(
        &self,
        items: Vec<Item>,
        overwrite: bool,
    ) -> StoreResult<Vec<StoreResult<()>>> {
        let mut outcomes = Vec::with_capacity(items.len());
        for item in items {
            outcomes.push(self.put_item(item, overwrite).await);
        }
        Ok(outcomes)
    }

    /// Apply `update` atomically if all its conditions hold, returning the
    /// item as it is after the update.
    async fn conditional_update_item(&self, key: &ItemKey, update: &ItemUpdate) -> StoreResult<Item>;

    /// Atomically add `delta` to a numeric attribute (missing counts as 0,
    /// a missing item is created) and return the updated item.
    async fn atomic_increment(&self, key: &ItemKey, attribute: &str, delta: i64) -> StoreResult<Item> {
        let update = ItemUpdate::new().add(attribute, delta);
        self.conditional_update_item(key, &update).await
    }
}
