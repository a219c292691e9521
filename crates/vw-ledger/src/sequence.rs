use std::ops::Range;
use std::sync::Arc;

use tracing::debug;
use vw_entity::range_key;
use vw_store::{AttributeValue, ItemKey, KeyValueStore};

use crate::error::{LedgerError, LedgerResult};

/// Range key tag of sequence counter records.
pub const SEQUENCE_TAG: &str = "SEQUENCE";

/// Attribute holding the last allocated sequence number.
pub const SEQUENCE_ATTRIBUTE: &str = "sequence";

/// Allocates increasing identifiers under a (hash key, range prefix) pair.
///
/// Each pair has its own counter record at `(hash_key, "SEQUENCE#" + prefix)`,
/// outside the prefix it numbers, so begins-with queries over the entities
/// never see it. Allocation is a single atomic increment-and-read; two
/// callers can never receive the same number.
pub struct SequenceAllocator<S: ?Sized> {
    store: Arc<S>,
}

impl<S: KeyValueStore + ?Sized> SequenceAllocator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Key of the counter record for `(hash_key, range_prefix)`.
    pub fn counter_key(hash_key: &str, range_prefix: &str) -> ItemKey {
        ItemKey::new(hash_key, range_key(SEQUENCE_TAG, range_prefix))
    }

    /// The next number for `(hash_key, range_prefix)`. The first call returns 1.
    pub async fn next(&self, hash_key: &str, range_prefix: &str) -> LedgerResult<u64> {
        let block = self.next_block(hash_key, range_prefix, 1).await?;
        Ok(block.start)
    }

    /// Reserve `count` consecutive numbers in one increment.
    ///
    /// A zero `count` reserves nothing and returns an empty range without
    /// touching the store.
    pub async fn next_block(
        &self,
        hash_key: &str,
        range_prefix: &str,
        count: u64,
    ) -> LedgerResult<Range<u64>> {
        if count == 0 {
            return Ok(0..0);
        }
        let key = Self::counter_key(hash_key, range_prefix);
        let delta = i64::try_from(count).map_err(|_| {
            LedgerError::Config(format!("cannot reserve {count} identifiers at once"))
        })?;

        let item = self
            .store
            .atomic_increment(&key, SEQUENCE_ATTRIBUTE, delta)
            .await?;
        let last = item
            .get(SEQUENCE_ATTRIBUTE)
            .and_then(AttributeValue::as_i64)
            .and_then(|n| u64::try_from(n).ok())
            .filter(|n| *n >= count)
            .ok_or_else(|| LedgerError::CorruptCounter {
                key: key.clone(),
                attribute: SEQUENCE_ATTRIBUTE.into(),
            })?;

        let block = (last - count + 1)..(last + 1);
        debug!(%key, start = block.start, count, "allocated sequence block");
        Ok(block)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use vw_store::{InMemoryKeyValueStore, Item};

    use super::*;

    fn allocator() -> (Arc<InMemoryKeyValueStore>, SequenceAllocator<InMemoryKeyValueStore>) {
        let store = Arc::new(InMemoryKeyValueStore::new());
        (Arc::clone(&store), SequenceAllocator::new(store))
    }

    #[tokio::test]
    async fn first_allocation_is_one_then_increasing() {
        let (_, seq) = allocator();
        assert_eq!(seq.next("ACCOUNT#a1", "CATEGORY#").await.unwrap(), 1);
        assert_eq!(seq.next("ACCOUNT#a1", "CATEGORY#").await.unwrap(), 2);
        assert_eq!(seq.next("ACCOUNT#a1", "CATEGORY#").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn prefixes_and_partitions_are_independent() {
        let (_, seq) = allocator();
        assert_eq!(seq.next("ACCOUNT#a1", "CATEGORY#").await.unwrap(), 1);
        assert_eq!(seq.next("ACCOUNT#a1", "WALLET#").await.unwrap(), 1);
        assert_eq!(seq.next("ACCOUNT#a2", "CATEGORY#").await.unwrap(), 1);
        assert_eq!(seq.next("ACCOUNT#a1", "CATEGORY#").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn blocks_do_not_overlap() {
        let (_, seq) = allocator();
        let first = seq.next_block("ACCOUNT#a1", "CATEGORY#", 3).await.unwrap();
        let second = seq.next_block("ACCOUNT#a1", "CATEGORY#", 2).await.unwrap();
        let single = seq.next("ACCOUNT#a1", "CATEGORY#").await.unwrap();
        assert_eq!(first, 1..4);
        assert_eq!(second, 4..6);
        assert_eq!(single, 6);
    }

    #[tokio::test]
    async fn empty_block_touches_nothing() {
        let (store, seq) = allocator();
        assert!(seq.next_block("ACCOUNT#a1", "CATEGORY#", 0).await.unwrap().is_empty());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn counter_lives_outside_the_numbered_prefix() {
        let key = SequenceAllocator::<InMemoryKeyValueStore>::counter_key("ACCOUNT#a1", "CATEGORY#");
        assert_eq!(key.range, "SEQUENCE#CATEGORY#");
        assert!(!key.range.starts_with("CATEGORY#"));
    }

    #[tokio::test]
    async fn corrupt_counter_is_reported() {
        let (store, seq) = allocator();
        let key = SequenceAllocator::<InMemoryKeyValueStore>::counter_key("ACCOUNT#a1", "CATEGORY#");
        store
            .put_item(
                Item::new(key).with(SEQUENCE_ATTRIBUTE, AttributeValue::number(-10)),
                true,
            )
            .await
            .unwrap();
        let err = seq.next("ACCOUNT#a1", "CATEGORY#").await.unwrap_err();
        assert!(matches!(err, LedgerError::CorruptCounter { .. }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_allocations_are_distinct() {
        let (store, _) = allocator();
        let seq = Arc::new(SequenceAllocator::new(store));

        let mut handles = Vec::new();
        for _ in 0..50 {
            let seq = Arc::clone(&seq);
            handles.push(tokio::spawn(async move {
                seq.next("ACCOUNT#a1", "CATEGORY#").await.unwrap()
            }));
        }

        let mut seen = HashSet::new();
        for handle in handles {
            assert!(seen.insert(handle.await.unwrap()));
        }
        assert_eq!(seen, (1..=50).collect());
    }
}
