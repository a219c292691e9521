use serde::de::DeserializeOwned;
use serde::Serialize;
use vw_store::ItemKey;

use crate::attribute::AttributeTypeMap;

/// A persistable record.
///
/// Implementors are plain serde structs; the [`codec`](crate::codec) uses
/// [`Entity::attribute_types`] to decide how each serialized field is stored.
/// Key derivation must be pure: the same identity fields always produce the
/// same key.
pub trait Entity: Serialize + DeserializeOwned + Default + Send + Sync {
    /// Label used for this kind of entity in change sets.
    const TYPE_TAG: &'static str;

    /// Declared attribute types. Fields not listed here are not persisted.
    fn attribute_types() -> &'static AttributeTypeMap;

    fn hash_key(&self) -> String;

    fn range_key(&self) -> String;

    /// The full store key.
    fn key(&self) -> ItemKey {
        ItemKey::new(self.hash_key(), self.range_key())
    }

    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }
}
