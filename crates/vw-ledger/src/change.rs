//! Change sets: the record of which items one account version touched.

use std::fmt;

use serde::{Deserialize, Serialize};
use vw_entity::{account_hash_key, range_key, AttributeType, AttributeTypeMap, Entity};

/// Range key tag of change set records.
pub const VERSION_TAG: &str = "VERSION";

/// What happened to an item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Add,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Add => "Add",
            Self::Update => "Update",
            Self::Delete => "Delete",
        };
        write!(f, "{s}")
    }
}

/// One changed item, identified by its entity type and store key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemChange {
    /// Entity type tag, e.g. `Category`.
    #[serde(rename = "type")]
    pub entity_type: String,
    #[serde(rename = "PK")]
    pub hash_key: String,
    #[serde(rename = "SK")]
    pub range_key: String,
    #[serde(rename = "op")]
    pub operation: Operation,
}

impl ItemChange {
    pub fn new<E: Entity>(operation: Operation, entity_type: impl Into<String>, entity: &E) -> Self {
        Self {
            entity_type: entity_type.into(),
            hash_key: entity.hash_key(),
            range_key: entity.range_key(),
            operation,
        }
    }

    pub fn added<E: Entity>(entity: &E) -> Self {
        Self::new(Operation::Add, E::TYPE_TAG, entity)
    }

    pub fn updated<E: Entity>(entity: &E) -> Self {
        Self::new(Operation::Update, E::TYPE_TAG, entity)
    }

    pub fn deleted<E: Entity>(entity: &E) -> Self {
        Self::new(Operation::Delete, E::TYPE_TAG, entity)
    }
}

static CHANGE_SET_ATTRIBUTES: AttributeTypeMap = AttributeTypeMap::new(&[
    ("accountId", AttributeType::String),
    ("version", AttributeType::Number),
    ("changeSet", AttributeType::Json),
]);

/// The items changed by one account version.
///
/// Identified by `(account_id, version)` and stored at
/// `(ACCOUNT#{account_id}, VERSION#{version})`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSet {
    account_id: String,
    version: u64,
    #[serde(rename = "changeSet")]
    changes: Vec<ItemChange>,
}

impl ChangeSet {
    pub fn new(account_id: impl Into<String>, version: u64, changes: Vec<ItemChange>) -> Self {
        Self {
            account_id: account_id.into(),
            version,
            changes,
        }
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn changes(&self) -> &[ItemChange] {
        &self.changes
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

impl Entity for ChangeSet {
    const TYPE_TAG: &'static str = "ChangeSet";

    fn attribute_types() -> &'static AttributeTypeMap {
        &CHANGE_SET_ATTRIBUTES
    }

    fn hash_key(&self) -> String {
        account_hash_key(&self.account_id)
    }

    fn range_key(&self) -> String {
        range_key(VERSION_TAG, &self.version.to_string())
    }
}
