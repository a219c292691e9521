use serde::{Deserialize, Serialize};
use vw_entity::{account_hash_key, range_key, AttributeType, AttributeTypeMap, Entity};

/// Range key tag of account metadata records.
pub const METADATA_TAG: &str = "METADATA";

/// Attribute holding the account version.
pub const VERSION_ATTRIBUTE: &str = "version";

static METADATA_ATTRIBUTES: AttributeTypeMap = AttributeTypeMap::new(&[
    ("accountId", AttributeType::String),
    (VERSION_ATTRIBUTE, AttributeType::Number),
]);

/// Per-account bookkeeping record holding the account's current version.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountMetadata {
    pub account_id: String,
    pub version: u64,
}

impl AccountMetadata {
    /// Metadata for a freshly created account, at version 0.
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            version: 0,
        }
    }
}

impl Entity for AccountMetadata {
    const TYPE_TAG: &'static str = "AccountMetadata";

    fn attribute_types() -> &'static AttributeTypeMap {
        &METADATA_ATTRIBUTES
    }

    fn hash_key(&self) -> String {
        account_hash_key(&self.account_id)
    }

    fn range_key(&self) -> String {
        range_key(METADATA_TAG, &self.account_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys() {
        let metadata = AccountMetadata::new("a1");
        assert_eq!(metadata.hash_key(), "ACCOUNT#a1");
        assert_eq!(metadata.range_key(), "METADATA#a1");
        assert_eq!(metadata.version, 0);
    }

    #[test]
    fn codec_round_trip() {
        let metadata = AccountMetadata {
            account_id: "a1".into(),
            version: 12,
        };
        let item = vw_entity::marshal(&metadata).unwrap();
        assert_eq!(item.get("version"), Some(&vw_store::AttributeValue::number(12)));
        let decoded: AccountMetadata = vw_entity::unmarshal(&item).unwrap();
        assert_eq!(decoded, metadata);
    }
}
