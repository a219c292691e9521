//! Transaction categories.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, instrument};
use vw_entity::{
    account_hash_key, format_local_id, range_key, range_prefix, AttributeType, AttributeTypeMap,
    Entity, Versioned,
};
use vw_ledger::{created_changes, AccountLedger, EventBus, ItemChange};
use vw_store::{KeyValueStore, RangeCondition, StoreResult};

use crate::error::{SdkError, SdkResult};

/// Range key tag of category records.
pub const CATEGORY_TAG: &str = "CATEGORY";

/// Attributes callers may change through [`CategoryService::update`].
pub const UPDATABLE_ATTRIBUTES: [&str; 3] = ["name", "description", "budget"];

static CATEGORY_ATTRIBUTES: AttributeTypeMap = AttributeTypeMap::new(&[
    ("accountId", AttributeType::String),
    ("categoryId", AttributeType::String),
    ("name", AttributeType::String),
    ("description", AttributeType::String),
    ("versionId", AttributeType::Number),
    ("budget", AttributeType::VersionedJson),
]);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BudgetType {
    #[default]
    Monthly,
    Bimonthly,
    Yearly,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Budget {
    #[serde(rename = "type")]
    pub budget_type: BudgetType,
    pub value: f64,
}

impl Budget {
    pub fn new(budget_type: BudgetType, value: f64) -> Self {
        Self { budget_type, value }
    }
}

/// A transaction category, stored at `(ACCOUNT#{account_id}, CATEGORY#{category_id})`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub account_id: String,
    pub category_id: String,
    pub name: String,
    pub description: String,
    pub version_id: u64,
    pub budget: Versioned<Budget>,
}

impl Default for Category {
    fn default() -> Self {
        Self {
            account_id: String::new(),
            category_id: String::new(),
            name: String::new(),
            description: String::new(),
            version_id: 1,
            budget: Versioned::default(),
        }
    }
}

impl Category {
    pub fn new(account_id: impl Into<String>, category_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            category_id: category_id.into(),
            ..Self::default()
        }
    }
}

impl Entity for Category {
    const TYPE_TAG: &'static str = "Category";

    fn attribute_types() -> &'static AttributeTypeMap {
        &CATEGORY_ATTRIBUTES
    }

    fn hash_key(&self) -> String {
        account_hash_key(&self.account_id)
    }

    fn range_key(&self) -> String {
        range_key(CATEGORY_TAG, &self.category_id)
    }
}

/// Caller-supplied fields of a category to create.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewCategory {
    pub name: String,
    pub description: String,
    pub budget: Option<Budget>,
}

impl NewCategory {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            budget: None,
        }
    }

    pub fn with_budget(mut self, budget: Budget) -> Self {
        self.budget = Some(budget);
        self
    }
}

/// The categories of one account, loaded at once.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CategoryList {
    account_id: String,
    categories: Vec<Category>,
}

impl CategoryList {
    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn get(&self, category_id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.category_id == category_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn into_vec(self) -> Vec<Category> {
        self.categories
    }
}

/// Reject an update naming attributes a category lacks or callers may not change.
pub fn validate_update(attributes: &Map<String, Value>) -> SdkResult<()> {
    if attributes.is_empty() {
        return Err(SdkError::Validation("no category attributes to update".into()));
    }
    for name in attributes.keys() {
        if !CATEGORY_ATTRIBUTES.contains(name) {
            return Err(SdkError::Validation(format!(
                "'{name}' is not a valid Category attribute"
            )));
        }
        if !UPDATABLE_ATTRIBUTES.contains(&name.as_str()) {
            return Err(SdkError::Validation(format!(
                "Category attribute '{name}' is not updatable"
            )));
        }
    }
    Ok(())
}

/// `category` with `attributes` applied, failing if the result is not a
/// readable category.
fn apply_update(category: &Category, attributes: &Map<String, Value>) -> SdkResult<Category> {
    let mut merged = match serde_json::to_value(category) {
        Ok(Value::Object(map)) => map,
        Ok(_) => return Err(SdkError::Validation("category is not a JSON object".into())),
        Err(e) => return Err(SdkError::Validation(format!("invalid Category: {e}"))),
    };
    for (name, value) in attributes {
        merged.insert(name.clone(), value.clone());
    }
    serde_json::from_value(Value::Object(merged))
        .map_err(|e| SdkError::Validation(format!("invalid Category update: {e}")))
}

/// Category operations for every account.
pub struct CategoryService<S: ?Sized, B: ?Sized> {
    ledger: Arc<AccountLedger<S, B>>,
}

impl<S, B> CategoryService<S, B>
where
    S: KeyValueStore + ?Sized,
    B: EventBus + ?Sized,
{
    pub fn new(ledger: Arc<AccountLedger<S, B>>) -> Self {
        Self { ledger }
    }

    /// Create `new_categories` under fresh identifiers.
    ///
    /// Each category succeeds or fails on its own; the returned list is
    /// parallel to the input. The successful ones are recorded as one
    /// account version.
    #[instrument(skip(self, new_categories), fields(count = new_categories.len()))]
    pub async fn create(
        &self,
        account_id: &str,
        new_categories: Vec<NewCategory>,
    ) -> SdkResult<Vec<StoreResult<Category>>> {
        if new_categories.is_empty() {
            return Ok(Vec::new());
        }
        let hash_key = account_hash_key(account_id);
        let width = self.ledger.config().id_width;

        let ids = self
            .ledger
            .sequences()
            .next_block(&hash_key, &range_prefix(CATEGORY_TAG), new_categories.len() as u64)
            .await?;
        debug!(first = ids.start, "allocated category ids");

        let categories: Vec<Category> = ids
            .zip(new_categories)
            .map(|(id, details)| Category {
                account_id: account_id.to_string(),
                category_id: format_local_id(id, width),
                name: details.name,
                description: details.description,
                budget: Versioned::new(details.budget.unwrap_or_default()),
                ..Category::default()
            })
            .collect();

        let items = categories
            .iter()
            .map(vw_entity::marshal)
            .collect::<Result<Vec<_>, _>>()?;
        let outcomes = self.ledger.store().batch_put_items(items, false).await?;

        let changes = created_changes(Category::TYPE_TAG, &categories, &outcomes);
        info!(
            requested = categories.len(),
            created = changes.len(),
            "persisted new categories"
        );
        self.ledger.record(account_id, changes).await?;

        Ok(categories
            .into_iter()
            .zip(outcomes)
            .map(|(category, outcome)| outcome.map(|()| category))
            .collect())
    }

    /// Every category of `account_id`, ordered by identifier.
    pub async fn list(&self, account_id: &str) -> SdkResult<Vec<Category>> {
        let items = self
            .ledger
            .store()
            .query(
                &account_hash_key(account_id),
                &RangeCondition::begins_with(range_prefix(CATEGORY_TAG)),
            )
            .await?;
        let categories = items
            .iter()
            .map(vw_entity::unmarshal)
            .collect::<Result<Vec<Category>, _>>()?;
        debug!(account_id, count = categories.len(), "listed categories");
        Ok(categories)
    }

    pub async fn load_list(&self, account_id: &str) -> SdkResult<CategoryList> {
        Ok(CategoryList {
            account_id: account_id.to_string(),
            categories: self.list(account_id).await?,
        })
    }

    pub async fn get(&self, account_id: &str, category_id: &str) -> SdkResult<Category> {
        let key = Category::new(account_id, category_id).key();
        let item = self
            .ledger
            .store()
            .get_item(&key)
            .await?
            .ok_or_else(|| SdkError::NotFound {
                entity: Category::TYPE_TAG,
                key: key.to_string(),
            })?;
        Ok(vw_entity::unmarshal(&item)?)
    }

    /// Overwrite `attributes` of the stored `category` and record the change.
    ///
    /// `category` must be the caller's last read of the record: a budget
    /// overwritten since then fails the update with
    /// [`vw_store::StoreError::ConditionFailed`]. Attributes that would not
    /// decode back into a category are rejected before the store is touched.
    #[instrument(skip(self, category, attributes), fields(account_id = %category.account_id, category_id = %category.category_id))]
    pub async fn update(
        &self,
        category: &Category,
        attributes: &Map<String, Value>,
    ) -> SdkResult<Category> {
        validate_update(attributes)?;
        apply_update(category, attributes)?;

        let update = vw_entity::marshal_update(category, attributes)?;
        let item = self
            .ledger
            .store()
            .conditional_update_item(&category.key(), &update)
            .await?;
        let updated: Category = vw_entity::unmarshal(&item)?;

        self.ledger
            .record(&category.account_id, vec![ItemChange::updated(&updated)])
            .await?;
        Ok(updated)
    }
}
