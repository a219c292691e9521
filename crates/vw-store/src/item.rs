use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// AttributeValue
// ---------------------------------------------------------------------------

/// Store-native attribute value.
///
/// Numbers travel as decimal text so the store never loses precision; the
/// interpretation belongs to whoever declared the attribute's type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeValue {
    /// A string.
    S(String),
    /// A number, as decimal text.
    N(String),
    /// A boolean.
    Bool(bool),
    /// A nested map of attributes.
    M(BTreeMap<String, AttributeValue>),
    /// An ordered list of attributes.
    L(Vec<AttributeValue>),
    /// An explicit null.
    Null,
}

/// Discriminant of an [`AttributeValue`], used in diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    S,
    N,
    Bool,
    M,
    L,
    Null,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::S => "S",
            Self::N => "N",
            Self::Bool => "BOOL",
            Self::M => "M",
            Self::L => "L",
            Self::Null => "NULL",
        };
        write!(f, "{s}")
    }
}

impl AttributeValue {
    /// Build a string value.
    pub fn string(value: impl Into<String>) -> Self {
        Self::S(value.into())
    }

    /// Build a number value from anything that prints as a decimal.
    pub fn number(value: impl fmt::Display) -> Self {
        Self::N(value.to_string())
    }

    /// The kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::S(_) => ValueKind::S,
            Self::N(_) => ValueKind::N,
            Self::Bool(_) => ValueKind::Bool,
            Self::M(_) => ValueKind::M,
            Self::L(_) => ValueKind::L,
            Self::Null => ValueKind::Null,
        }
    }

    pub fn as_s(&self) -> Option<&str> {
        match self {
            Self::S(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_n(&self) -> Option<&str> {
        match self {
            Self::N(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_m(&self) -> Option<&BTreeMap<String, AttributeValue>> {
        match self {
            Self::M(m) => Some(m),
            _ => None,
        }
    }

    /// Parse a number value as a signed integer.
    pub fn as_i64(&self) -> Option<i64> {
        self.as_n().and_then(|n| n.parse().ok())
    }
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// Composite primary key of a stored item.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemKey {
    /// Partition key. Groups related items.
    pub hash: String,
    /// Sort key. Orders and distinguishes items within a partition.
    pub range: String,
}

impl ItemKey {
    pub fn new(hash: impl Into<String>, range: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            range: range.into(),
        }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.hash, self.range)
    }
}

/// Condition on the range key of a query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RangeCondition {
    /// Range key equals the given value.
    Equals(String),
    /// Range key starts with the given prefix.
    BeginsWith(String),
}

impl RangeCondition {
    pub fn equals(range: impl Into<String>) -> Self {
        Self::Equals(range.into())
    }

    pub fn begins_with(prefix: impl Into<String>) -> Self {
        Self::BeginsWith(prefix.into())
    }

    /// Whether `range` satisfies this condition.
    pub fn matches(&self, range: &str) -> bool {
        match self {
            Self::Equals(expected) => range == expected,
            Self::BeginsWith(prefix) => range.starts_with(prefix.as_str()),
        }
    }
}

// ---------------------------------------------------------------------------
// Item
// ---------------------------------------------------------------------------

/// Attribute map of an item, excluding its key.
pub type Attributes = BTreeMap<String, AttributeValue>;

/// A stored item: its key plus its attributes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub key: ItemKey,
    pub attributes: Attributes,
}

impl Item {
    pub fn new(key: ItemKey) -> Self {
        Self {
            key,
            attributes: Attributes::new(),
        }
    }

    /// Builder-style attribute insertion.
    pub fn with(mut self, name: impl Into<String>, value: AttributeValue) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    /// Resolve a (possibly nested) attribute path.
    pub fn get_path(&self, path: &AttributePath) -> Option<&AttributeValue> {
        path.resolve(&self.attributes)
    }
}

// ---------------------------------------------------------------------------
// Update expressions
// ---------------------------------------------------------------------------

/// Dot-separated path into an item's attributes, e.g. `budget.versionId`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AttributePath(Vec<String>);

impl AttributePath {
    /// Parse a dot-separated path. Empty segments are dropped.
    pub fn parse(path: &str) -> Self {
        Self(
            path.split('.')
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    /// A single top-level attribute.
    pub fn attribute(name: impl Into<String>) -> Self {
        Self(vec![name.into()])
    }

    /// Extend the path by one segment.
    pub fn child(mut self, segment: impl Into<String>) -> Self {
        self.0.push(segment.into());
        self
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn resolve<'a>(&self, attributes: &'a Attributes) -> Option<&'a AttributeValue> {
        let (first, rest) = self.0.split_first()?;
        let mut current = attributes.get(first)?;
        for segment in rest {
            current = current.as_m()?.get(segment)?;
        }
        Some(current)
    }

    /// Write `value` at this path, creating intermediate maps as needed.
    ///
    /// Returns `false` if an intermediate segment exists but is not a map.
    pub fn assign(&self, attributes: &mut Attributes, value: AttributeValue) -> bool {
        let Some((last, parents)) = self.0.split_last() else {
            return false;
        };
        let mut current = attributes;
        for segment in parents {
            let next = current
                .entry(segment.clone())
                .or_insert_with(|| AttributeValue::M(Attributes::new()));
            match next {
                AttributeValue::M(map) => current = map,
                _ => return false,
            }
        }
        current.insert(last.clone(), value);
        true
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// Precondition evaluated atomically with an update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Condition {
    /// The item must already exist.
    ItemExists,
    /// The attribute at `path` must equal `value`.
    Equals {
        path: AttributePath,
        value: AttributeValue,
    },
}

impl Condition {
    /// Evaluate against the current attributes (`None` when the item is missing).
    pub fn holds(&self, current: Option<&Attributes>) -> bool {
        match (self, current) {
            (Self::ItemExists, current) => current.is_some(),
            (Self::Equals { .. }, None) => false,
            (Self::Equals { path, value }, Some(attrs)) => path.resolve(attrs) == Some(value),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ItemExists => write!(f, "item exists"),
            Self::Equals { path, value } => write!(f, "{path} == {value:?}"),
        }
    }
}

/// A single-item update: assignments, numeric additions, and the
/// conditions that must hold for it to apply.
///
/// Applying an update to a missing item creates the item, unless a
/// condition rejects it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ItemUpdate {
    pub set: Vec<(AttributePath, AttributeValue)>,
    pub add: Vec<(String, i64)>,
    pub conditions: Vec<Condition>,
}

impl ItemUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, path: AttributePath, value: AttributeValue) -> Self {
        self.set.push((path, value));
        self
    }

    pub fn add(mut self, attribute: impl Into<String>, delta: i64) -> Self {
        self.add.push((attribute.into(), delta));
        self
    }

    pub fn expect(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Returns `true` if the update neither assigns nor adds anything.
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.add.is_empty()
    }
}
