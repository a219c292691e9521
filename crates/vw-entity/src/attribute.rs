use std::fmt;

/// Semantic type of an entity attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttributeType {
    /// Plain text.
    String,
    /// A number, integral or fractional.
    Number,
    /// A nested structure stored verbatim.
    Json,
    /// A nested structure that carries its own `versionId`, bumped on every
    /// overwrite independently of the account version.
    VersionedJson,
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Json => "json",
            Self::VersionedJson => "versioned-json",
        };
        write!(f, "{s}")
    }
}

/// Mapping from attribute name to semantic type, declared once per entity
/// kind.
#[derive(Debug)]
pub struct AttributeTypeMap {
    entries: &'static [(&'static str, AttributeType)],
}

impl AttributeTypeMap {
    pub const fn new(entries: &'static [(&'static str, AttributeType)]) -> Self {
        Self { entries }
    }

    /// The declared type of `name`, if any.
    pub fn get(&self, name: &str) -> Option<AttributeType> {
        self.entries
            .iter()
            .find(|(attribute, _)| *attribute == name)
            .map(|(_, ty)| *ty)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Declared attributes in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, AttributeType)> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
