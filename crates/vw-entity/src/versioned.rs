use serde::{Deserialize, Serialize};

/// Name of the embedded sub-version field.
pub const VERSION_FIELD: &str = "versionId";

/// Sub-version a fresh value starts at.
pub const INITIAL_VERSION: u64 = 1;

/// A value with its own version counter, stored as a
/// [`VersionedJson`](crate::AttributeType::VersionedJson) attribute.
///
/// The value's fields and `versionId` serialize side by side:
/// `{"type": "MONTHLY", "value": 10.0, "versionId": 2}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Versioned<T> {
    #[serde(flatten)]
    value: T,
    #[serde(rename = "versionId", default = "initial_version")]
    version: u64,
}

fn initial_version() -> u64 {
    INITIAL_VERSION
}

impl<T> Versioned<T> {
    /// Wrap a fresh value at [`INITIAL_VERSION`].
    pub fn new(value: T) -> Self {
        Self::with_version(value, INITIAL_VERSION)
    }

    pub fn with_version(value: T, version: u64) -> Self {
        Self { value, version }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Overwrite the value, bumping the sub-version by one.
    pub fn replace(&mut self, value: T) -> T {
        self.version += 1;
        std::mem::replace(&mut self.value, value)
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T: Default> Default for Versioned<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
