//! Fixture values fed into template rendering.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::names::NameGenerator;

/// A single named parameter value.
///
/// JSON fixtures map onto the variants directly; the random placeholder is
/// written as `{"random_with_prefix": "tf-tg"}`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(untagged)]
pub enum FixtureValue {
    /// Boolean flag, usually gating a conditional block.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Literal string.
    Str(String),
    /// Ordered list of fragment identifiers for `range`.
    List(Vec<String>),
    /// Placeholder replaced by a unique name at render time.
    Random {
        /// Prefix kept in front of the generated suffix.
        random_with_prefix: String,
    },
}

impl FixtureValue {
    /// Builds a random-with-prefix placeholder.
    #[must_use]
    pub fn random_with_prefix(prefix: impl Into<String>) -> Self {
        Self::Random {
            random_with_prefix: prefix.into(),
        }
    }
}

impl From<bool> for FixtureValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for FixtureValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for FixtureValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u16> for FixtureValue {
    fn from(value: u16) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<&str> for FixtureValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for FixtureValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<Vec<String>> for FixtureValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

/// Parameter set driving a single rendered scenario.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(transparent)]
pub struct FixtureMap(BTreeMap<String, FixtureValue>);

impl FixtureMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a value, returning the map for chaining.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FixtureValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Adds or replaces a value, returning the previous one.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<FixtureValue>,
    ) -> Option<FixtureValue> {
        self.0.insert(key.into(), value.into())
    }

    /// Looks up a value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FixtureValue> {
        self.0.get(key)
    }

    /// Returns `true` when `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when the map holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries in key order.
    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FixtureValue)> {
        self.0.iter()
    }

    /// Overlays `overrides` on top of `self`; keys in `overrides` win.
    #[must_use]
    pub fn merged(mut self, overrides: Self) -> Self {
        self.0.extend(overrides.0);
        self
    }

    /// Replaces every random placeholder with a generated name. Keys are
    /// visited in sorted order so a seeded generator gives stable output.
    pub(crate) fn resolve(&self, names: &mut impl NameGenerator) -> Self {
        let resolved = self
            .0
            .iter()
            .map(|(key, value)| {
                let concrete = match value {
                    FixtureValue::Random { random_with_prefix } => {
                        FixtureValue::Str(names.name_with_prefix(random_with_prefix))
                    }
                    other => other.clone(),
                };
                (key.clone(), concrete)
            })
            .collect();
        Self(resolved)
    }
}

impl<K, V> FromIterator<(K, V)> for FixtureMap
where
    K: Into<String>,
    V: Into<FixtureValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}
