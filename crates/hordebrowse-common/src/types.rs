//! Query criteria and browse ordering.

use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Required value for one metadata key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "match", content = "value")]
pub enum CriterionValue {
    /// The key must be present, with any value.
    #[default]
    Any,
    /// The key must carry exactly this value.
    Exact(String),
}

impl CriterionValue {
    /// Whether a (possibly multi-valued) attribute satisfies this criterion.
    pub fn accepts(&self, values: &[String]) -> bool {
        match self {
            Self::Any => !values.is_empty(),
            Self::Exact(expected) => values.iter().any(|v| v == expected),
        }
    }
}

impl fmt::Display for CriterionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "*"),
            Self::Exact(value) => write!(f, "{value}"),
        }
    }
}

impl FromStr for CriterionValue {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "" | "*" => Self::Any,
            other => Self::Exact(other.to_string()),
        })
    }
}

/// Conjunction of per-key constraints handed to the metadata store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Criteria(BTreeMap<String, CriterionValue>);

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the constraint for `key`.
    pub fn insert<K: Into<String>>(&mut self, key: K, value: CriterionValue) {
        self.0.insert(key.into(), value);
    }

    /// Builder-style variant of [`insert`](Self::insert).
    #[must_use]
    pub fn with<K: Into<String>>(mut self, key: K, value: CriterionValue) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&CriterionValue> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, CriterionValue> {
        self.0.iter()
    }

    /// Check the criteria against an attribute lookup.
    ///
    /// Empty criteria match everything.
    pub fn is_satisfied_by<'a, F>(&self, mut lookup: F) -> bool
    where
        F: FnMut(&str) -> &'a [String],
    {
        self.0.iter().all(|(key, value)| value.accepts(lookup(key)))
    }
}

impl<'a> IntoIterator for &'a Criteria {
    type Item = (&'a String, &'a CriterionValue);
    type IntoIter = btree_map::Iter<'a, String, CriterionValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<K: Into<String>> FromIterator<(K, CriterionValue)> for Criteria {
    fn from_iter<I: IntoIterator<Item = (K, CriterionValue)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Ordering applied to query results before they are streamed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Most recently modified first.
    #[default]
    Time,
    /// Alphabetical by title, falling back to name.
    Title,
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Time => write!(f, "time"),
            Self::Title => write!(f, "title"),
        }
    }
}

impl FromStr for SortKey {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "time" => Ok(Self::Time),
            "title" => Ok(Self::Title),
            other => Err(crate::Error::invalid_input(format!(
                "unknown sort key '{other}' (expected 'time' or 'title')"
            ))),
        }
    }
}

/// Browse location given on the command line, as path segments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathScope(Vec<String>);

impl PathScope {
    /// Split a `/`-separated path, dropping empty segments.
    pub fn parse(path: &str) -> Self {
        Self(
            path.split('/')
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether a stored `path` attribute lies inside this scope.
    pub fn contains(&self, path: &str) -> bool {
        let mut segments = path.split('/').filter(|segment| !segment.is_empty());
        self.0
            .iter()
            .all(|wanted| segments.next() == Some(wanted.as_str()))
    }
}

impl fmt::Display for PathScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.0.join("/"))
    }
}
