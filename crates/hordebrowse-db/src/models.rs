//! Rust models matching the database schema.

use chrono::{DateTime, Utc};
use hordebrowse_common::{CandidateId, Criteria};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One asset with its metadata attributes.
///
/// Attributes are multi-valued; values keep their insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: CandidateId,
    pub mtime: DateTime<Utc>,
    pub attributes: BTreeMap<String, Vec<String>>,
}

impl Record {
    pub fn new<I: Into<CandidateId>>(id: I, mtime: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            mtime,
            attributes: BTreeMap::new(),
        }
    }

    /// Append a value to an attribute. Duplicate values are ignored.
    #[must_use]
    pub fn with_attr<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.add_attr(key, value);
        self
    }

    pub fn add_attr<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        let values = self.attributes.entry(key.into()).or_default();
        let value = value.into();
        if !values.contains(&value) {
            values.push(value);
        }
    }

    /// All values of an attribute; empty when absent.
    pub fn values(&self, key: &str) -> &[String] {
        self.attributes
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The first value of an attribute, if any.
    pub fn first(&self, key: &str) -> Option<&str> {
        self.values(key).first().map(String::as_str)
    }

    pub fn has(&self, key: &str) -> bool {
        !self.values(key).is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    /// Whether this record satisfies every constraint in `criteria`.
    pub fn matches(&self, criteria: &Criteria) -> bool {
        criteria.is_satisfied_by(|key| self.values(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hordebrowse_common::CriterionValue;

    fn sample() -> Record {
        Record::new("tree:tiger:AAA", Utc::now())
            .with_attr("title", "Alien")
            .with_attr("genre", "horror")
            .with_attr("genre", "scifi")
            .with_attr("genre", "scifi")
    }

    #[test]
    fn test_multi_valued_attributes() {
        let record = sample();
        assert_eq!(record.values("genre"), &["horror".to_string(), "scifi".to_string()]);
        assert_eq!(record.first("genre"), Some("horror"));
        assert_eq!(record.first("director"), None);
        assert!(record.values("director").is_empty());
    }

    #[test]
    fn test_matches_criteria() {
        let record = sample();
        assert!(record.matches(&Criteria::new()));
        assert!(record.matches(&Criteria::new().with("genre", CriterionValue::Any)));
        assert!(record.matches(
            &Criteria::new().with("genre", CriterionValue::Exact("scifi".into()))
        ));
        assert!(!record.matches(&Criteria::new().with("series", CriterionValue::Any)));
    }
}
