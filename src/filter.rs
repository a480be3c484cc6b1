//! User-edited filter rules and the query criteria they produce.
//!
//! The rule list always ends with exactly one blank rule (no key selected)
//! for the user to fill in. Every change recomputes the criteria and
//! broadcasts them so the result view can refresh.

use std::sync::Arc;

use hordebrowse_common::{Criteria, CriterionValue, Error, Result};
use hordebrowse_db::MetadataStore;
use tokio::sync::broadcast;
use tracing::debug;

const CHANNEL_CAPACITY: usize = 16;

/// One key/value constraint; a rule with no key is blank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterRule {
    pub key: Option<String>,
    pub value: CriterionValue,
}

impl FilterRule {
    pub fn is_blank(&self) -> bool {
        self.key.is_none()
    }
}

pub struct FilterCriteriaBuilder {
    store: Arc<dyn MetadataStore>,
    rules: Vec<FilterRule>,
    changes: broadcast::Sender<Criteria>,
}

impl FilterCriteriaBuilder {
    pub fn new(store: Arc<dyn MetadataStore>) -> Self {
        let (changes, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            store,
            rules: vec![FilterRule::default()],
            changes,
        }
    }

    /// Receive the new criteria after every change.
    pub fn subscribe(&self) -> broadcast::Receiver<Criteria> {
        self.changes.subscribe()
    }

    pub fn rules(&self) -> &[FilterRule] {
        &self.rules
    }

    /// Keys a rule may select, with the number of assets carrying each.
    pub fn keys(&self) -> Result<Vec<(String, u64)>> {
        self.store.list_keys()
    }

    /// Values a rule on `key` may require.
    pub fn values_for(&self, key: &str) -> Result<Vec<String>> {
        self.store.list_values(key)
    }

    /// Select the key of rule `index`, or clear it with `None`.
    ///
    /// Changing the key resets the value to [`CriterionValue::Any`]. Clearing
    /// a key removes that rule, shifting later rules down by one.
    pub fn set_key(&mut self, index: usize, key: Option<String>) -> Result<()> {
        let rule = self.rule_mut(index)?;
        if rule.key != key {
            rule.key = key;
            rule.value = CriterionValue::Any;
        }
        self.changed();
        Ok(())
    }

    /// Set the required value of rule `index`, which must have a key.
    pub fn set_value(&mut self, index: usize, value: CriterionValue) -> Result<()> {
        let rule = self.rule_mut(index)?;
        if rule.is_blank() {
            return Err(Error::invalid_input(format!(
                "filter rule {index} has no key selected"
            )));
        }
        rule.value = value;
        self.changed();
        Ok(())
    }

    /// The active constraints. Blank rules contribute nothing; of two rules
    /// on the same key the later wins.
    pub fn criteria(&self) -> Criteria {
        self.rules
            .iter()
            .filter_map(|rule| Some((rule.key.clone()?, rule.value.clone())))
            .collect()
    }

    fn rule_mut(&mut self, index: usize) -> Result<&mut FilterRule> {
        let count = self.rules.len();
        self.rules.get_mut(index).ok_or_else(|| {
            Error::invalid_input(format!("no filter rule {index} (have {count})"))
        })
    }

    fn changed(&mut self) {
        self.rules.retain(|rule| !rule.is_blank());
        self.rules.push(FilterRule::default());

        let criteria = self.criteria();
        debug!(constraints = criteria.len(), "Filter changed");
        // No subscribers is fine.
        let _ = self.changes.send(criteria);
    }
}
