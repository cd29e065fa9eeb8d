// ── Per-family classifier index ──
//
// Sorted mapping from normalized identification string to device id.
// Built once while the chain is assembled (or loaded from storage) and
// read-only afterwards.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::matcher::{edit_distance_match, prefix_reduction_with_floor};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassifierIndex {
    entries: BTreeMap<String, String>,
}

impl ClassifierIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert during build; a later string overwrites an earlier one.
    pub(crate) fn insert(&mut self, user_agent: String, device_id: String) {
        self.entries.insert(user_agent, device_id);
    }

    /// Exact lookup.
    pub fn get(&self, user_agent: &str) -> Option<&str> {
        self.entries.get(user_agent).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Whether any entry maps to `device_id`.
    pub fn contains_device(&self, device_id: &str) -> bool {
        self.entries.values().any(|id| id == device_id)
    }

    /// Device id of the prefix-reduction match for `target`.
    pub fn reduction_match(&self, target: &str, tolerance: usize, floor: usize) -> Option<&str> {
        let key = prefix_reduction_with_floor(&self.entries, target, tolerance, floor)?;
        self.get(key)
    }

    /// Device id of the edit-distance match for `target`.
    pub fn distance_match(
        &self,
        target: &str,
        max_distance: usize,
        length_window: Option<usize>,
    ) -> Option<&str> {
        let key = edit_distance_match(
            self.entries.keys().map(String::as_str),
            target,
            max_distance,
            length_window,
        )?;
        self.get(key)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ClassifierIndex {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
