use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::IndexError;

/// Collapsed heading ids per document. Owned by the host UI; the indexer
/// only reads it.
pub trait CollapseStore {
    fn get(&self, document_id: &str) -> BTreeSet<String>;

    /// Flips the heading's state and returns whether it is now collapsed.
    fn toggle(&mut self, document_id: &str, heading_id: &str) -> bool;

    fn set(&mut self, document_id: &str, heading_id: &str, collapsed: bool);
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryCollapseStore {
    #[serde(default)]
    documents: BTreeMap<String, BTreeSet<String>>,
}

impl MemoryCollapseStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn to_json(&self) -> Result<String, IndexError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json_str(s: &str) -> Result<Self, IndexError> {
        Ok(serde_json::from_str(s)?)
    }
}

impl CollapseStore for MemoryCollapseStore {
    fn get(&self, document_id: &str) -> BTreeSet<String> {
        self.documents.get(document_id).cloned().unwrap_or_default()
    }

    fn toggle(&mut self, document_id: &str, heading_id: &str) -> bool {
        let collapsed = !self
            .documents
            .get(document_id)
            .is_some_and(|set| set.contains(heading_id));
        self.set(document_id, heading_id, collapsed);
        collapsed
    }

    fn set(&mut self, document_id: &str, heading_id: &str, collapsed: bool) {
        if collapsed {
            self.documents
                .entry(document_id.to_string())
                .or_default()
                .insert(heading_id.to_string());
            return;
        }

        if let Some(set) = self.documents.get_mut(document_id) {
            set.remove(heading_id);
            if set.is_empty() {
                self.documents.remove(document_id);
            }
        }
    }
}
