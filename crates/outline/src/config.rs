use std::time::Duration;

use manos_doc_core::ListKind;
use serde::{Deserialize, Serialize};

use crate::error::IndexError;

const DEFAULT_CAPTION_DEBOUNCE_MS: u64 = 500;
const DEFAULT_MATERIALIZE_DEBOUNCE_MS: u64 = 1000;

/// One string per generated list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListText {
    pub tables: String,
    pub figures: String,
    pub bibliography: String,
}

impl ListText {
    pub fn get(&self, list: ListKind) -> &str {
        match list {
            ListKind::Tables => &self.tables,
            ListKind::Figures => &self.figures,
            ListKind::Bibliography => &self.bibliography,
        }
    }
}

fn default_titles() -> ListText {
    ListText {
        tables: "List of Tables".to_string(),
        figures: "List of Figures".to_string(),
        bibliography: "Bibliography".to_string(),
    }
}

fn default_entry_labels() -> ListText {
    ListText {
        tables: "Table".to_string(),
        figures: "Figure".to_string(),
        bibliography: String::new(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    pub caption_debounce_ms: u64,
    pub materialize_debounce_ms: u64,
    /// Generated lists written back into the document.
    pub lists: Vec<ListKind>,
    pub titles: ListText,
    pub entry_labels: ListText,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            caption_debounce_ms: DEFAULT_CAPTION_DEBOUNCE_MS,
            materialize_debounce_ms: DEFAULT_MATERIALIZE_DEBOUNCE_MS,
            lists: ListKind::ALL.to_vec(),
            titles: default_titles(),
            entry_labels: default_entry_labels(),
        }
    }
}

impl IndexerConfig {
    pub fn from_json_str(s: &str) -> Result<Self, IndexError> {
        let config: Self = serde_json::from_str(s)?;
        Ok(config.with_defaults())
    }

    pub fn with_defaults(mut self) -> Self {
        if self.caption_debounce_ms == 0 {
            self.caption_debounce_ms = DEFAULT_CAPTION_DEBOUNCE_MS;
        }
        if self.materialize_debounce_ms == 0 {
            self.materialize_debounce_ms = DEFAULT_MATERIALIZE_DEBOUNCE_MS;
        }
        self
    }

    pub fn caption_debounce(&self) -> Duration {
        Duration::from_millis(self.caption_debounce_ms)
    }

    pub fn materialize_debounce(&self) -> Duration {
        Duration::from_millis(self.materialize_debounce_ms)
    }

    pub fn materializes(&self, list: ListKind) -> bool {
        self.lists.contains(&list)
    }
}
