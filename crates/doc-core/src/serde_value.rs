use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::block::Document;

pub const DOCUMENT_SCHEMA: &str = "manos-doc";
pub const DOCUMENT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ValueError {
    #[error("Invalid document JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported schema {found:?} (expected {:?})", DOCUMENT_SCHEMA)]
    Schema { found: String },
    #[error("Document version {found} is newer than supported version {}", DOCUMENT_VERSION)]
    Version { found: u32 },
}

fn schema() -> String {
    DOCUMENT_SCHEMA.to_string()
}

fn version() -> u32 {
    DOCUMENT_VERSION
}

/// Stored form of a document: the tree plus the schema tag and version it
/// was written with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentValue {
    #[serde(default = "schema")]
    pub schema: String,
    #[serde(default = "version")]
    pub version: u32,
    pub document: Document,
}

impl DocumentValue {
    pub fn from_document(document: Document) -> Self {
        Self {
            schema: schema(),
            version: version(),
            document,
        }
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    pub fn to_json_pretty(&self) -> Result<String, ValueError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reads either the versioned envelope or a bare `{ "children": [...] }`
    /// document, which is treated as the current version.
    pub fn from_json_str(s: &str) -> Result<Self, ValueError> {
        let raw: Value = serde_json::from_str(s)?;
        let value = if raw.get("document").is_some() {
            serde_json::from_value::<DocumentValue>(raw)?
        } else {
            Self::from_document(serde_json::from_value(raw)?)
        };
        value.validate()
    }

    fn validate(self) -> Result<Self, ValueError> {
        if self.schema != DOCUMENT_SCHEMA {
            return Err(ValueError::Schema { found: self.schema });
        }
        if self.version > DOCUMENT_VERSION {
            return Err(ValueError::Version {
                found: self.version,
            });
        }
        Ok(self)
    }
}
