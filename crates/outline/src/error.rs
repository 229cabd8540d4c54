use manos_doc_core::ApplyError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("(De)Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Failed to write generated list: {0}")]
    Mutation(#[from] ApplyError),
}
