mod record;
mod store;

pub use record::{ColorRecord, DocumentRecord, LayerRecord};
pub use store::{DocumentStore, DocumentSummary, RecentDocuments};

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur while saving or loading documents
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Failed to serialize document: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Document {0} not found")]
    NotFound(Uuid),

    #[error("Invalid document data: {0}")]
    InvalidDocument(String),
}

/// Result type for persistence operations
pub type PersistenceResult<T> = Result<T, PersistenceError>;
