//! Store error types.

use pubharvest_common::HarvestError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document not found: {0}")]
    NotFound(String),

    /// The expected revision token did not match the stored one.
    /// Someone else saved the document since it was read.
    #[error("revision conflict for document {0}")]
    Conflict(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<StoreError> for HarvestError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => HarvestError::NotFound(id),
            StoreError::Conflict(id) => HarvestError::Conflict(id),
            other => HarvestError::Other(other.into()),
        }
    }
}
