//! Error taxonomy shared across the ingestion and patch pipelines.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, HarvestError>;

#[derive(Debug, Error)]
pub enum HarvestError {
    /// Network or HTTP failure talking to the bibliographic service,
    /// including timeouts and non-2xx statuses.
    #[error("transport error: {0}")]
    Transport(String),

    /// Malformed XML from the bibliographic service.
    #[error("XML parse error: {0}")]
    Parse(String),

    /// Structurally incomplete record; must not be stored half-built.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// The identifier has no record upstream, or a document id is
    /// unknown to the store. Expected, non-fatal.
    #[error("not found: {0}")]
    NotFound(String),

    /// Optimistic-concurrency token mismatch on save. Never retried.
    #[error("revision conflict: {0}")]
    Conflict(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<reqwest::Error> for HarvestError {
    fn from(err: reqwest::Error) -> Self {
        HarvestError::Transport(err.to_string())
    }
}

impl From<quick_xml::Error> for HarvestError {
    fn from(err: quick_xml::Error) -> Self {
        HarvestError::Parse(err.to_string())
    }
}
