//! The `DocumentStore` contract.
//!
//! The pipelines are written against this trait; nothing above it may
//! depend on a concrete store's query language.

use async_trait::async_trait;
use uuid::Uuid;

use crate::document::StoredPublication;
use crate::error::Result;
use crate::index::IndexName;

/// Key (or range) for an index query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexKey {
    /// Every entry in the index.
    All,
    /// Exact `(external db, external key)` pair. Database names are
    /// matched lowercased.
    Xref { xdb: String, xkey: String },
}

impl IndexKey {
    pub fn xref(xdb: impl Into<String>, xkey: impl Into<String>) -> Self {
        IndexKey::Xref {
            xdb: xdb.into().to_lowercase(),
            xkey: xkey.into(),
        }
    }

    /// The common case: look up by PubMed identifier.
    pub fn pubmed(pmid: impl Into<String>) -> Self {
        IndexKey::xref("pubmed", pmid)
    }

    /// Whether an emitted key matches this query key.
    pub fn matches(&self, emitted: &IndexKey) -> bool {
        match self {
            IndexKey::All => true,
            exact => exact == emitted,
        }
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Get a document by its id.
    async fn get(&self, id: Uuid) -> Result<StoredPublication>;

    /// Save a document, compare-and-swap style.
    ///
    /// With `expected_rev = None` this is an insert: the store assigns
    /// the id (when nil) and the first revision token. With
    /// `Some(rev)` it is an update that fails with
    /// [`StoreError::Conflict`](crate::StoreError::Conflict) unless the
    /// stored token still equals `rev`. Returns the document as saved,
    /// with the fresh token and timestamps.
    async fn save(
        &self,
        doc: StoredPublication,
        expected_rev: Option<&str>,
    ) -> Result<StoredPublication>;

    /// Query a secondary index for the documents emitting a matching key.
    async fn query_by_index(
        &self,
        index: IndexName,
        key: &IndexKey,
    ) -> Result<Vec<StoredPublication>>;
}
