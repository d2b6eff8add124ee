//! Bibliographic source abstraction.

pub mod pubmed;

use async_trait::async_trait;

use pubharvest_common::text::to_ascii;
use pubharvest_common::Result;

use crate::models::PubmedArticle;

pub use pubmed::PubMedClient;

/// A searchable bibliographic service. The drivers and the
/// reconciliation engine only know this trait, so tests can swap in a
/// canned source.
#[async_trait]
pub trait BibliographicSource: Send + Sync {
    /// Search and return the matching external identifiers, capped at
    /// the client's configured maximum.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<String>>;

    /// Fetch and normalize one record. Fails with `NotFound` when the
    /// id has no record upstream.
    async fn fetch(&self, pmid: &str) -> Result<PubmedArticle>;
}

/// Fields of a boolean search query. Each non-empty field contributes
/// one AND-ed clause; omitted fields contribute nothing.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub author: Option<String>,
    /// Publication year (or date) filter.
    pub published: Option<String>,
    pub journal: Option<String>,
    pub affiliation: Option<String>,
    /// Free-text words, space separated.
    pub words: Option<String>,
}

impl SearchQuery {
    /// Render the query term. Author and affiliation are ASCII-folded
    /// first; the search service does not reliably match non-ASCII.
    pub fn term(&self) -> String {
        let mut parts = Vec::new();
        if let Some(author) = nonempty(&self.author) {
            parts.push(format!("{}[Author]", to_ascii(author)));
        }
        if let Some(published) = nonempty(&self.published) {
            parts.push(format!("{published}[PDAT]"));
        }
        if let Some(journal) = nonempty(&self.journal) {
            parts.push(format!("{journal}[Journal]"));
        }
        if let Some(affiliation) = nonempty(&self.affiliation) {
            parts.push(format!("{}[Affiliation]", to_ascii(affiliation)));
        }
        if let Some(words) = nonempty(&self.words) {
            parts.push(words.replace(' ', "+"));
        }
        parts.join(" AND ")
    }
}

fn nonempty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
