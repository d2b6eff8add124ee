//! Transient ingestion models.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pubharvest_store::{AuthorName, EntityKind, Journal, StoredPublication, Xref};

/// A normalized article fetched from the bibliographic source.
///
/// Created per fetch, consumed by the reconciliation engine, then
/// discarded. After normalization the xref set always contains a
/// `pubmed` entry identifying the record itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PubmedArticle {
    pub title: String,
    pub authors: Vec<AuthorName>,
    pub affiliation: Option<String>,
    pub journal: Option<Journal>,
    /// Publication type, lowercased, e.g. "journal article".
    pub kind: Option<String>,
    /// `YYYY-MM-DD` with `00` sentinels for unknown month/day.
    pub published: String,
    pub abstract_text: String,
    pub xrefs: Vec<Xref>,
    pub tags: Vec<String>,
}

impl PubmedArticle {
    /// The record's own PubMed identifier.
    pub fn pmid(&self) -> Option<&str> {
        self.xrefs
            .iter()
            .find(|x| x.xdb.eq_ignore_ascii_case("pubmed"))
            .map(|x| x.xkey.as_str())
    }

    /// Turn the article into a new publication document. The store
    /// assigns id, revision token and timestamps on insert.
    pub fn into_publication(self) -> StoredPublication {
        let now = Utc::now();
        StoredPublication {
            id: Uuid::nil(),
            rev: String::new(),
            entity_kind: EntityKind::Publication,
            title: self.title,
            authors: self.authors,
            affiliation: self.affiliation,
            journal: self.journal,
            kind: self.kind,
            published: self.published,
            abstract_text: self.abstract_text,
            xrefs: self.xrefs,
            tags: self.tags,
            slug: None,
            hrefs: Vec::new(),
            comment: None,
            created_at: now,
            modified_at: now,
        }
    }
}

/// One tracked principal investigator from the roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Investigator {
    /// Display name, PubMed notation: "Lastname IN".
    pub name: String,
    /// ASCII-folded variant used for searching, when the name needs it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized_name: Option<String>,
    /// Comma-separated affiliation strings for the automated searches.
    pub affiliation: String,
}

impl Investigator {
    /// The name to put in search queries.
    pub fn search_name(&self) -> &str {
        self.normalized_name.as_deref().unwrap_or(&self.name)
    }

    /// The affiliation strings, split and trimmed.
    pub fn affiliations(&self) -> Vec<String> {
        self.affiliation
            .split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string)
            .collect()
    }
}
