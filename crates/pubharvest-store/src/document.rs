//! Stored document schema.
//!
//! Mirrors the document shape the web layer reads: bibliographic
//! fields produced by ingestion plus the curation fields (`slug`,
//! `hrefs`, `tags`, `comment`) that ingestion must never clobber.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of stored entity. Excluded records keep their xrefs so the
/// exclusion index can block re-import, but are otherwise dead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Publication,
    Excluded,
}

/// One author in byline order. The `*_normalized` fields hold
/// ASCII-folded forms used for search and matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorName {
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fore_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initials: Option<String>,
    pub last_name_normalized: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fore_name_normalized: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initials_normalized: Option<String>,
}

/// Journal information. Absent fields stay absent rather than becoming
/// empty strings; the whole structure is absent for non-journal types.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Journal {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abbreviation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<String>,
}

/// Cross-reference into an external system: `(database name, key)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Xref {
    pub xdb: String,
    pub xkey: String,
}

impl Xref {
    pub fn new(xdb: impl Into<String>, xkey: impl Into<String>) -> Self {
        Self {
            xdb: xdb.into(),
            xkey: xkey.into(),
        }
    }
}

/// User-curated external link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Href {
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// A persisted publication record.
///
/// `id`, `rev`, `created_at` and `modified_at` are owned by the store:
/// `id` is assigned on first save and immutable, `rev` changes on every
/// save and is the optimistic-concurrency token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPublication {
    pub id: Uuid,
    pub rev: String,
    pub entity_kind: EntityKind,
    pub title: String,
    pub authors: Vec<AuthorName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affiliation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal: Option<Journal>,
    /// Publication type, e.g. "journal article", lowercased.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Always `YYYY-MM-DD`; month/day are `00` when unknown.
    pub published: String,
    #[serde(default)]
    pub abstract_text: String,
    pub xrefs: Vec<Xref>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default)]
    pub hrefs: Vec<Href>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl StoredPublication {
    /// The PubMed key among the xrefs, if any.
    pub fn pmid(&self) -> Option<&str> {
        self.xrefs
            .iter()
            .find(|x| x.xdb.eq_ignore_ascii_case("pubmed"))
            .map(|x| x.xkey.as_str())
    }
}
