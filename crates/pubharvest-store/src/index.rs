//! Secondary indexes over the document set.
//!
//! Each index is a map function from a document to the keys it emits,
//! evaluated by the store at query time. The shapes mirror the
//! map/reduce views the web layer uses; only the three the pipelines
//! consume live here.

use crate::document::{EntityKind, StoredPublication};
use crate::store::IndexKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexName {
    /// `(xdb lowercased, xkey)` per xref of live publications.
    Xref,
    /// Same key shape, over administratively excluded records.
    Excluded,
    /// Live publications with missing or sentinel bibliographic data,
    /// eligible for re-fetching from the source.
    Incomplete,
}

impl IndexName {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexName::Xref => "publication/xref",
            IndexName::Excluded => "publication/excluded",
            IndexName::Incomplete => "publication/incomplete",
        }
    }
}

/// Evaluate the map function for one document.
pub fn map_document(index: IndexName, doc: &StoredPublication) -> Vec<IndexKey> {
    match index {
        IndexName::Xref => xref_keys(doc, EntityKind::Publication),
        IndexName::Excluded => xref_keys(doc, EntityKind::Excluded),
        IndexName::Incomplete => {
            if doc.entity_kind == EntityKind::Publication && is_incomplete(doc) {
                vec![IndexKey::All]
            } else {
                Vec::new()
            }
        }
    }
}

fn xref_keys(doc: &StoredPublication, kind: EntityKind) -> Vec<IndexKey> {
    if doc.entity_kind != kind {
        return Vec::new();
    }
    doc.xrefs
        .iter()
        .map(|x| IndexKey::xref(x.xdb.to_lowercase(), x.xkey.clone()))
        .collect()
}

/// Whether a record has data worth re-fetching from the source.
///
/// True when the publication type is missing, the published date lacks
/// a real month (the `00` sentinel), the journal structure is missing,
/// or the journal lacks volume or pages. Day-of-month and issue are
/// deliberately not checked; both are frequently and legitimately
/// absent.
pub fn is_incomplete(doc: &StoredPublication) -> bool {
    if doc.kind.as_deref().map_or(true, str::is_empty) {
        return true;
    }
    let parts: Vec<&str> = doc.published.split('-').collect();
    if parts.len() < 3 || parts[1] == "00" {
        return true;
    }
    let Some(journal) = &doc.journal else {
        return true;
    };
    if journal.volume.as_deref().map_or(true, str::is_empty) {
        return true;
    }
    if journal.pages.as_deref().map_or(true, str::is_empty) {
        return true;
    }
    false
}
