//! Reconciliation of fetched records against the store.
//!
//! One engine, two entry points: [`Reconciler::consider`] decides what
//! to do with a PMID the search surfaced, [`Reconciler::patch`] refreshes
//! an already-stored record. Both leave curated fields (slug, hrefs,
//! tags, comment) untouched on existing documents.

use tracing::{debug, info, warn};
use uuid::Uuid;

use pubharvest_common::{HarvestError, Result};
use pubharvest_store::{DocumentStore, IndexKey, IndexName, StoredPublication};

use crate::source::BibliographicSource;

/// Affiliation-based tagging applied to newly stored records.
///
/// Markers are matched as case-insensitive substrings of the record's
/// affiliation; the first match wins and the record gets `tag` once.
#[derive(Debug, Clone)]
pub struct TaggingRules {
    pub markers: Vec<String>,
    pub tag: String,
}

impl Default for TaggingRules {
    fn default() -> Self {
        Self {
            markers: vec![
                "science for life laboratory".to_string(),
                "scilifelab".to_string(),
            ],
            tag: "SciLifeLab".to_string(),
        }
    }
}

impl TaggingRules {
    /// The tag to apply for this affiliation, if any marker matches.
    pub fn tag_for(&self, affiliation: Option<&str>) -> Option<&str> {
        let affiliation = affiliation?.to_lowercase();
        self.markers
            .iter()
            .any(|m| affiliation.contains(&m.to_lowercase()))
            .then_some(self.tag.as_str())
    }
}

/// What happened to one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A curator excluded this identifier; never re-imported.
    Excluded,
    /// Already stored, under the given document id.
    Duplicate(Uuid),
    /// The source has no (usable) record for the identifier.
    NotFound,
    /// Fetched, normalized and inserted.
    Stored(Uuid),
    /// Re-fetched and identical in every re-derivable field.
    Unchanged,
    /// Re-fetched and updated in place.
    Patched,
}

pub struct Reconciler<'a, S, B>
where
    S: DocumentStore,
    B: BibliographicSource,
{
    store: &'a S,
    source: &'a B,
    tagging: TaggingRules,
}

impl<'a, S, B> Reconciler<'a, S, B>
where
    S: DocumentStore,
    B: BibliographicSource,
{
    pub fn new(store: &'a S, source: &'a B) -> Self {
        Self {
            store,
            source,
            tagging: TaggingRules::default(),
        }
    }

    pub fn with_tagging(mut self, tagging: TaggingRules) -> Self {
        self.tagging = tagging;
        self
    }

    /// Decide the fate of a searched-up PMID: exclusion and duplicate
    /// checks come first and skip the fetch entirely; only genuinely
    /// new identifiers hit the source.
    pub async fn consider(&self, pmid: &str) -> Result<Outcome> {
        let key = IndexKey::pubmed(pmid);

        let excluded = self
            .store
            .query_by_index(IndexName::Excluded, &key)
            .await?;
        if !excluded.is_empty() {
            debug!(pmid, "identifier is excluded, skipping");
            return Ok(Outcome::Excluded);
        }

        let existing = self.store.query_by_index(IndexName::Xref, &key).await?;
        if let Some(hit) = existing.first() {
            debug!(pmid, id = %hit.id, "already stored");
            return Ok(Outcome::Duplicate(hit.id));
        }

        let mut article = match self.source.fetch(pmid).await {
            Ok(article) => article,
            Err(err) if is_unusable(&err) => {
                warn!(pmid, error = %err, "record unusable upstream");
                return Ok(Outcome::NotFound);
            }
            Err(err) => return Err(err),
        };

        if let Some(tag) = self.tagging.tag_for(article.affiliation.as_deref()) {
            article.tags.push(tag.to_string());
        }

        let saved = self.store.save(article.into_publication(), None).await?;
        info!(pmid, id = %saved.id, title = %saved.title, "stored new publication");
        Ok(Outcome::Stored(saved.id))
    }

    /// Re-fetch a stored record and patch the re-derivable fields:
    /// publication type, published date and journal. Everything else,
    /// curation included, is left exactly as stored. A concurrent
    /// modification surfaces as a `Conflict` error; the engine never
    /// retries.
    pub async fn patch(&self, record: StoredPublication) -> Result<Outcome> {
        let Some(pmid) = record.pmid().map(str::to_string) else {
            warn!(id = %record.id, "stored record carries no PubMed identifier");
            return Ok(Outcome::NotFound);
        };

        let fresh = match self.source.fetch(&pmid).await {
            Ok(article) => article,
            Err(err) if is_unusable(&err) => {
                warn!(pmid, id = %record.id, error = %err, "record unusable upstream");
                return Ok(Outcome::NotFound);
            }
            Err(err) => return Err(err),
        };

        if record.kind == fresh.kind
            && record.published == fresh.published
            && record.journal == fresh.journal
        {
            debug!(pmid, id = %record.id, "no re-derivable field changed");
            return Ok(Outcome::Unchanged);
        }

        let rev = record.rev.clone();
        let mut patched = record;
        patched.kind = fresh.kind;
        patched.published = fresh.published;
        patched.journal = fresh.journal;

        let saved = self.store.save(patched, Some(&rev)).await?;
        info!(pmid, id = %saved.id, "patched publication");
        Ok(Outcome::Patched)
    }
}

/// Fetch failures that mean "this identifier yields nothing usable",
/// as opposed to transient transport problems worth surfacing.
fn is_unusable(err: &HarvestError) -> bool {
    matches!(
        err,
        HarvestError::NotFound(_) | HarvestError::Parse(_) | HarvestError::InvalidRecord(_)
    )
}
