//! End-to-end driver tests against an in-memory store and a canned
//! bibliographic source.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use pubharvest_common::{HarvestError, Result};
use pubharvest_ingestion::{
    run_ingestion, run_patch, BibliographicSource, Investigator, PubmedArticle, SearchQuery,
    TaggingRules,
};
use pubharvest_store::{
    DocumentStore, EntityKind, Href, IndexKey, IndexName, Journal, JsonStore, StoredPublication,
    Xref,
};

const NO_DELAY: Duration = Duration::ZERO;

struct MockSource {
    ids: Vec<String>,
    articles: HashMap<String, PubmedArticle>,
    fetches: AtomicUsize,
}

impl MockSource {
    fn new(articles: Vec<PubmedArticle>) -> Self {
        let ids = articles
            .iter()
            .map(|a| a.pmid().unwrap().to_string())
            .collect();
        let articles = articles
            .into_iter()
            .map(|a| (a.pmid().unwrap().to_string(), a))
            .collect();
        Self {
            ids,
            articles,
            fetches: AtomicUsize::new(0),
        }
    }

    fn with_ids(mut self, ids: &[&str]) -> Self {
        self.ids = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BibliographicSource for MockSource {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<String>> {
        if query.author.as_deref() == Some("Fail F") {
            return Err(HarvestError::Transport("connection reset".to_string()));
        }
        Ok(self.ids.clone())
    }

    async fn fetch(&self, pmid: &str) -> Result<PubmedArticle> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if pmid == "boom" {
            return Err(HarvestError::Transport("connection reset".to_string()));
        }
        self.articles
            .get(pmid)
            .cloned()
            .ok_or_else(|| HarvestError::NotFound(format!("no record for {pmid}")))
    }
}

fn article(pmid: &str, title: &str) -> PubmedArticle {
    PubmedArticle {
        title: title.to_string(),
        journal: Some(Journal {
            title: Some("Journal of Examples".to_string()),
            volume: Some("12".to_string()),
            pages: Some("123-129".to_string()),
            ..Journal::default()
        }),
        kind: Some("journal article".to_string()),
        published: "2012-03-14".to_string(),
        xrefs: vec![Xref::new("pubmed", pmid)],
        ..PubmedArticle::default()
    }
}

fn investigator(name: &str) -> Investigator {
    Investigator {
        name: name.to_string(),
        normalized_name: None,
        affiliation: "Karolinska Institute, Uppsala University".to_string(),
    }
}

fn stored(pmid: &str, kind: EntityKind) -> StoredPublication {
    StoredPublication {
        id: Uuid::nil(),
        rev: String::new(),
        entity_kind: kind,
        title: format!("Stored record {pmid}"),
        authors: Vec::new(),
        affiliation: None,
        journal: None,
        kind: None,
        published: "2012-00-00".to_string(),
        abstract_text: String::new(),
        xrefs: vec![Xref::new("pubmed", pmid)],
        tags: Vec::new(),
        slug: None,
        hrefs: Vec::new(),
        comment: None,
        created_at: Utc::now(),
        modified_at: Utc::now(),
    }
}

async fn by_pmid(store: &JsonStore, pmid: &str) -> StoredPublication {
    let hits = store
        .query_by_index(IndexName::Xref, &IndexKey::pubmed(pmid))
        .await
        .unwrap();
    assert_eq!(hits.len(), 1, "expected exactly one record for {pmid}");
    hits.into_iter().next().unwrap()
}

// ── Ingestion ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn new_records_are_stored_and_reruns_are_idempotent() {
    let store = JsonStore::in_memory();
    let source = MockSource::new(vec![article("1", "First"), article("2", "Second")]);
    let roster = vec![investigator("Kere J")];
    let years = [2011, 2012];

    let report = run_ingestion(
        &store,
        &source,
        &roster,
        &years,
        NO_DELAY,
        TaggingRules::default(),
    )
    .await;

    // Two years times two affiliations surface the same ids; the union
    // counts each once.
    assert_eq!(report.found(), 2);
    assert_eq!(report.added(), 2);
    assert_eq!(store.len().await, 2);
    assert_eq!(source.fetch_count(), 2);
    assert_eq!(by_pmid(&store, "1").await.title, "First");

    let report = run_ingestion(
        &store,
        &source,
        &roster,
        &years,
        NO_DELAY,
        TaggingRules::default(),
    )
    .await;

    // Everything is a duplicate now; duplicates are never re-fetched.
    assert_eq!(report.found(), 2);
    assert_eq!(report.added(), 0);
    assert_eq!(store.len().await, 2);
    assert_eq!(source.fetch_count(), 2);
}

#[tokio::test]
async fn excluded_identifiers_are_skipped_without_fetching() {
    let store = JsonStore::in_memory();
    store
        .save(stored("1", EntityKind::Excluded), None)
        .await
        .unwrap();
    let source = MockSource::new(vec![article("1", "Excluded upstream")]);

    let report = run_ingestion(
        &store,
        &source,
        &[investigator("Kere J")],
        &[2012],
        NO_DELAY,
        TaggingRules::default(),
    )
    .await;

    assert_eq!(report.found(), 1);
    assert_eq!(report.added(), 0);
    assert_eq!(source.fetch_count(), 0);
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn scilifelab_affiliations_are_tagged() {
    let store = JsonStore::in_memory();
    let mut tagged = article("1", "Tagged");
    tagged.affiliation =
        Some("Science for Life Laboratory, Stockholm, Sweden.".to_string());
    let source = MockSource::new(vec![tagged, article("2", "Untagged")]);

    run_ingestion(
        &store,
        &source,
        &[investigator("Kere J")],
        &[2012],
        NO_DELAY,
        TaggingRules::default(),
    )
    .await;

    assert_eq!(by_pmid(&store, "1").await.tags, vec!["SciLifeLab"]);
    assert!(by_pmid(&store, "2").await.tags.is_empty());
}

#[tokio::test]
async fn identifiers_unusable_upstream_are_not_stored() {
    let store = JsonStore::in_memory();
    let source = MockSource::new(vec![article("1", "Real")]).with_ids(&["1", "404"]);

    let report = run_ingestion(
        &store,
        &source,
        &[investigator("Kere J")],
        &[2012],
        NO_DELAY,
        TaggingRules::default(),
    )
    .await;

    assert_eq!(report.found(), 2);
    assert_eq!(report.added(), 1);
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn one_investigators_failure_does_not_abort_the_run() {
    let store = JsonStore::in_memory();
    let source = MockSource::new(vec![article("1", "First")]);
    let roster = vec![investigator("Fail F"), investigator("Kere J")];

    let report = run_ingestion(
        &store,
        &source,
        &roster,
        &[2012],
        NO_DELAY,
        TaggingRules::default(),
    )
    .await;

    assert_eq!(report.investigators.len(), 2);
    let failed = &report.investigators[0];
    assert_eq!(failed.name, "Fail F");
    assert!(failed.error.as_deref().unwrap().contains("connection reset"));
    assert_eq!(failed.added, 0);

    let ok = &report.investigators[1];
    assert!(ok.error.is_none());
    assert_eq!(ok.added, 1);
    assert_eq!(report.failures(), 1);
}

// ── Patching ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn patch_updates_rederivable_fields_and_keeps_curation() {
    let store = JsonStore::in_memory();
    let mut incomplete = stored("1", EntityKind::Publication);
    incomplete.slug = Some("stored-record-1".to_string());
    incomplete.tags = vec!["SciLifeLab".to_string()];
    incomplete.hrefs = vec![Href {
        href: "https://example.org/preprint".to_string(),
        title: None,
    }];
    incomplete.comment = Some("curated by hand".to_string());
    let before = store.save(incomplete, None).await.unwrap();

    let source = MockSource::new(vec![article("1", "Fresh upstream title")]);
    let report = run_patch(&store, &source, NO_DELAY).await.unwrap();

    assert_eq!(report.examined, 1);
    assert_eq!(report.patched, 1);
    assert!(report.errors.is_empty());

    let after = store.get(before.id).await.unwrap();
    assert_eq!(after.kind.as_deref(), Some("journal article"));
    assert_eq!(after.published, "2012-03-14");
    assert_eq!(
        after.journal.as_ref().unwrap().volume.as_deref(),
        Some("12")
    );
    assert_ne!(after.rev, before.rev);

    // Only type, published and journal are overwritten.
    assert_eq!(after.title, "Stored record 1");
    assert_eq!(after.slug.as_deref(), Some("stored-record-1"));
    assert_eq!(after.tags, vec!["SciLifeLab"]);
    assert_eq!(after.hrefs.len(), 1);
    assert_eq!(after.comment.as_deref(), Some("curated by hand"));
}

#[tokio::test]
async fn patch_leaves_records_the_source_agrees_with_untouched() {
    let store = JsonStore::in_memory();
    let before = store
        .save(stored("1", EntityKind::Publication), None)
        .await
        .unwrap();

    // The re-fetched article carries exactly the stored (incomplete)
    // values, so there is nothing to write.
    let fresh = PubmedArticle {
        title: "Fresh upstream title".to_string(),
        published: "2012-00-00".to_string(),
        xrefs: vec![Xref::new("pubmed", "1")],
        ..PubmedArticle::default()
    };
    let source = MockSource::new(vec![fresh]);
    let report = run_patch(&store, &source, NO_DELAY).await.unwrap();

    assert_eq!(report.examined, 1);
    assert_eq!(report.unchanged, 1);
    assert_eq!(report.patched, 0);
    assert_eq!(store.get(before.id).await.unwrap().rev, before.rev);
}

#[tokio::test]
async fn patch_skips_records_without_a_pubmed_xref() {
    let store = JsonStore::in_memory();
    let mut orphan = stored("1", EntityKind::Publication);
    orphan.xrefs = vec![Xref::new("doi", "10.1000/example")];
    store.save(orphan, None).await.unwrap();

    let source = MockSource::new(Vec::new());
    let report = run_patch(&store, &source, NO_DELAY).await.unwrap();

    assert_eq!(report.examined, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.patched, 0);
    assert_eq!(source.fetch_count(), 0);
}

#[tokio::test]
async fn patch_counts_records_gone_upstream() {
    let store = JsonStore::in_memory();
    store
        .save(stored("404", EntityKind::Publication), None)
        .await
        .unwrap();

    let source = MockSource::new(Vec::new());
    let report = run_patch(&store, &source, NO_DELAY).await.unwrap();

    assert_eq!(report.examined, 1);
    assert_eq!(report.missing, 1);
    assert_eq!(report.patched, 0);
    assert_eq!(source.fetch_count(), 1);
}

#[tokio::test]
async fn patch_records_one_failure_and_continues() {
    let store = JsonStore::in_memory();
    let bad = store
        .save(stored("boom", EntityKind::Publication), None)
        .await
        .unwrap();
    store
        .save(stored("1", EntityKind::Publication), None)
        .await
        .unwrap();

    let source = MockSource::new(vec![article("1", "Fresh upstream title")]);
    let report = run_patch(&store, &source, NO_DELAY).await.unwrap();

    assert_eq!(report.examined, 2);
    assert_eq!(report.patched, 1);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains(&bad.id.to_string()));
    assert!(report.errors[0].contains("connection reset"));

    // The failed record is untouched; the other one still got patched.
    assert_eq!(store.get(bad.id).await.unwrap().rev, bad.rev);
    assert_eq!(
        by_pmid(&store, "1").await.kind.as_deref(),
        Some("journal article")
    );
}

#[tokio::test]
async fn complete_records_are_never_examined() {
    let store = JsonStore::in_memory();
    let mut complete = stored("1", EntityKind::Publication);
    complete.kind = Some("journal article".to_string());
    complete.published = "2012-03-14".to_string();
    complete.journal = Some(Journal {
        volume: Some("12".to_string()),
        pages: Some("123-129".to_string()),
        ..Journal::default()
    });
    store.save(complete, None).await.unwrap();

    let source = MockSource::new(Vec::new());
    let report = run_patch(&store, &source, NO_DELAY).await.unwrap();

    assert_eq!(report.examined, 0);
    assert_eq!(source.fetch_count(), 0);
}
