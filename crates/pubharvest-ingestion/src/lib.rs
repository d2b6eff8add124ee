//! pubharvest-ingestion — the PubMed ingestion and reconciliation core.
//!
//! Flow for one ingestion run:
//!   1. For each investigator, search the source per year and
//!      affiliation string; union the returned PMIDs.
//!   2. For each PMID, the reconciliation engine decides: excluded,
//!      already stored, gone upstream, or fetch + normalize + store.
//!   3. Per-investigator failures land in the run report; the run
//!      continues with the next investigator.
//!
//! The patch run goes the other way: it scans stored records the
//! incomplete index flags, re-fetches each from the source, and patches
//! the re-derivable fields (type, published date, journal) without
//! touching local curation.

pub mod ingest;
pub mod models;
pub mod normalize;
pub mod patch;
pub mod reconcile;
pub mod source;

pub use ingest::{run_ingestion, IngestReport, PiReport};
pub use models::{Investigator, PubmedArticle};
pub use patch::{run_patch, PatchReport};
pub use reconcile::{Outcome, Reconciler, TaggingRules};
pub use source::{BibliographicSource, SearchQuery};
