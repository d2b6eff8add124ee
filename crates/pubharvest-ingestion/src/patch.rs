//! The patch driver.
//!
//! Scans the records the incomplete index flags, re-fetches each from
//! the source, and lets the reconciliation engine patch the
//! re-derivable fields. Sequential, with a politeness delay between
//! re-fetched records; one record's failure is recorded and the scan
//! moves on.

use std::time::Duration;

use tracing::{error, info, warn};

use pubharvest_store::{DocumentStore, IndexKey, IndexName};

use crate::reconcile::{Outcome, Reconciler};
use crate::source::BibliographicSource;

/// Result of one patch run.
#[derive(Debug, Default)]
pub struct PatchReport {
    /// Records the incomplete index flagged.
    pub examined: usize,
    pub patched: usize,
    pub unchanged: usize,
    /// Flagged but unusable upstream (gone, or never had a usable record).
    pub missing: usize,
    /// Flagged but carrying no PubMed xref; nothing to re-fetch from.
    pub skipped: usize,
    /// Captured per-record failure details, conflicts included.
    pub errors: Vec<String>,
}

/// Run one patch batch over every record the incomplete index flags.
pub async fn run_patch<S, B>(store: &S, source: &B, delay: Duration) -> pubharvest_common::Result<PatchReport>
where
    S: DocumentStore,
    B: BibliographicSource,
{
    let flagged = store
        .query_by_index(IndexName::Incomplete, &IndexKey::All)
        .await?;

    let reconciler = Reconciler::new(store, source);
    let mut report = PatchReport {
        examined: flagged.len(),
        ..PatchReport::default()
    };

    let mut fetched_any = false;
    for record in flagged {
        if record.pmid().is_none() {
            warn!(id = %record.id, "incomplete record has no PubMed xref, skipping");
            report.skipped += 1;
            continue;
        }
        if fetched_any {
            tokio::time::sleep(delay).await;
        }
        fetched_any = true;

        let id = record.id;
        match reconciler.patch(record).await {
            Ok(Outcome::Patched) => report.patched += 1,
            Ok(Outcome::Unchanged) => report.unchanged += 1,
            Ok(Outcome::NotFound) => report.missing += 1,
            Ok(_) => {}
            Err(err) => {
                error!(id = %id, error = %err, "patch failed");
                report.errors.push(format!("{id}: {err}"));
            }
        }
    }

    info!(
        examined = report.examined,
        patched = report.patched,
        unchanged = report.unchanged,
        missing = report.missing,
        skipped = report.skipped,
        failures = report.errors.len(),
        "patch run finished"
    );
    Ok(report)
}
