//! The ingestion driver.
//!
//! Searches the source per investigator, year and affiliation string,
//! unions the identifiers per investigator, and runs each through the
//! reconciliation engine. Investigators are processed sequentially with
//! a politeness delay between them; a failure inside one investigator
//! is recorded in the report and never aborts the batch.

use std::collections::BTreeSet;
use std::time::Duration;

use chrono::{Datelike, Local};
use tracing::{error, info};

use pubharvest_store::DocumentStore;

use crate::models::Investigator;
use crate::reconcile::{Outcome, Reconciler, TaggingRules};
use crate::source::{BibliographicSource, SearchQuery};

/// Result of one ingestion run.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub investigators: Vec<PiReport>,
}

impl IngestReport {
    /// Total distinct identifiers the searches surfaced.
    pub fn found(&self) -> usize {
        self.investigators.iter().map(|pi| pi.found).sum()
    }

    /// Total records newly stored.
    pub fn added(&self) -> usize {
        self.investigators.iter().map(|pi| pi.added).sum()
    }

    pub fn failures(&self) -> usize {
        self.investigators
            .iter()
            .filter(|pi| pi.error.is_some())
            .count()
    }
}

/// Per-investigator slice of the run report.
#[derive(Debug)]
pub struct PiReport {
    pub name: String,
    pub found: usize,
    pub added: usize,
    /// Captured failure detail; the rest of the run went on without
    /// this investigator.
    pub error: Option<String>,
}

/// The year range used when none is configured: last year and this one.
pub fn default_years() -> Vec<i32> {
    let year = Local::now().year();
    vec![year - 1, year]
}

/// Filter the roster by command-line names. Names are matched
/// case-insensitively with underscores standing in for spaces, against
/// the normalized name when present, the display name otherwise. With
/// no names, the whole roster runs.
pub fn filter_roster(roster: &[Investigator], names: &[String]) -> Vec<Investigator> {
    if names.is_empty() {
        return roster.to_vec();
    }
    let wanted: Vec<String> = names
        .iter()
        .map(|n| n.to_lowercase().replace('_', " "))
        .collect();
    roster
        .iter()
        .filter(|pi| wanted.contains(&pi.search_name().to_lowercase()))
        .cloned()
        .collect()
}

/// Run one ingestion batch. An empty `years` falls back to
/// [`default_years`]. The delay is inserted between investigators, not
/// between the searches within one, and never before the first.
pub async fn run_ingestion<S, B>(
    store: &S,
    source: &B,
    roster: &[Investigator],
    years: &[i32],
    delay: Duration,
    tagging: TaggingRules,
) -> IngestReport
where
    S: DocumentStore,
    B: BibliographicSource,
{
    let default;
    let years = if years.is_empty() {
        default = default_years();
        default.as_slice()
    } else {
        years
    };

    let reconciler = Reconciler::new(store, source).with_tagging(tagging);
    let mut report = IngestReport::default();

    for (i, pi) in roster.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(delay).await;
        }
        let entry = match ingest_investigator(&reconciler, source, pi, years).await {
            Ok((found, added)) => {
                info!(name = %pi.name, found, added, "investigator done");
                PiReport {
                    name: pi.name.clone(),
                    found,
                    added,
                    error: None,
                }
            }
            Err(err) => {
                error!(name = %pi.name, error = %err, "investigator failed");
                PiReport {
                    name: pi.name.clone(),
                    found: 0,
                    added: 0,
                    error: Some(err.to_string()),
                }
            }
        };
        report.investigators.push(entry);
    }

    info!(
        found = report.found(),
        added = report.added(),
        failures = report.failures(),
        "ingestion run finished"
    );
    report
}

async fn ingest_investigator<S, B>(
    reconciler: &Reconciler<'_, S, B>,
    source: &B,
    pi: &Investigator,
    years: &[i32],
) -> pubharvest_common::Result<(usize, usize)>
where
    S: DocumentStore,
    B: BibliographicSource,
{
    // Union the identifiers over every (year, affiliation) search; an
    // id surfacing several times counts once.
    let mut pmids = BTreeSet::new();
    for year in years {
        for affiliation in pi.affiliations() {
            let query = SearchQuery {
                author: Some(pi.search_name().to_string()),
                published: Some(year.to_string()),
                affiliation: Some(affiliation),
                ..SearchQuery::default()
            };
            pmids.extend(source.search(&query).await?);
        }
    }

    let found = pmids.len();
    let mut added = 0;
    for pmid in pmids {
        if let Outcome::Stored(_) = reconciler.consider(&pmid).await? {
            added += 1;
        }
    }
    Ok((found, added))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Vec<Investigator> {
        vec![
            Investigator {
                name: "Kärre K".to_string(),
                normalized_name: Some("Karre K".to_string()),
                affiliation: "Karolinska Institute".to_string(),
            },
            Investigator {
                name: "Kere J".to_string(),
                normalized_name: None,
                affiliation: "Karolinska Institute, SciLifeLab".to_string(),
            },
        ]
    }

    #[test]
    fn empty_names_keep_the_whole_roster() {
        assert_eq!(filter_roster(&roster(), &[]).len(), 2);
    }

    #[test]
    fn names_match_with_underscores_and_any_case() {
        let picked = filter_roster(&roster(), &["karre_k".to_string()]);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].name, "Kärre K");

        let picked = filter_roster(&roster(), &["KERE_J".to_string()]);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].name, "Kere J");
    }

    #[test]
    fn unknown_names_are_dropped() {
        assert!(filter_roster(&roster(), &["nobody_n".to_string()]).is_empty());
    }

    #[test]
    fn default_year_range_is_last_year_and_this_year() {
        let years = default_years();
        assert_eq!(years.len(), 2);
        assert_eq!(years[1] - years[0], 1);
        assert_eq!(years[1], Local::now().year());
    }
}
