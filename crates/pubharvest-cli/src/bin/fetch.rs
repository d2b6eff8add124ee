//! pubharvest-fetch — one ingestion run over the configured roster.
//!
//! Optional arguments are investigator names filtering the roster
//! (underscores for spaces, any case). Per-investigator failures land
//! in the logged report; the exit status is non-zero only for
//! driver-level fatal errors.

use tracing::{info, warn};

use pubharvest_cli::config::Config;
use pubharvest_cli::init_tracing;
use pubharvest_ingestion::ingest::{filter_roster, run_ingestion};
use pubharvest_ingestion::source::PubMedClient;
use pubharvest_store::JsonStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    info!("pubharvest-fetch {}", env!("CARGO_PKG_VERSION"));

    let config = Config::load()?;
    let names: Vec<String> = std::env::args().skip(1).collect();
    let roster = filter_roster(&config.investigators, &names);
    if roster.is_empty() {
        warn!("no investigators selected, nothing to do");
        return Ok(());
    }
    info!(
        investigators = roster.len(),
        store = %config.store.path,
        "starting ingestion run"
    );

    let store = JsonStore::open(&config.store.path)?;
    let source = PubMedClient::with_retmax(config.pubmed.retmax)?;

    let report = run_ingestion(
        &store,
        &source,
        &roster,
        &config.pubmed.years,
        config.pubmed.delay(),
        config.tagging_rules(),
    )
    .await;

    for pi in &report.investigators {
        match &pi.error {
            Some(error) => warn!(name = %pi.name, %error, "investigator failed"),
            None => info!(name = %pi.name, found = pi.found, added = pi.added, "investigator ok"),
        }
    }

    store.flush().await?;
    info!(
        found = report.found(),
        added = report.added(),
        failures = report.failures(),
        "ingestion run complete"
    );
    Ok(())
}
