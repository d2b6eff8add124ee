//! pubharvest-patch — re-fetch incomplete records and patch their
//! re-derivable fields. No arguments; per-record failures land in the
//! logged report and do not affect the exit status.

use tracing::{info, warn};

use pubharvest_cli::config::Config;
use pubharvest_cli::init_tracing;
use pubharvest_ingestion::run_patch;
use pubharvest_ingestion::source::PubMedClient;
use pubharvest_store::JsonStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    info!("pubharvest-patch {}", env!("CARGO_PKG_VERSION"));

    let config = Config::load()?;
    let store = JsonStore::open(&config.store.path)?;
    let source = PubMedClient::with_retmax(config.pubmed.retmax)?;

    let report = run_patch(&store, &source, config.pubmed.delay()).await?;
    for error in &report.errors {
        warn!(%error, "record patch failed");
    }

    store.flush().await?;
    info!(
        examined = report.examined,
        patched = report.patched,
        unchanged = report.unchanged,
        missing = report.missing,
        skipped = report.skipped,
        failures = report.errors.len(),
        "patch run complete"
    );
    Ok(())
}
