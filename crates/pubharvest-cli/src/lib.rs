//! pubharvest-cli — configuration loading and the two batch binaries
//! (`pubharvest-fetch`, `pubharvest-patch`).

pub mod config;

use tracing_subscriber::EnvFilter;

/// Initialise structured logging. `RUST_LOG` overrides the default
/// filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pubharvest=debug,info")),
        )
        .init();
}
