//! Configuration loading for pubharvest.
//! Reads pubharvest.toml from the current directory or the path in the
//! PUBHARVEST_CONFIG env var.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use pubharvest_ingestion::source::pubmed::DEFAULT_RETMAX;
use pubharvest_ingestion::{Investigator, TaggingRules};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub pubmed: PubmedConfig,
    #[serde(default)]
    pub tagging: TaggingConfig,
    /// The investigator roster, `[[investigators]]` tables.
    #[serde(default)]
    pub investigators: Vec<Investigator>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: String,
}

fn default_store_path() -> String {
    "pubharvest.json".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PubmedConfig {
    #[serde(default = "default_retmax")]
    pub retmax: usize,
    /// Politeness delay between investigators (fetch) or between
    /// re-fetched records (patch).
    #[serde(default = "default_delay_seconds")]
    pub delay_seconds: u64,
    /// Years to search. Empty means last year and this year.
    #[serde(default)]
    pub years: Vec<i32>,
}

fn default_retmax() -> usize {
    DEFAULT_RETMAX
}

fn default_delay_seconds() -> u64 {
    10
}

impl Default for PubmedConfig {
    fn default() -> Self {
        Self {
            retmax: default_retmax(),
            delay_seconds: default_delay_seconds(),
            years: Vec::new(),
        }
    }
}

impl PubmedConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaggingConfig {
    #[serde(default = "default_markers")]
    pub markers: Vec<String>,
    #[serde(default = "default_tag")]
    pub tag: String,
}

fn default_markers() -> Vec<String> {
    TaggingRules::default().markers
}

fn default_tag() -> String {
    TaggingRules::default().tag
}

impl Default for TaggingConfig {
    fn default() -> Self {
        Self {
            markers: default_markers(),
            tag: default_tag(),
        }
    }
}

impl From<TaggingConfig> for TaggingRules {
    fn from(config: TaggingConfig) -> Self {
        Self {
            markers: config.markers,
            tag: config.tag,
        }
    }
}

impl Config {
    /// Load configuration from pubharvest.toml.
    /// Checks PUBHARVEST_CONFIG env var first, then the current directory.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("PUBHARVEST_CONFIG")
            .unwrap_or_else(|_| "pubharvest.toml".to_string());

        if !Path::new(&path).exists() {
            anyhow::bail!(
                "Config file not found: {}\n\
                 Copy pubharvest.example.toml to pubharvest.toml and edit it.",
                path
            );
        }

        let content = std::fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn tagging_rules(&self) -> TaggingRules {
        self.tagging.clone().into()
    }
}
