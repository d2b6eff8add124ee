//! Allowlist-capped HTTP client.
//!
//! The pipelines only ever talk to the NCBI E-utilities host; capping
//! the client to an explicit allowlist keeps a misconfigured URL from
//! reaching anywhere else.

use std::collections::HashSet;
use std::time::Duration;

use reqwest::{Client, ClientBuilder};
use url::Url;

use crate::error::{HarvestError, Result};

/// Default timeout for calls to the bibliographic service.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// An HTTP client that only allows requests to approved hosts.
#[derive(Debug, Clone)]
pub struct AllowlistClient {
    client: Client,
    allowlist: HashSet<String>,
}

impl AllowlistClient {
    /// Create a client allowing only the NCBI E-utilities host, with
    /// the default 30 s timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let mut allowlist = HashSet::new();
        allowlist.insert("eutils.ncbi.nlm.nih.gov".to_string());

        let client = ClientBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("pubharvest/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, allowlist })
    }

    /// Append an exact hostname to the allowlist.
    pub fn allow_host(&mut self, host: &str) {
        self.allowlist.insert(host.to_string());
    }

    /// Whether a URL is permitted under the current allowlist.
    /// Subdomains of an allowed host are permitted.
    pub fn is_allowed(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };
        self.allowlist
            .iter()
            .any(|allowed| host == allowed || host.ends_with(&format!(".{allowed}")))
    }

    /// Build a GET request, failing if the URL is outside the allowlist.
    pub fn get(&self, url: &str) -> Result<reqwest::RequestBuilder> {
        if !self.is_allowed(url) {
            return Err(HarvestError::Config(format!(
                "host not in allowlist for URL {url}"
            )));
        }
        Ok(self.client.get(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ncbi_host_is_allowed() {
        let client = AllowlistClient::new().unwrap();
        assert!(client.is_allowed(
            "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi?db=pubmed"
        ));
    }

    #[test]
    fn other_hosts_are_rejected() {
        let client = AllowlistClient::new().unwrap();
        assert!(!client.is_allowed("https://example.com/efetch.fcgi"));
        assert!(client.get("https://example.com/efetch.fcgi").is_err());
    }

    #[test]
    fn added_hosts_and_subdomains_are_allowed() {
        let mut client = AllowlistClient::new().unwrap();
        client.allow_host("example.org");
        assert!(client.is_allowed("https://example.org/x"));
        assert!(client.is_allowed("https://api.example.org/x"));
    }
}
