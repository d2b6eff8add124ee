//! PubMed E-utilities client.
//!
//! Endpoints used:
//!   esearch: https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi
//!   efetch:  https://eutils.ncbi.nlm.nih.gov/entrez/eutils/efetch.fcgi

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;

use pubharvest_common::net::AllowlistClient;
use pubharvest_common::Result;

use super::{BibliographicSource, SearchQuery};
use crate::models::PubmedArticle;
use crate::normalize;

const ESEARCH_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi";
const EFETCH_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/efetch.fcgi";

/// Maximum number of search hits requested per query. The client does
/// not paginate beyond this; an accepted limitation.
pub const DEFAULT_RETMAX: usize = 100;

pub struct PubMedClient {
    client: AllowlistClient,
    retmax: usize,
}

impl PubMedClient {
    pub fn new() -> Result<Self> {
        Self::with_retmax(DEFAULT_RETMAX)
    }

    pub fn with_retmax(retmax: usize) -> Result<Self> {
        Ok(Self {
            client: AllowlistClient::new()?,
            retmax,
        })
    }
}

#[async_trait]
impl BibliographicSource for PubMedClient {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<String>> {
        let params = vec![
            ("db", "pubmed".to_string()),
            ("retmax", self.retmax.to_string()),
            ("term", query.term()),
        ];
        let xml = self
            .client
            .get(ESEARCH_URL)?
            .query(&params)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let pmids = parse_id_list(&xml)?;
        debug!(n = pmids.len(), term = %params[2].1, "esearch returned PMIDs");
        Ok(pmids)
    }

    async fn fetch(&self, pmid: &str) -> Result<PubmedArticle> {
        let params = vec![
            ("db", "pubmed".to_string()),
            ("rettype", "abstract".to_string()),
            ("id", pmid.to_string()),
        ];
        let xml = self
            .client
            .get(EFETCH_URL)?
            .query(&params)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        debug!(pmid, bytes = xml.len(), "efetch response received");
        normalize::parse_article_set(&xml)
    }
}

/// Parse the esearch response: the text of every `IdList/Id` element.
fn parse_id_list(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut ids = Vec::new();
    let mut in_id_list = false;
    let mut in_id = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => match e.name().as_ref() {
                b"IdList" => in_id_list = true,
                b"Id" if in_id_list => in_id = true,
                _ => {}
            },
            Event::Text(ref e) => {
                if in_id {
                    ids.push(e.unescape()?.into_owned());
                }
            }
            Event::End(ref e) => match e.name().as_ref() {
                b"IdList" => in_id_list = false,
                b"Id" => in_id = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(ids)
}
