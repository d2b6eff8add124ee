//! PubMed XML normalization.
//!
//! Maps an efetch `PubmedArticleSet` document into a [`PubmedArticle`],
//! applying the fallback rules for missing or ambiguous fields: author
//! name fallbacks, the published-date resolution chain, abstract
//! section joining, and xref collection with guaranteed
//! self-identification.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use pubharvest_common::text::to_ascii;
use pubharvest_common::{HarvestError, Result};
use pubharvest_store::{AuthorName, Journal, Xref};

use crate::models::PubmedArticle;

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// History statuses tried when neither the journal issue nor the
/// article carries a usable date, most authoritative first.
const HISTORY_PREFERENCE: [&str; 3] = ["epublish", "aheadofprint", "pubmed"];

#[derive(Debug, Default)]
struct RawAuthor {
    last: Option<String>,
    fore: Option<String>,
    initials: Option<String>,
    collective: Option<String>,
}

#[derive(Debug, Default)]
struct RawDate {
    year: Option<String>,
    month: Option<String>,
    day: Option<String>,
}

#[derive(Default)]
struct Collected {
    saw_pubmed_article: bool,
    saw_article: bool,
    title: String,
    raw_authors: Vec<RawAuthor>,
    current_author: Option<RawAuthor>,
    affiliation: Option<String>,
    kind: Option<String>,
    saw_journal: bool,
    journal: Journal,
    abstract_sections: Vec<String>,
    pub_date: RawDate,
    article_date: RawDate,
    history: Vec<(String, RawDate)>,
    current_history: Option<(String, RawDate)>,
    xrefs: Vec<Xref>,
    current_id_type: Option<String>,
    current_bank: Option<String>,
    citation_pmid: Option<String>,
}

/// Parse an efetch response into a normalized article.
///
/// Fails with `NotFound` when the response contains no `PubmedArticle`
/// node (the id does not exist upstream), `InvalidRecord` when the
/// article container lacks the `MedlineCitation/Article` structure, and
/// `Parse` on malformed XML.
pub fn parse_article_set(xml: &str) -> Result<PubmedArticle> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut c = Collected::default();
    let mut path: Vec<String> = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                path.push(String::from_utf8_lossy(e.name().as_ref()).into_owned());
                on_start(&mut c, &path, e)?;
            }
            Event::Text(ref e) => {
                let text = e.unescape()?;
                if !text.is_empty() {
                    on_text(&mut c, &path, &text);
                }
            }
            Event::End(_) => {
                on_end(&mut c, &path);
                path.pop();
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    assemble(c)
}

fn on_start(c: &mut Collected, path: &[String], e: &BytesStart<'_>) -> Result<()> {
    match e.name().as_ref() {
        b"PubmedArticle" => c.saw_pubmed_article = true,
        b"Article" if ends_with(path, &["MedlineCitation", "Article"]) => c.saw_article = true,
        b"Journal" if ends_with(path, &["Article", "Journal"]) => c.saw_journal = true,
        b"Author" if ends_with(path, &["AuthorList", "Author"]) => {
            c.current_author = Some(RawAuthor::default());
        }
        b"AbstractText" if ends_with(path, &["Abstract", "AbstractText"]) => {
            c.abstract_sections.push(String::new());
        }
        b"PubMedPubDate" if ends_with(path, &["History", "PubMedPubDate"]) => {
            let status = attribute(e, "PubStatus")?.unwrap_or_default();
            c.current_history = Some((status, RawDate::default()));
        }
        // Anchored under PubmedData: the ArticleIdList entries inside
        // ReferenceList identify cited papers, not this record.
        b"ArticleId" if ends_with(path, &["PubmedData", "ArticleIdList", "ArticleId"]) => {
            // The DTD default for a missing IdType is "pubmed".
            c.current_id_type = Some(attribute(e, "IdType")?.unwrap_or_else(|| "pubmed".into()));
        }
        _ => {}
    }
    Ok(())
}

fn on_text(c: &mut Collected, path: &[String], text: &str) {
    let Some(leaf) = path.last().map(String::as_str) else {
        return;
    };

    // Author name parts take precedence while an Author is open.
    if let Some(author) = c.current_author.as_mut() {
        match leaf {
            "LastName" => return author.last = Some(text.to_string()),
            "ForeName" => return author.fore = Some(text.to_string()),
            "Initials" => return author.initials = Some(text.to_string()),
            "CollectiveName" => return author.collective = Some(text.to_string()),
            _ => {}
        }
    }
    if let Some((_, date)) = c.current_history.as_mut() {
        if ends_with(path, &["PubMedPubDate", "Year"]) {
            return date.year = Some(text.to_string());
        }
        if ends_with(path, &["PubMedPubDate", "Month"]) {
            return date.month = Some(text.to_string());
        }
        if ends_with(path, &["PubMedPubDate", "Day"]) {
            return date.day = Some(text.to_string());
        }
    }

    match leaf {
        "ArticleTitle" => c.title.push_str(text),
        "Affiliation" => {
            if c.affiliation.is_none() {
                c.affiliation = Some(text.to_string());
            }
        }
        "PublicationType" => {
            if c.kind.is_none() {
                c.kind = Some(text.to_lowercase());
            }
        }
        "Title" if ends_with(path, &["Journal", "Title"]) => {
            c.journal.title = Some(text.to_string());
        }
        "ISOAbbreviation" if ends_with(path, &["Journal", "ISOAbbreviation"]) => {
            c.journal.abbreviation = Some(text.to_string());
        }
        "ISSN" if ends_with(path, &["Journal", "ISSN"]) => {
            c.journal.issn = Some(text.to_string());
        }
        "Volume" if ends_with(path, &["JournalIssue", "Volume"]) => {
            c.journal.volume = Some(text.to_string());
        }
        "Issue" if ends_with(path, &["JournalIssue", "Issue"]) => {
            c.journal.issue = Some(text.to_string());
        }
        "MedlinePgn" if ends_with(path, &["Pagination", "MedlinePgn"]) => {
            c.journal.pages = Some(expand_pages(text));
        }
        "Year" | "Month" | "Day" => {
            let date = if ends_with(path, &["PubDate", leaf]) {
                Some(&mut c.pub_date)
            } else if ends_with(path, &["ArticleDate", leaf]) {
                Some(&mut c.article_date)
            } else {
                None
            };
            if let Some(date) = date {
                match leaf {
                    "Year" => date.year = Some(text.to_string()),
                    "Month" => date.month = Some(text.to_string()),
                    _ => date.day = Some(text.to_string()),
                }
            }
        }
        "AbstractText" => {
            if let Some(section) = c.abstract_sections.last_mut() {
                section.push_str(text);
            }
        }
        "ArticleId" if ends_with(path, &["PubmedData", "ArticleIdList", "ArticleId"]) => {
            if let Some(xdb) = c.current_id_type.clone() {
                push_xref(&mut c.xrefs, xdb, text.to_string());
            }
        }
        "DataBankName" => c.current_bank = Some(text.to_string()),
        "AccessionNumber" => {
            if let Some(xdb) = c.current_bank.clone() {
                push_xref(&mut c.xrefs, xdb, text.to_string());
            }
        }
        "PMID" if ends_with(path, &["MedlineCitation", "PMID"]) => {
            if c.citation_pmid.is_none() {
                c.citation_pmid = Some(text.to_string());
            }
        }
        _ => {}
    }
}

fn on_end(c: &mut Collected, path: &[String]) {
    match path.last().map(String::as_str) {
        Some("Author") => {
            if let Some(raw) = c.current_author.take() {
                c.raw_authors.push(raw);
            }
        }
        Some("PubMedPubDate") => {
            if let Some(entry) = c.current_history.take() {
                c.history.push(entry);
            }
        }
        Some("ArticleId") => c.current_id_type = None,
        Some("DataBank") => c.current_bank = None,
        _ => {}
    }
}

fn assemble(c: Collected) -> Result<PubmedArticle> {
    if !c.saw_pubmed_article {
        return Err(HarvestError::NotFound(
            "no PubmedArticle in response".to_string(),
        ));
    }
    if !c.saw_article {
        return Err(HarvestError::InvalidRecord(
            "missing MedlineCitation/Article".to_string(),
        ));
    }

    let mut xrefs = c.xrefs;
    let self_identified = xrefs.iter().any(|x| x.xdb.eq_ignore_ascii_case("pubmed"));
    if !self_identified {
        let pmid = c.citation_pmid.ok_or_else(|| {
            HarvestError::InvalidRecord("record carries no PubMed identifier".to_string())
        })?;
        push_xref(&mut xrefs, "pubmed".to_string(), pmid);
    }

    let journal = if c.saw_journal || c.journal != Journal::default() {
        Some(c.journal)
    } else {
        None
    };

    let now = chrono::Local::now();
    use chrono::Datelike;

    Ok(PubmedArticle {
        title: if c.title.is_empty() {
            "[no title]".to_string()
        } else {
            c.title
        },
        authors: c.raw_authors.into_iter().filter_map(build_author).collect(),
        affiliation: c.affiliation,
        journal,
        kind: c.kind,
        published: resolve_published(
            &c.pub_date,
            &c.article_date,
            &c.history,
            (now.year(), now.month()),
        ),
        abstract_text: c.abstract_sections.join("\n\n"),
        xrefs,
        tags: Vec::new(),
    })
}

// ── Authors ───────────────────────────────────────────────────────────────────

/// Resolve an author node: last name, then forename standing in for a
/// missing last name, then a collective/group name (with forename and
/// initials nulled rather than left stale). Entries with no name
/// information at all are dropped.
fn build_author(raw: RawAuthor) -> Option<AuthorName> {
    let (last, fore, initials) = if let Some(last) = raw.last {
        (last, raw.fore, raw.initials)
    } else if let Some(fore) = raw.fore {
        (fore, None, raw.initials)
    } else if let Some(collective) = raw.collective {
        (collective, None, None)
    } else {
        return None;
    };
    Some(AuthorName {
        last_name_normalized: to_ascii(&last),
        fore_name_normalized: fore.as_deref().map(to_ascii),
        initials_normalized: initials.as_deref().map(to_ascii),
        last_name: last,
        fore_name: fore,
        initials,
    })
}

// ── Published date ────────────────────────────────────────────────────────────

#[derive(Debug, PartialEq)]
struct DateParts {
    year: i32,
    month: Option<u32>,
    /// 0 is the "unknown day" sentinel; only meaningful with a month.
    day: u32,
}

/// Resolve the published date: the journal issue's PubDate, then
/// ArticleDate, then the history entries in `HISTORY_PREFERENCE`
/// order. The first source yielding at least a year wins; with no year
/// anywhere, the current year and month are used with the day sentinel.
fn resolve_published(
    pub_date: &RawDate,
    article_date: &RawDate,
    history: &[(String, RawDate)],
    now: (i32, u32),
) -> String {
    for date in [pub_date, article_date] {
        if let Some(parts) = date_fields(date) {
            return format_published(&parts, now);
        }
    }
    for status in HISTORY_PREFERENCE {
        for (_, date) in history.iter().filter(|(s, _)| s == status) {
            if let Some(parts) = date_fields(date) {
                return format_published(&parts, now);
            }
        }
    }
    format!("{:04}-{:02}-00", now.0, now.1)
}

/// A date is usable if it has a parseable year. An unparseable month
/// drops both month and day; an unparseable day degrades to the
/// sentinel.
fn date_fields(d: &RawDate) -> Option<DateParts> {
    let year = d.year.as_deref()?.parse::<i32>().ok()?;
    let month = d.month.as_deref().and_then(parse_month);
    let day = match month {
        Some(_) => d
            .day
            .as_deref()
            .and_then(|t| t.parse::<u32>().ok())
            .filter(|day| (1..=31).contains(day))
            .unwrap_or(0),
        None => 0,
    };
    Some(DateParts { year, month, day })
}

fn format_published(parts: &DateParts, now: (i32, u32)) -> String {
    match parts.month {
        Some(month) => format!("{:04}-{:02}-{:02}", parts.year, month, parts.day),
        // Year but no month: current local month, day unknown.
        None => format!("{:04}-{:02}-00", parts.year, now.1),
    }
}

/// Month names are matched case-insensitively on their first three
/// letters; a numeric string is accepted directly. Values outside
/// 1..=12 are unparseable.
fn parse_month(text: &str) -> Option<u32> {
    let lower = text.to_lowercase();
    let key: String = lower.chars().take(3).collect();
    if let Some(pos) = MONTHS.iter().position(|m| *m == key) {
        return Some(pos as u32 + 1);
    }
    lower.parse::<u32>().ok().filter(|m| (1..=12).contains(m))
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Expand a MEDLINE page range with an abbreviated end page, so
/// `"123-9"` becomes `"123-129"`. Anything else passes through.
pub fn expand_pages(pages: &str) -> String {
    let parts: Vec<&str> = pages.split('-').collect();
    if parts.len() < 2 || parts[1].is_empty() {
        return pages.to_string();
    }
    let first: Vec<char> = parts[0].chars().collect();
    let second_len = parts[1].chars().count();
    if first.len() <= second_len {
        return pages.to_string();
    }
    let mut out: Vec<String> = parts.iter().map(|s| s.to_string()).collect();
    let prefix: String = first[..first.len() - second_len].iter().collect();
    out[1] = format!("{prefix}{}", parts[1]);
    out.join("-")
}

fn push_xref(xrefs: &mut Vec<Xref>, xdb: String, xkey: String) {
    let xref = Xref { xdb, xkey };
    if !xrefs.contains(&xref) {
        xrefs.push(xref);
    }
}

fn ends_with(path: &[String], suffix: &[&str]) -> bool {
    path.len() >= suffix.len()
        && path[path.len() - suffix.len()..]
            .iter()
            .zip(suffix)
            .all(|(a, b)| a == b)
}

fn attribute(e: &BytesStart<'_>, name: &str) -> Result<Option<String>> {
    let attr = e
        .try_get_attribute(name)
        .map_err(|err| HarvestError::Parse(err.to_string()))?;
    match attr {
        Some(attr) => Ok(Some(attr.unescape_value()?.into_owned())),
        None => Ok(None),
    }
}
