//! arXiv identifier validation and export API client.
//!
//! Endpoints used:
//!   query: https://export.arxiv.org/api/query?id_list=<id>   (Atom feed)
//!   pdf:   https://arxiv.org/pdf/<id>

use std::fmt;

use async_trait::async_trait;
use chrono::NaiveDate;
use lazy_static::lazy_static;
use paperlens_common::sandbox::SandboxClient as Client;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use tracing::{debug, info, instrument, warn};

use super::PaperSource;
use crate::error::{ExtractionError, Result};
use crate::models::PaperMetadata;

const QUERY_URL: &str = "https://export.arxiv.org/api/query";

lazy_static! {
    // New style: 1706.03762v7. Old style: hep-th/9901001, math.GT/0309136v2.
    static ref ARXIV_ID_RE: Regex = Regex::new(
        r"^(?:(?:https?://)?(?:www\.|export\.)?arxiv\.org/(?:abs|pdf)/|(?i:arxiv:))?(?P<id>\d{4}\.\d{4,5}(?:v\d+)?|[a-z][a-z\-]*(?:\.[A-Z]{2})?/\d{7}(?:v\d+)?)(?:\.pdf)?/?$"
    ).unwrap();
}

/// A validated arXiv identifier, version suffix included when given.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArxivId(String);

impl ArxivId {
    /// Accepts `arxiv.org/abs/<id>`, `arxiv.org/pdf/<id>[.pdf]`, `arXiv:<id>`
    /// and bare identifiers.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        ARXIV_ID_RE
            .captures(trimmed)
            .and_then(|c| c.name("id"))
            .map(|m| ArxivId(m.as_str().to_string()))
            .ok_or_else(|| ExtractionError::InvalidArxivUrl(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn abs_url(&self) -> String {
        format!("https://arxiv.org/abs/{}", self.0)
    }

    pub fn pdf_url(&self) -> String {
        format!("https://arxiv.org/pdf/{}", self.0)
    }
}

impl fmt::Display for ArxivId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub struct ArxivClient {
    client: Client,
}

impl ArxivClient {
    pub fn new() -> Result<Self> {
        Ok(Self { client: Client::new()? })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PaperSource for ArxivClient {
    #[instrument(skip(self), fields(arxiv_id = %id))]
    async fn fetch_metadata(&self, id: &ArxivId) -> Result<PaperMetadata> {
        let resp = self
            .client
            .get(QUERY_URL)?
            .query(&[("id_list", id.as_str())])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ExtractionError::Fetch(format!(
                "arXiv API returned {} for {}",
                status, id
            )));
        }

        let xml = resp.text().await?;
        let meta = parse_arxiv_atom(&xml, id)?
            .ok_or_else(|| ExtractionError::Fetch(format!("arXiv has no entry for {}", id)))?;
        info!(title = %meta.title, authors = meta.authors.len(), "Fetched arXiv metadata");
        Ok(meta)
    }

    #[instrument(skip(self))]
    async fn fetch_pdf(&self, url: &str) -> Result<Vec<u8>> {
        let resp = self.client.get(url)?.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ExtractionError::Fetch(format!("PDF download returned {}", status)));
        }

        let bytes = resp.bytes().await?;
        if !bytes.starts_with(b"%PDF") {
            return Err(ExtractionError::Fetch(format!(
                "response from {} is not a PDF",
                url
            )));
        }
        debug!(bytes = bytes.len(), "Downloaded PDF");
        Ok(bytes.to_vec())
    }
}

/// Parse an export API Atom feed. Returns the first real entry; the API
/// reports unknown or malformed ids as an entry titled "Error".
pub fn parse_arxiv_atom(xml: &str, id: &ArxivId) -> Result<Option<PaperMetadata>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut in_entry     = false;
    let mut in_entry_id  = false;
    let mut in_title     = false;
    let mut in_summary   = false;
    let mut in_author    = false;
    let mut in_name      = false;
    let mut in_published = false;

    let mut entry_id  = String::new();
    let mut title     = String::new();
    let mut summary   = String::new();
    let mut name      = String::new();
    let mut published = String::new();
    let mut authors: Vec<String> = Vec::new();
    let mut pdf_link: Option<String> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"entry"     => in_entry = true,
                b"id"        if in_entry => in_entry_id = true,
                b"title"     if in_entry => in_title = true,
                b"summary"   if in_entry => in_summary = true,
                b"published" if in_entry => in_published = true,
                b"author"    if in_entry => { in_author = true; name.clear(); }
                b"name"      if in_author => in_name = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) if in_entry && e.name().as_ref() == b"link" => {
                let mut is_pdf = false;
                let mut href = None;
                for attr in e.attributes().flatten() {
                    let value = attr.unescape_value().unwrap_or_default().to_string();
                    match attr.key.as_ref() {
                        b"title" => is_pdf = value == "pdf",
                        b"href"  => href = Some(value),
                        _ => {}
                    }
                }
                if is_pdf {
                    pdf_link = href;
                }
            }
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().unwrap_or_default();
                if in_entry_id  { entry_id.push_str(&text); }
                if in_title     { title.push_str(&text); }
                if in_summary   { summary.push_str(&text); }
                if in_name      { name.push_str(&text); }
                if in_published { published.push_str(&text); }
            }
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"id"        => in_entry_id = false,
                b"title"     => in_title = false,
                b"summary"   => in_summary = false,
                b"published" => in_published = false,
                b"name"      => in_name = false,
                b"author" if in_author => {
                    let author = collapse_whitespace(&name);
                    if !author.is_empty() {
                        authors.push(author);
                    }
                    in_author = false;
                }
                b"entry" => break,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                warn!("arXiv Atom parse error: {}", e);
                return Err(ExtractionError::Fetch(format!("malformed arXiv response: {}", e)));
            }
            _ => {}
        }
        buf.clear();
    }

    let title = collapse_whitespace(&title);
    if !in_entry || title.is_empty() {
        return Ok(None);
    }
    if title == "Error" || entry_id.contains("/api/errors") {
        warn!(arxiv_id = %id, reason = %collapse_whitespace(&summary), "arXiv rejected identifier");
        return Ok(None);
    }

    let summary = collapse_whitespace(&summary);
    Ok(Some(PaperMetadata {
        arxiv_id: id.as_str().to_string(),
        title,
        authors,
        abstract_text: (!summary.is_empty()).then_some(summary),
        pdf_url: pdf_link.unwrap_or_else(|| id.pdf_url()),
        published: published
            .get(..10)
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
    }))
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const ATTENTION_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title type="html">ArXiv Query: id_list=1706.03762</title>
  <id>http://arxiv.org/api/abc</id>
  <entry>
    <id>http://arxiv.org/abs/1706.03762v7</id>
    <published>2017-06-12T17:57:34Z</published>
    <title>Attention Is All
      You Need</title>
    <summary>  The dominant sequence transduction models are based on
      complex recurrent or convolutional neural networks.
    </summary>
    <author><name>Ashish Vaswani</name></author>
    <author><name>Noam Shazeer</name></author>
    <link href="http://arxiv.org/abs/1706.03762v7" rel="alternate" type="text/html"/>
    <link title="pdf" href="http://arxiv.org/pdf/1706.03762v7" rel="related" type="application/pdf"/>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_new_style_urls() {
        for input in [
            "https://arxiv.org/abs/1706.03762",
            "http://arxiv.org/pdf/1706.03762",
            "https://arxiv.org/pdf/1706.03762.pdf",
            "arxiv.org/abs/1706.03762/",
            "https://www.arxiv.org/abs/1706.03762",
            "1706.03762",
            "arXiv:1706.03762",
        ] {
            let id = ArxivId::parse(input).unwrap();
            assert_eq!(id.as_str(), "1706.03762", "input: {input}");
        }
    }

    #[test]
    fn test_parse_keeps_version_and_five_digit_ids() {
        assert_eq!(ArxivId::parse("https://arxiv.org/abs/2401.12345v2").unwrap().as_str(), "2401.12345v2");
    }

    #[test]
    fn test_parse_old_style_ids() {
        assert_eq!(ArxivId::parse("https://arxiv.org/abs/hep-th/9901001").unwrap().as_str(), "hep-th/9901001");
        assert_eq!(ArxivId::parse("math.GT/0309136v2").unwrap().as_str(), "math.GT/0309136v2");
    }

    #[test]
    fn test_parse_rejects_other_urls() {
        for input in [
            "https://example.com/abs/1706.03762",
            "https://arxiv.org/list/cs.CL/recent",
            "https://arxiv.org/abs/17.03762",
            "not a paper",
            "",
        ] {
            assert!(
                matches!(ArxivId::parse(input), Err(ExtractionError::InvalidArxivUrl(_))),
                "input: {input}"
            );
        }
    }

    #[test]
    fn test_urls_are_built_from_id() {
        let id = ArxivId::parse("1706.03762v7").unwrap();
        assert_eq!(id.abs_url(), "https://arxiv.org/abs/1706.03762v7");
        assert_eq!(id.pdf_url(), "https://arxiv.org/pdf/1706.03762v7");
    }

    #[test]
    fn test_parse_atom_entry() {
        let id = ArxivId::parse("1706.03762").unwrap();
        let meta = parse_arxiv_atom(ATTENTION_FEED, &id).unwrap().unwrap();
        assert_eq!(meta.title, "Attention Is All You Need");
        assert_eq!(meta.authors, vec!["Ashish Vaswani", "Noam Shazeer"]);
        assert_eq!(meta.authors_display(), "Ashish Vaswani, Noam Shazeer");
        assert!(meta.abstract_text.unwrap().starts_with("The dominant sequence"));
        assert_eq!(meta.pdf_url, "http://arxiv.org/pdf/1706.03762v7");
        assert_eq!(meta.published, NaiveDate::from_ymd_opt(2017, 6, 12));
    }

    #[test]
    fn test_error_entry_is_none() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <entry>
    <id>http://arxiv.org/api/errors#incorrect_id_format_for_9999.0</id>
    <title>Error</title>
    <summary>incorrect id format for 9999.0</summary>
  </entry>
</feed>"#;
        let id = ArxivId::parse("9999.00001").unwrap();
        assert!(parse_arxiv_atom(xml, &id).unwrap().is_none());
    }

    #[test]
    fn test_empty_feed_is_none() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>ArXiv Query</title></feed>"#;
        let id = ArxivId::parse("1706.03762").unwrap();
        assert!(parse_arxiv_atom(xml, &id).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fetch_pdf_rejects_unlisted_host() {
        let client = ArxivClient::new().unwrap();
        let err = client.fetch_pdf("https://example.com/paper.pdf").await.unwrap_err();
        assert!(matches!(err, ExtractionError::Sandbox(_)));
    }
}
