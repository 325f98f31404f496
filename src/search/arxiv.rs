//! arXiv Client
//!
//! Looks papers up through the public Atom API and loads each hit's full text
//! from its PDF. When the PDF cannot be downloaded or yields no text, the
//! abstract stands in as the paper content.
//!
//! A query made only of arXiv identifiers (`1706.03762`, `1706.03762v7`) is
//! looked up by id instead of searched. Queries are capped at
//! [`MAX_QUERY_CHARS`] characters.

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

use super::{collapse_whitespace, unescape_entities, PaperSource, SearchError};

pub const ARXIV_API_BASE: &str = "https://export.arxiv.org";

/// Longer queries are cut to this many characters
pub const MAX_QUERY_CHARS: usize = 300;

/// A paper returned by the index
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Paper {
    /// Abstract page URL, e.g. http://arxiv.org/abs/1706.03762v7
    pub entry_id: String,
    pub title: String,
    pub authors: Vec<String>,
    pub summary: String,
    pub published: Option<String>,
    pub pdf_url: Option<String>,
    /// Full text (or the abstract when the PDF was unusable)
    pub content: String,
}

pub struct ArxivClient {
    client: Client,
    api_base: String,
}

impl ArxivClient {
    pub fn new(api_base: &str) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    /// Query the Atom API, returning entries without content
    pub async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Paper>, SearchError> {
        let query = crate::tools::truncate_chars(query, MAX_QUERY_CHARS);
        let url = if is_arxiv_identifier(query) {
            let ids: Vec<&str> = query.split_whitespace().collect();
            format!(
                "{}/api/query?id_list={}&start=0&max_results={}",
                self.api_base,
                urlencoding::encode(&ids.join(",")),
                max_results
            )
        } else {
            format!(
                "{}/api/query?search_query={}&start=0&max_results={}",
                self.api_base,
                urlencoding::encode(query),
                max_results
            )
        };
        info!(query = %query, max_results, "Searching arXiv");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SearchError::RequestFailed(format!("arXiv search failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::RequestFailed(format!("arXiv returned {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SearchError::RequestFailed(format!("arXiv read failed: {}", e)))?;

        let mut papers = parse_atom_feed(&body);
        papers.truncate(max_results);
        debug!(count = papers.len(), "arXiv feed parsed");
        Ok(papers)
    }

    /// Download a PDF and extract its text
    async fn load_pdf_text(&self, pdf_url: &str) -> Result<String, SearchError> {
        let response = self
            .client
            .get(pdf_url)
            .send()
            .await
            .map_err(|e| SearchError::RequestFailed(format!("PDF download failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::RequestFailed(format!("PDF download returned {}", status)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SearchError::RequestFailed(format!("PDF read failed: {}", e)))?;

        // lopdf is CPU-bound and untrusted input may make it panic
        tokio::task::spawn_blocking(move || extract_pdf_text(&bytes))
            .await
            .map_err(|e| SearchError::ParseError(format!("PDF extraction aborted: {}", e)))?
    }
}

#[async_trait]
impl PaperSource for ArxivClient {
    async fn fetch(&self, query: &str, max_docs: usize) -> Result<Vec<Paper>, SearchError> {
        let mut papers = self.search(query, max_docs).await?;

        for paper in &mut papers {
            let text = match &paper.pdf_url {
                Some(url) => self.load_pdf_text(url).await,
                None => Err(SearchError::ParseError("entry has no PDF link".to_string())),
            };
            paper.content = match text {
                Ok(text) => text,
                Err(e) => {
                    warn!(entry = %paper.entry_id, error = %e, "Falling back to abstract");
                    paper.summary.clone()
                }
            };
        }

        info!(count = papers.len(), "arXiv fetch completed");
        Ok(papers)
    }
}

/// True when every whitespace-separated word is an arXiv identifier
fn is_arxiv_identifier(query: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"^(?:\d{2}(?:0[1-9]|1[0-2])\.\d{4,5}(?:v\d+)?|\d{7}.*)$")
            .expect("valid arXiv id regex")
    });

    let mut words = query.split_whitespace().peekable();
    words.peek().is_some() && words.all(|w| re.is_match(w))
}

fn extract_pdf_text(bytes: &[u8]) -> Result<String, SearchError> {
    let document = lopdf::Document::load_mem(bytes)
        .map_err(|e| SearchError::ParseError(format!("Invalid PDF: {}", e)))?;

    let pages: Vec<u32> = document.get_pages().keys().copied().collect();
    let text = document
        .extract_text(&pages)
        .map_err(|e| SearchError::ParseError(format!("PDF text extraction failed: {}", e)))?;

    if text.trim().is_empty() {
        return Err(SearchError::ParseError("PDF contains no extractable text".to_string()));
    }
    Ok(text)
}

/// Parse an arXiv Atom feed into papers (content left empty)
fn parse_atom_feed(xml: &str) -> Vec<Paper> {
    xml.split("<entry>")
        .skip(1)
        .filter_map(|entry| {
            let entry = entry.split("</entry>").next().unwrap_or(entry);
            let entry_id = extract_tag(entry, "id")?.trim().to_string();
            let title = collapse_whitespace(&unescape_entities(&extract_tag(entry, "title")?));
            let summary = extract_tag(entry, "summary")
                .map(|s| collapse_whitespace(&unescape_entities(&s)))
                .unwrap_or_default();
            let published = extract_tag(entry, "published").map(|p| p.trim().to_string());

            let authors = entry
                .split("<author>")
                .skip(1)
                .filter_map(|a| extract_tag(a, "name"))
                .map(|n| collapse_whitespace(&unescape_entities(&n)))
                .collect();

            let pdf_url = find_pdf_link(entry).or_else(|| {
                entry_id
                    .contains("/abs/")
                    .then(|| entry_id.replacen("/abs/", "/pdf/", 1))
            });

            Some(Paper {
                entry_id,
                title,
                authors,
                summary,
                published,
                pdf_url,
                content: String::new(),
            })
        })
        .collect()
}

/// Content between `<tag ...>` and `</tag>`
fn extract_tag(xml: &str, tag: &str) -> Option<String> {
    let open = format!("<{}", tag);
    let close = format!("</{}>", tag);
    let mut search_from = 0;

    // Skip longer tag names sharing the prefix (<id> vs <idx>)
    loop {
        let start = xml[search_from..].find(&open)? + search_from;
        let after = &xml[start + open.len()..];
        if after.starts_with('>') || after.starts_with(char::is_whitespace) {
            let content_start = start + xml[start..].find('>')? + 1;
            let end = xml[content_start..].find(&close)? + content_start;
            return Some(xml[content_start..end].to_string());
        }
        search_from = start + open.len();
    }
}

fn find_pdf_link(entry: &str) -> Option<String> {
    entry
        .split("<link")
        .skip(1)
        .map(|link| link.split('>').next().unwrap_or(link))
        .find(|attrs| attrs.contains("title=\"pdf\""))
        .and_then(|attrs| attribute(attrs, "href"))
}

fn attribute(attrs: &str, name: &str) -> Option<String> {
    let marker = format!("{}=\"", name);
    let start = attrs.find(&marker)? + marker.len();
    let end = attrs[start..].find('"')? + start;
    Some(unescape_entities(&attrs[start..end]))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title type="html">ArXiv Query: search_query=all:transformers</title>
  <id>http://arxiv.org/api/cHxbiOdZaP56ODnBPIenZhzg5f8</id>
  <entry>
    <id>http://arxiv.org/abs/1706.03762v7</id>
    <published>2017-06-12T17:57:34Z</published>
    <title>Attention Is All
      You Need</title>
    <summary>  The dominant sequence transduction models are based on complex
recurrent or convolutional neural networks &amp; attention.
    </summary>
    <author>
      <name>Ashish Vaswani</name>
    </author>
    <author>
      <name>Noam Shazeer</name>
    </author>
    <link href="http://arxiv.org/abs/1706.03762v7" rel="alternate" type="text/html"/>
    <link title="pdf" href="http://arxiv.org/pdf/1706.03762v7" rel="related" type="application/pdf"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/1810.04805v2</id>
    <title>BERT</title>
    <summary>Pre-training of deep bidirectional transformers.</summary>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_atom_feed() {
        let papers = parse_atom_feed(FEED);
        assert_eq!(papers.len(), 2);

        let first = &papers[0];
        assert_eq!(first.entry_id, "http://arxiv.org/abs/1706.03762v7");
        assert_eq!(first.title, "Attention Is All You Need");
        assert_eq!(first.authors, vec!["Ashish Vaswani", "Noam Shazeer"]);
        assert!(first.summary.starts_with("The dominant sequence"));
        assert!(first.summary.ends_with("neural networks & attention."));
        assert_eq!(first.published.as_deref(), Some("2017-06-12T17:57:34Z"));
        assert_eq!(first.pdf_url.as_deref(), Some("http://arxiv.org/pdf/1706.03762v7"));

        // No explicit PDF link: derived from the abstract URL
        assert_eq!(papers[1].pdf_url.as_deref(), Some("http://arxiv.org/pdf/1810.04805v2"));
        assert!(papers[1].authors.is_empty());
    }

    #[test]
    fn test_parse_empty_feed() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>empty</title></feed>"#;
        assert!(parse_atom_feed(xml).is_empty());
    }

    #[test]
    fn test_extract_tag_skips_prefix_matches() {
        let xml = "<idx>nope</idx><id>yes</id>";
        assert_eq!(extract_tag(xml, "id").as_deref(), Some("yes"));
        assert_eq!(extract_tag("<title type=\"text\">T</title>", "title").as_deref(), Some("T"));
        assert_eq!(extract_tag("<title>unterminated", "title"), None);
    }

    #[test]
    fn test_is_arxiv_identifier() {
        assert!(is_arxiv_identifier("1706.03762"));
        assert!(is_arxiv_identifier("1706.03762v7"));
        assert!(is_arxiv_identifier("2401.00001 1810.04805v2"));
        assert!(is_arxiv_identifier("9901001"));
        assert!(!is_arxiv_identifier("1713.03762"));
        assert!(!is_arxiv_identifier("1706.03762v7x"));
        assert!(!is_arxiv_identifier("1706.03762 transformers"));
        assert!(!is_arxiv_identifier("attention is all you need"));
        assert!(!is_arxiv_identifier("   "));
    }

    #[test]
    fn test_extract_pdf_text_rejects_garbage() {
        assert!(matches!(
            extract_pdf_text(b"<html>not a pdf</html>"),
            Err(SearchError::ParseError(_))
        ));
    }

    fn feed_with_pdf(pdf_url: &str) -> String {
        format!(
            r#"<feed><entry>
  <id>http://arxiv.org/abs/2401.00001v1</id>
  <title>A Survey of Transformers</title>
  <summary>Transformers have achieved great success.</summary>
  <link title="pdf" href="{}" rel="related" type="application/pdf"/>
</entry></feed>"#,
            pdf_url
        )
    }

    #[tokio::test]
    async fn test_fetch_falls_back_to_abstract() {
        let mut server = mockito::Server::new_async().await;
        let search = server
            .mock("GET", "/api/query")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("search_query".into(), "transformers".into()),
                mockito::Matcher::UrlEncoded("max_results".into(), "1".into()),
            ]))
            .with_status(200)
            .with_body(feed_with_pdf(&format!("{}/pdf/2401.00001v1", server.url())))
            .create_async()
            .await;
        server
            .mock("GET", "/pdf/2401.00001v1")
            .with_status(404)
            .create_async()
            .await;

        let client = ArxivClient::new(&server.url());
        let papers = client.fetch("transformers", 1).await.unwrap();

        assert_eq!(papers.len(), 1);
        assert_eq!(papers[0].title, "A Survey of Transformers");
        assert_eq!(papers[0].content, "Transformers have achieved great success.");
        search.assert_async().await;
    }

    #[tokio::test]
    async fn test_identifier_query_uses_id_list() {
        let mut server = mockito::Server::new_async().await;
        let lookup = server
            .mock("GET", "/api/query")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("id_list".into(), "1706.03762v7,1810.04805".into()),
                mockito::Matcher::UrlEncoded("max_results".into(), "2".into()),
            ]))
            .with_status(200)
            .with_body(FEED)
            .create_async()
            .await;

        let client = ArxivClient::new(&server.url());
        let papers = client.search(" 1706.03762v7  1810.04805 ", 2).await.unwrap();

        assert_eq!(papers.len(), 2);
        lookup.assert_async().await;
    }

    #[tokio::test]
    async fn test_long_query_is_capped() {
        let query = "transformer ".repeat(40);
        let capped: String = query.chars().take(MAX_QUERY_CHARS).collect();

        let mut server = mockito::Server::new_async().await;
        let search = server
            .mock("GET", "/api/query")
            .match_query(mockito::Matcher::UrlEncoded("search_query".into(), capped))
            .with_status(200)
            .with_body(r#"<feed xmlns="http://www.w3.org/2005/Atom"></feed>"#)
            .create_async()
            .await;

        let client = ArxivClient::new(&server.url());
        assert!(client.search(&query, 1).await.unwrap().is_empty());
        search.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_no_results() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/query")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"<feed xmlns="http://www.w3.org/2005/Atom"></feed>"#)
            .create_async()
            .await;

        let client = ArxivClient::new(&server.url());
        assert!(client.fetch("qwertyuiop", 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_error_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/query")
            .match_query(mockito::Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let client = ArxivClient::new(&server.url());
        assert!(matches!(
            client.fetch("transformers", 1).await,
            Err(SearchError::RequestFailed(_))
        ));
    }
}
