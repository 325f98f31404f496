//! DuckDuckGo web search via the keyless HTML endpoint

use async_trait::async_trait;
use reqwest::Client;
use tracing::info;

use super::{collapse_whitespace, unescape_entities, SearchError, WebSearchProvider};

pub const DUCKDUCKGO_BASE: &str = "https://html.duckduckgo.com";

/// Returned when the page contains no result snippets
pub const NO_RESULTS: &str = "No good DuckDuckGo Search Result was found";

/// Worldwide results, no region bias
const REGION: &str = "wt-wt";
/// Restrict to the past year
const TIME_LIMIT: &str = "y";

pub struct DuckDuckGoSearch {
    client: Client,
    base_url: String,
    max_results: usize,
}

impl DuckDuckGoSearch {
    pub fn new(base_url: &str) -> Result<Self, SearchError> {
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (compatible; OxidizedResearch/0.1)")
            .build()
            .map_err(|e| SearchError::RequestFailed(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_results: 5,
        })
    }

    /// Set maximum snippets per search
    pub fn with_max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }
}

#[async_trait]
impl WebSearchProvider for DuckDuckGoSearch {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    async fn run(&self, query: &str) -> Result<String, SearchError> {
        info!(query = %query, "Searching DuckDuckGo");

        let url = format!(
            "{}/html/?q={}&kl={}&df={}",
            self.base_url,
            urlencoding::encode(query),
            REGION,
            TIME_LIMIT
        );
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SearchError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::RequestFailed(format!("DuckDuckGo returned {}", status)));
        }

        let html = response
            .text()
            .await
            .map_err(|e| SearchError::RequestFailed(e.to_string()))?;

        let snippets = extract_snippets(&html, self.max_results);
        info!(count = snippets.len(), "DuckDuckGo search completed");

        if snippets.is_empty() {
            Ok(NO_RESULTS.to_string())
        } else {
            Ok(snippets.join(" "))
        }
    }
}

/// Pull plain-text result snippets out of the results page
fn extract_snippets(html: &str, max: usize) -> Vec<String> {
    html.split("class=\"result__snippet\"")
        .skip(1)
        .filter_map(|chunk| {
            let body = chunk.split_once('>')?.1;
            let end = body.find("</a>").or_else(|| body.find("</td>")).unwrap_or(body.len());
            let text = collapse_whitespace(&unescape_entities(&strip_tags(&body[..end])));
            (!text.is_empty()).then_some(text)
        })
        .take(max)
        .collect()
}

fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}
