//! Search Module
//!
//! External document and web search collaborators used by the agent tools:
//! - arXiv (papers) - Atom API lookup plus PDF text extraction
//! - DuckDuckGo (default web search) - HTML endpoint, no key required
//! - SerpAPI Google Light (optional web search) - requires an API key

pub mod arxiv;
pub mod duckduckgo;
pub mod serpapi;

pub use arxiv::{ArxivClient, Paper};
pub use duckduckgo::DuckDuckGoSearch;
pub use serpapi::SerpApiClient;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during search operations
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("SerpAPI key not configured")]
    NoApiKey,

    #[error("Search request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse search results: {0}")]
    ParseError(String),

    #[error("Search engine not enabled: {0}")]
    EngineDisabled(String),
}

/// A document index that can be queried by topic
#[async_trait]
pub trait PaperSource: Send + Sync {
    /// Return at most `max_docs` documents for `query`
    async fn fetch(&self, query: &str, max_docs: usize) -> Result<Vec<Paper>, SearchError>;
}

/// A web search backend returning a single text blob
#[async_trait]
pub trait WebSearchProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, query: &str) -> Result<String, SearchError>;
}

/// Build the web search provider selected in config
pub fn web_search_from_config(
    config: &crate::config::SearchConfig,
) -> Result<Box<dyn WebSearchProvider>, SearchError> {
    match config.provider.as_str() {
        "duckduckgo" => Ok(Box::new(
            DuckDuckGoSearch::new(&config.duckduckgo_base)?.with_max_results(config.max_results),
        )),
        "serpapi" => SerpApiClient::from_config(config)
            .map(|c| Box::new(c) as Box<dyn WebSearchProvider>)
            .ok_or(SearchError::NoApiKey),
        other => Err(SearchError::EngineDisabled(other.to_string())),
    }
}

/// Decode the handful of entities that show up in Atom feeds and result HTML
pub(crate) fn unescape_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// Collapse runs of whitespace (including newlines) into single spaces
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
