//! SerpAPI Client
//!
//! Optional web search backend using SerpAPI's Google Light engine, a fast
//! lightweight Google search. Snippets from the organic results are joined
//! into a single text blob, the same shape the DuckDuckGo backend returns.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{SearchError, WebSearchProvider};

const SERPAPI_BASE: &str = "https://serpapi.com";

/// Result from a Google Light search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LightResult {
    /// Title of the result
    pub title: String,
    /// Snippet/description
    pub snippet: String,
    /// URL link
    pub link: String,
}

/// SerpAPI client for general web search
pub struct SerpApiClient {
    client: Client,
    api_key: String,
    base_url: String,
    max_results: usize,
}

impl SerpApiClient {
    /// Create a new SerpAPI client
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: SERPAPI_BASE.to_string(),
            max_results: 5,
        }
    }

    /// Configure client from config
    pub fn from_config(config: &crate::config::SearchConfig) -> Option<Self> {
        if config.serpapi_key.is_empty() {
            return None;
        }

        Some(Self::new(config.serpapi_key.clone()).with_max_results(config.max_results))
    }

    /// Set maximum results per search
    pub fn with_max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }

    /// Point the client at a different host
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Search Google Light for quick web results
    pub async fn search_light(&self, query: &str) -> Result<Vec<LightResult>, SearchError> {
        info!(query = %query, "Searching Google Light via SerpAPI");

        let num = self.max_results.to_string();
        let response = self
            .client
            .get(format!("{}/search.json", self.base_url))
            .query(&[
                ("engine", "google_light"),
                ("q", query),
                ("hl", "en"),
                ("gl", "us"),
                ("num", num.as_str()),
                ("api_key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| SearchError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::RequestFailed(format!("SerpAPI returned {}", status)));
        }

        let results: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SearchError::ParseError(e.to_string()))?;

        debug!("Raw Light response received");

        if let Some(error) = results.get("error").and_then(|v| v.as_str()) {
            return Err(SearchError::RequestFailed(error.to_string()));
        }

        // A query with no hits simply has no organic_results key
        let Some(organic_results) = results.get("organic_results") else {
            return Ok(Vec::new());
        };

        let results_array = organic_results
            .as_array()
            .ok_or_else(|| SearchError::ParseError("Expected array of results".to_string()))?;

        let light_results: Vec<LightResult> = results_array
            .iter()
            .take(self.max_results)
            .map(|result| LightResult {
                title: result
                    .get("title")
                    .and_then(|v| v.as_str())
                    .unwrap_or("Untitled")
                    .to_string(),
                snippet: result
                    .get("snippet")
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string(),
                link: result
                    .get("link")
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string(),
            })
            .collect();

        info!(count = light_results.len(), "Google Light search completed");
        Ok(light_results)
    }
}

#[async_trait]
impl WebSearchProvider for SerpApiClient {
    fn name(&self) -> &str {
        "serpapi"
    }

    async fn run(&self, query: &str) -> Result<String, SearchError> {
        let snippets: Vec<String> = self
            .search_light(query)
            .await?
            .into_iter()
            .map(|r| r.snippet)
            .filter(|s| !s.trim().is_empty())
            .collect();

        if snippets.is_empty() {
            Ok("No good Google Search Result was found".to_string())
        } else {
            Ok(snippets.join(" "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_joins_snippets() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/search.json")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("engine".into(), "google_light".into()),
                mockito::Matcher::UrlEncoded("q".into(), "bert".into()),
                mockito::Matcher::UrlEncoded("api_key".into(), "secret".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"organic_results":[
                    {"title":"BERT","snippet":"Bidirectional encoder.","link":"https://arxiv.org/abs/1810.04805"},
                    {"title":"Empty","snippet":"","link":"https://example.org"},
                    {"title":"Blog","snippet":"Masked language modelling.","link":"https://example.com"}
                ]}"#,
            )
            .create_async()
            .await;

        let client = SerpApiClient::new("secret".to_string()).with_base_url(&server.url());
        let text = client.run("bert").await.unwrap();
        assert_eq!(text, "Bidirectional encoder. Masked language modelling.");
    }

    #[tokio::test]
    async fn test_api_error_field() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/search.json")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"error":"Invalid API key."}"#)
            .create_async()
            .await;

        let client = SerpApiClient::new("bad".to_string()).with_base_url(&server.url());
        match client.run("bert").await {
            Err(SearchError::RequestFailed(msg)) => assert_eq!(msg, "Invalid API key."),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_organic_results() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/search.json")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"search_metadata":{"status":"Success"}}"#)
            .create_async()
            .await;

        let client = SerpApiClient::new("key".to_string()).with_base_url(&server.url());
        assert!(client.search_light("nothing").await.unwrap().is_empty());
    }
}
