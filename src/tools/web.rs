use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use super::Tool;
use crate::search::WebSearchProvider;
use crate::types::AppResult;

/// Forward the query verbatim to the web search backend
pub struct WebSearch {
    provider: Arc<dyn WebSearchProvider>,
}

impl WebSearch {
    pub fn new(provider: Arc<dyn WebSearchProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Tool for WebSearch {
    fn name(&self) -> &str {
        "WebSearch"
    }

    fn description(&self) -> &str {
        "Searches DuckDuckGo for additional insights."
    }

    async fn invoke(&self, input: &str) -> AppResult<String> {
        info!(provider = %self.provider.name(), query = %input, "Web search");
        Ok(self.provider.run(input).await?)
    }
}
