use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use super::{truncate_chars, Tool};
use crate::search::PaperSource;
use crate::types::AppResult;

/// Returned verbatim when the index has nothing for the query
pub const NOT_FOUND: &str = "No paper found.";

/// Fetch one paper by topic and cap its content
pub struct FetchPaper {
    source: Arc<dyn PaperSource>,
    max_chars: usize,
}

impl FetchPaper {
    pub fn new(source: Arc<dyn PaperSource>, max_chars: usize) -> Self {
        Self { source, max_chars }
    }
}

#[async_trait]
impl Tool for FetchPaper {
    fn name(&self) -> &str {
        "ArxivFetcher"
    }

    fn description(&self) -> &str {
        "Fetches a research paper from ArXiv based on query."
    }

    async fn invoke(&self, input: &str) -> AppResult<String> {
        let papers = self.source.fetch(input, 1).await?;

        let Some(paper) = papers.into_iter().next() else {
            info!(query = %input, "No paper found");
            return Ok(NOT_FOUND.to_string());
        };

        info!(query = %input, title = %paper.title, content_len = paper.content.len(), "Paper fetched");
        Ok(truncate_chars(&paper.content, self.max_chars).to_string())
    }
}
