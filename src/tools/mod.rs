//! Agent Tools
//!
//! The five tools the research agent can call, each a string-in/string-out
//! capability with a name and a description the model reads:
//!
//! | Name                | Does                                          |
//! |---------------------|-----------------------------------------------|
//! | `ArxivFetcher`      | fetch one paper by topic, content capped      |
//! | `Summarizer`        | academic summary of (truncated) text          |
//! | `DetailedExplainer` | technical explanation, applications, refs     |
//! | `WebSearch`         | raw web search results                        |
//! | `QnAExtractor`      | answer a question from combined context       |
//!
//! Failures from the underlying services are returned unchanged; the agent
//! loop decides what to do with them.

pub mod paper;
pub mod prompted;
pub mod web;

pub use paper::FetchPaper;
pub use prompted::{Explain, QuestionAnswer, Summarize};
pub use web::WebSearch;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::ToolLimits;
use crate::llm::Completion;
use crate::search::{PaperSource, WebSearchProvider};
use crate::types::AppResult;

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    async fn invoke(&self, input: &str) -> AppResult<String>;
}

/// The first `max_chars` characters of `text`
///
/// Counts Unicode scalar values, so a multi-byte character is never split.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Ordered, immutable set of tools built once at startup
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new(tools: Vec<Arc<dyn Tool>>) -> Self {
        Self { tools }
    }

    /// The standard research toolset
    pub fn research(
        papers: Arc<dyn PaperSource>,
        search: Arc<dyn WebSearchProvider>,
        completion: Arc<dyn Completion>,
        limits: ToolLimits,
    ) -> Self {
        Self::new(vec![
            Arc::new(FetchPaper::new(papers, limits.fetch_paper_max_chars)),
            Arc::new(Summarize::new(completion.clone(), limits.summarize_max_chars)),
            Arc::new(Explain::new(completion.clone(), limits.explain_max_chars)),
            Arc::new(WebSearch::new(search)),
            Arc::new(QuestionAnswer::new(completion, limits.qa_max_chars)),
        ])
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Tool>> {
        self.tools.iter()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// `name: description` lines, one per tool
    pub fn descriptions(&self) -> String {
        self.tools
            .iter()
            .map(|t| format!("{}: {}", t.name(), t.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Comma-separated tool names
    pub fn names(&self) -> String {
        self.tools
            .iter()
            .map(|t| t.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
