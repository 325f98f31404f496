use std::sync::Arc;
use tracing::{info, warn};

use crate::agents::ReactAgent;
use crate::config::Config;
use crate::llm::{CompletionClient, LLMProviderConfig, LLM};
use crate::search::{self, ArxivClient};
use crate::session::{ResearchSession, RunState};
use crate::tools::ToolRegistry;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub agent: Arc<ReactAgent>,
    pub session: ResearchSession,
}

impl AppState {
    /// Build every client once from configuration
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        if config.llm.api_key.is_empty() {
            warn!("OPENAI_API_KEY is not set; every completion call will fail");
        }

        let llm = Arc::new(LLM::new(LLMProviderConfig::from_config(&config.llm))?);

        // Tools run non-streaming; the agent streams with a cold temperature
        let tool_client = Arc::new(CompletionClient::new(
            llm.clone(),
            config.llm.model.clone(),
            config.llm.tool_temperature,
        ));
        let agent_client = Arc::new(CompletionClient::new(
            llm,
            config.llm.model.clone(),
            config.llm.agent_temperature,
        ));

        let papers = Arc::new(ArxivClient::new(&config.search.arxiv_api_base));
        let web_search = search::web_search_from_config(&config.search)?;

        let tools = ToolRegistry::research(papers, Arc::from(web_search), tool_client, config.tools);
        info!(tools = %tools.names(), search = %config.search.provider, "Tool registry built");

        let agent = ReactAgent::new(tools, agent_client, config.agent);

        Ok(Self::new(config, agent))
    }

    pub fn new(config: Config, agent: ReactAgent) -> Self {
        Self {
            config,
            agent: Arc::new(agent),
            session: ResearchSession::new(),
        }
    }
}

// HTTP request/response models

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RunRequest {
    pub query: String,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct StatusResponse {
    pub state: RunState,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub model: String,
    pub search_provider: String,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
