use anyhow::Result;
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub llm: LLMConfig,
    pub search: SearchConfig,
    pub tools: ToolLimits,
    pub agent: AgentConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LLMConfig {
    pub provider: String,
    pub model: String,
    pub api_key: String,
    /// Overrides the provider's default API base when set
    pub api_base: Option<String>,
    pub timeout_secs: Option<u64>,
    pub tool_temperature: f32,
    pub agent_temperature: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// "duckduckgo" or "serpapi"
    pub provider: String,
    pub serpapi_key: String,
    pub max_results: usize,
    pub arxiv_api_base: String,
    pub duckduckgo_base: String,
}

/// Character caps applied to tool inputs and outputs
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct ToolLimits {
    pub fetch_paper_max_chars: usize,
    pub summarize_max_chars: usize,
    pub explain_max_chars: usize,
    pub qa_max_chars: usize,
}

impl Default for ToolLimits {
    fn default() -> Self {
        Self {
            fetch_paper_max_chars: 6000,
            summarize_max_chars: 4000,
            explain_max_chars: 3000,
            qa_max_chars: 4000,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct AgentConfig {
    pub max_iterations: usize,
    pub handle_parsing_errors: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 15,
            handle_parsing_errors: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let tool_defaults = ToolLimits::default();
        let agent_defaults = AgentConfig::default();

        Ok(Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .unwrap_or_else(|_| "3000".to_string())
                    .parse()?,
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                cors_allowed_origins: env::var("ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| "http://localhost:3000".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            llm: LLMConfig {
                provider: env::var("LLM_PROVIDER").unwrap_or_else(|_| "openai".to_string()),
                model: env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4-0125-preview".to_string()),
                api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
                api_base: env::var("LLM_API_BASE").ok().filter(|s| !s.is_empty()),
                timeout_secs: env::var("LLM_TIMEOUT_SECS")
                    .ok()
                    .map(|s| s.parse())
                    .transpose()?,
                tool_temperature: env::var("TOOL_TEMPERATURE")
                    .unwrap_or_else(|_| "0.7".to_string())
                    .parse()?,
                agent_temperature: env::var("AGENT_TEMPERATURE")
                    .unwrap_or_else(|_| "0.0".to_string())
                    .parse()?,
            },
            search: SearchConfig {
                provider: env::var("SEARCH_PROVIDER").unwrap_or_else(|_| "duckduckgo".to_string()),
                serpapi_key: env::var("SERPAPI_API_KEY").unwrap_or_default(),
                max_results: env::var("SEARCH_MAX_RESULTS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()?,
                arxiv_api_base: env::var("ARXIV_API_BASE")
                    .unwrap_or_else(|_| crate::search::arxiv::ARXIV_API_BASE.to_string()),
                duckduckgo_base: env::var("DUCKDUCKGO_BASE")
                    .unwrap_or_else(|_| crate::search::duckduckgo::DUCKDUCKGO_BASE.to_string()),
            },
            tools: ToolLimits {
                fetch_paper_max_chars: env_or("FETCH_PAPER_MAX_CHARS", tool_defaults.fetch_paper_max_chars)?,
                summarize_max_chars: env_or("SUMMARIZE_MAX_CHARS", tool_defaults.summarize_max_chars)?,
                explain_max_chars: env_or("EXPLAIN_MAX_CHARS", tool_defaults.explain_max_chars)?,
                qa_max_chars: env_or("QA_MAX_CHARS", tool_defaults.qa_max_chars)?,
            },
            agent: AgentConfig {
                max_iterations: env_or("AGENT_MAX_ITERATIONS", agent_defaults.max_iterations)?,
                handle_parsing_errors: env_or(
                    "AGENT_HANDLE_PARSING_ERRORS",
                    agent_defaults.handle_parsing_errors,
                )?,
            },
        })
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(value) => Ok(value.trim().parse()?),
        Err(_) => Ok(default),
    }
}
