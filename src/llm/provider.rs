use async_trait::async_trait;
use futures::stream::BoxStream;
use std::time::Duration;
use tracing::info;

use crate::types::{AppError, AppResult, LLMRequest, LLMResponse};

#[async_trait]
pub trait LLMAdapter: Send + Sync {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse>;

    /// Stream completion tokens in arrival order
    async fn create_chat_completion_stream(
        &self,
        request: &LLMRequest,
    ) -> AppResult<BoxStream<'static, AppResult<String>>>;
}

/// Configuration for an LLM provider
#[derive(Debug, Clone)]
pub struct LLMProviderConfig {
    pub name: String,
    pub api_key: String,
    pub api_base: Option<String>,
    pub timeout: Option<Duration>,
}

impl LLMProviderConfig {
    pub fn from_config(config: &crate::config::LLMConfig) -> Self {
        Self {
            name: config.provider.clone(),
            api_key: config.api_key.clone(),
            api_base: config.api_base.clone(),
            timeout: config.timeout_secs.map(Duration::from_secs),
        }
    }
}

pub struct LLM {
    adapter: Box<dyn LLMAdapter>,
    provider_name: String,
}

impl LLM {
    pub fn new(provider: LLMProviderConfig) -> AppResult<Self> {
        let default_base = crate::llm::openai::default_api_base(&provider.name).ok_or_else(|| {
            AppError::Config(format!("Unsupported LLM provider: {}", provider.name))
        })?;
        let api_base = provider.api_base.as_deref().unwrap_or(default_base);

        // Every supported provider speaks the OpenAI chat-completions dialect
        let adapter: Box<dyn LLMAdapter> = Box::new(crate::llm::openai::OpenAIAdapter::with_options(
            &provider.api_key,
            api_base,
            provider.timeout,
        )?);

        info!(provider = %provider.name, "LLM provider initialized");

        Ok(Self {
            adapter,
            provider_name: provider.name,
        })
    }

    /// Wrap an already-built adapter
    pub fn from_adapter(provider_name: impl Into<String>, adapter: Box<dyn LLMAdapter>) -> Self {
        Self {
            adapter,
            provider_name: provider_name.into(),
        }
    }

    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    pub async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        self.adapter.create_chat_completion(request).await
    }

    pub async fn create_chat_completion_stream(
        &self,
        request: &LLMRequest,
    ) -> AppResult<BoxStream<'static, AppResult<String>>> {
        self.adapter.create_chat_completion_stream(request).await
    }
}
