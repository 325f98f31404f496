//! Completion Client
//!
//! Prompt-in, text-out wrapper over an [`LLM`] provider with a fixed model and
//! temperature. Passing a [`StreamSink`] switches the call to streaming: every
//! token is emitted to the sink in arrival order before the concatenated text
//! is returned.

use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;
use tracing::debug;

use crate::llm::provider::LLM;
use crate::stream::StreamSink;
use crate::types::{AppResult, LLMMessage, LLMRequest};

#[async_trait]
pub trait Completion: Send + Sync {
    /// Complete `prompt`, stopping at any of `stop`
    async fn complete_with_stop(
        &self,
        prompt: &str,
        stop: &[String],
        sink: Option<&mut (dyn StreamSink + Send)>,
    ) -> AppResult<String>;

    async fn complete(&self, prompt: &str, sink: Option<&mut (dyn StreamSink + Send)>) -> AppResult<String> {
        self.complete_with_stop(prompt, &[], sink).await
    }
}

pub struct CompletionClient {
    llm: Arc<LLM>,
    model: String,
    temperature: f32,
}

impl CompletionClient {
    pub fn new(llm: Arc<LLM>, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            llm,
            model: model.into(),
            temperature,
        }
    }

    fn build_request(&self, prompt: &str, stop: &[String]) -> LLMRequest {
        LLMRequest {
            model: self.model.clone(),
            messages: vec![LLMMessage::user(prompt)],
            max_tokens: None,
            temperature: Some(self.temperature),
            stop: (!stop.is_empty()).then(|| stop.to_vec()),
        }
    }
}

#[async_trait]
impl Completion for CompletionClient {
    async fn complete_with_stop(
        &self,
        prompt: &str,
        stop: &[String],
        sink: Option<&mut (dyn StreamSink + Send)>,
    ) -> AppResult<String> {
        let request = self.build_request(prompt, stop);
        debug!(
            provider = %self.llm.provider_name(),
            model = %self.model,
            prompt_len = prompt.len(),
            streaming = sink.is_some(),
            "Sending completion request"
        );

        let Some(sink) = sink else {
            let response = self.llm.create_chat_completion(&request).await?;
            return Ok(response.content);
        };

        let mut stream = self.llm.create_chat_completion_stream(&request).await?;
        let mut text = String::new();
        while let Some(token) = stream.next().await {
            let token = token?;
            sink.emit(&token);
            text.push_str(&token);
        }

        debug!(response_len = text.len(), "Streamed completion finished");
        Ok(text)
    }
}
