// Tools that wrap truncated input in a fixed prompt and ask the LLM

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use super::{truncate_chars, Tool};
use crate::llm::Completion;
use crate::types::AppResult;

pub struct Summarize {
    completion: Arc<dyn Completion>,
    max_chars: usize,
}

impl Summarize {
    pub fn new(completion: Arc<dyn Completion>, max_chars: usize) -> Self {
        Self { completion, max_chars }
    }

    fn prompt(&self, text: &str) -> String {
        format!(
            "Summarize the following academic paper:\n\n{}\n\nUse an academic tone.",
            truncate_chars(text, self.max_chars)
        )
    }
}

#[async_trait]
impl Tool for Summarize {
    fn name(&self) -> &str {
        "Summarizer"
    }

    fn description(&self) -> &str {
        "Summarizes academic text."
    }

    async fn invoke(&self, input: &str) -> AppResult<String> {
        info!(input_chars = input.chars().count(), "Summarizing");
        self.completion.complete(&self.prompt(input), None).await
    }
}

pub struct Explain {
    completion: Arc<dyn Completion>,
    max_chars: usize,
}

impl Explain {
    pub fn new(completion: Arc<dyn Completion>, max_chars: usize) -> Self {
        Self { completion, max_chars }
    }

    fn prompt(&self, text: &str) -> String {
        format!(
            "\n    Provide a deep technical explanation, real-world applications, and references for this paper content:\n    \n    {}\n\n    Use an academic tone.\n    ",
            truncate_chars(text, self.max_chars)
        )
    }
}

#[async_trait]
impl Tool for Explain {
    fn name(&self) -> &str {
        "DetailedExplainer"
    }

    fn description(&self) -> &str {
        "Gives a technical explanation and applications of academic content."
    }

    async fn invoke(&self, input: &str) -> AppResult<String> {
        info!(input_chars = input.chars().count(), "Explaining");
        self.completion.complete(&self.prompt(input), None).await
    }
}

pub struct QuestionAnswer {
    completion: Arc<dyn Completion>,
    max_chars: usize,
}

impl QuestionAnswer {
    pub fn new(completion: Arc<dyn Completion>, max_chars: usize) -> Self {
        Self { completion, max_chars }
    }

    fn prompt(&self, context_and_question: &str) -> String {
        format!(
            "Answer based on context and question:\n\n{}",
            truncate_chars(context_and_question, self.max_chars)
        )
    }
}

#[async_trait]
impl Tool for QuestionAnswer {
    fn name(&self) -> &str {
        "QnAExtractor"
    }

    fn description(&self) -> &str {
        "Answers questions from academic text."
    }

    async fn invoke(&self, input: &str) -> AppResult<String> {
        info!(input_chars = input.chars().count(), "Answering from context");
        self.completion.complete(&self.prompt(input), None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::StreamSink;
    use crate::tools::testing::RecordingCompletion;
    use crate::types::AppError;

    fn long_text(len: usize) -> String {
        (0..len).map(|i| char::from(b'0' + (i % 10) as u8)).collect()
    }

    #[tokio::test]
    async fn test_summarize_sends_first_4000_chars() {
        let completion = Arc::new(RecordingCompletion::replying("A concise summary."));
        let tool = Summarize::new(completion.clone(), 4000);
        let input = format!("{}{}", long_text(4000), "X".repeat(1000));

        let output = tool.invoke(&input).await.unwrap();
        assert_eq!(output, "A concise summary.");

        let prompt = completion.last_prompt();
        assert_eq!(
            prompt,
            format!(
                "Summarize the following academic paper:\n\n{}\n\nUse an academic tone.",
                &input[..4000]
            )
        );
        assert!(!prompt.contains('X'));
    }

    #[tokio::test]
    async fn test_explain_caps_at_3000_chars() {
        let completion = Arc::new(RecordingCompletion::replying("Explanation."));
        let tool = Explain::new(completion.clone(), 3000);
        let input = format!("{}{}", long_text(3000), "Z".repeat(500));

        tool.invoke(&input).await.unwrap();

        let prompt = completion.last_prompt();
        assert_eq!(
            prompt,
            format!(
                "\n    Provide a deep technical explanation, real-world applications, and references for this paper content:\n    \n    {}\n\n    Use an academic tone.\n    ",
                &input[..3000]
            )
        );
        assert!(!prompt.contains('Z'));
    }

    #[tokio::test]
    async fn test_qa_caps_at_4000_chars() {
        let completion = Arc::new(RecordingCompletion::replying("42"));
        let tool = QuestionAnswer::new(completion.clone(), 4000);
        let input = format!("{}{}", long_text(4000), "Q".repeat(10));

        assert_eq!(tool.invoke(&input).await.unwrap(), "42");
        assert_eq!(
            completion.last_prompt(),
            format!("Answer based on context and question:\n\n{}", &input[..4000])
        );
    }

    #[tokio::test]
    async fn test_short_input_is_forwarded_whole() {
        let completion = Arc::new(RecordingCompletion::replying("ok"));
        let tool = Summarize::new(completion.clone(), 4000);
        tool.invoke("Transformers use self-attention.").await.unwrap();
        assert!(completion.last_prompt().contains("\n\nTransformers use self-attention.\n\n"));
    }

    #[tokio::test]
    async fn test_completion_errors_propagate() {
        struct Down;

        #[async_trait]
        impl Completion for Down {
            async fn complete_with_stop(
                &self,
                _prompt: &str,
                _stop: &[String],
                _sink: Option<&mut (dyn StreamSink + Send)>,
            ) -> AppResult<String> {
                Err(AppError::LLMApi("API error (500): overloaded".to_string()))
            }
        }

        let tool = QuestionAnswer::new(Arc::new(Down), 4000);
        match tool.invoke("context? question?").await {
            Err(AppError::LLMApi(msg)) => assert!(msg.contains("overloaded")),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
