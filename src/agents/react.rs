//! ReAct Agent
//!
//! Zero-shot reason-act-observe loop. Each iteration sends the question plus
//! the scratchpad of earlier steps to the model, streams the model's tokens to
//! the run's sink, and either finishes or calls one tool and records its
//! observation.

use std::sync::Arc;
use tracing::{info, warn};

use super::output_parser::{self, AgentStep};
use crate::config::AgentConfig;
use crate::llm::Completion;
use crate::stream::StreamSink;
use crate::tools::ToolRegistry;
use crate::types::{AppError, AppResult};

/// Returned when the iteration budget runs out
pub const ITERATION_LIMIT_MESSAGE: &str = "Agent stopped due to iteration limit or time limit.";

/// Generation is cut here so the model never invents its own observations
pub const OBSERVATION_STOP: &str = "\nObservation:";

const PREFIX: &str = "Answer the following questions as best you can. You have access to the following tools:";

const FORMAT_INSTRUCTIONS: &str = "Use the following format:

Question: the input question you must answer
Thought: you should always think about what to do
Action: the action to take, should be one of [{tool_names}]
Action Input: the input to the action
Observation: the result of the action
... (this Thought/Action/Action Input/Observation can repeat N times)
Thought: I now know the final answer
Final Answer: the final answer to the original input question";

pub struct ReactAgent {
    tools: ToolRegistry,
    completion: Arc<dyn Completion>,
    config: AgentConfig,
}

impl ReactAgent {
    pub fn new(tools: ToolRegistry, completion: Arc<dyn Completion>, config: AgentConfig) -> Self {
        Self {
            tools,
            completion,
            config,
        }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Full prompt for one iteration
    pub fn build_prompt(&self, query: &str, scratchpad: &str) -> String {
        [
            PREFIX.to_string(),
            self.tools.descriptions(),
            FORMAT_INSTRUCTIONS.replace("{tool_names}", &self.tools.names()),
            format!("Begin!\n\nQuestion: {}\nThought:{}", query, scratchpad),
        ]
        .join("\n\n")
    }

    /// Run the loop to a final answer
    ///
    /// Tool failures end the run with the tool's error.
    pub async fn run(&self, query: &str, sink: &mut (dyn StreamSink + Send)) -> AppResult<String> {
        let stop = vec![OBSERVATION_STOP.to_string()];
        let mut scratchpad = String::new();

        for iteration in 1..=self.config.max_iterations {
            let prompt = self.build_prompt(query, &scratchpad);
            let output = self
                .completion
                .complete_with_stop(&prompt, &stop, Some(&mut *sink))
                .await?;
            let output = strip_observation(&output);

            let (log, observation) = match output_parser::parse(output) {
                Ok(AgentStep::Finish { answer, .. }) => {
                    info!(iteration, answer_len = answer.len(), "Agent finished");
                    return Ok(answer);
                }
                Ok(AgentStep::Action { tool, input, log }) => {
                    let observation = self.dispatch(&tool, &input).await?;
                    (log, observation)
                }
                Err(e) if self.config.handle_parsing_errors => {
                    warn!(iteration, error = %e.message, "Unparseable agent output, asking the model to retry");
                    (output.to_string(), e.observation)
                }
                Err(e) => return Err(AppError::OutputParse(e.message)),
            };

            scratchpad.push_str(&log);
            scratchpad.push_str("\nObservation: ");
            scratchpad.push_str(&observation);
            scratchpad.push_str("\nThought:");
        }

        warn!(max_iterations = self.config.max_iterations, "Agent hit iteration limit");
        Ok(ITERATION_LIMIT_MESSAGE.to_string())
    }

    async fn dispatch(&self, name: &str, input: &str) -> AppResult<String> {
        let Some(tool) = self.tools.get(name) else {
            warn!(tool = %name, "Model requested an unknown tool");
            return Ok(format!(
                "{} is not a valid tool, try one of [{}].",
                name,
                self.tools.names()
            ));
        };

        info!(tool = %name, input_len = input.len(), "Invoking tool");
        let observation = tool.invoke(input).await?;
        info!(tool = %name, output_len = observation.len(), "Tool finished");
        Ok(observation)
    }
}

/// Drop anything from the first `Observation:` on
fn strip_observation(output: &str) -> &str {
    match output.find(OBSERVATION_STOP) {
        Some(pos) => &output[..pos],
        None => output,
    }
}
