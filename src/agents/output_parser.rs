//! ReAct Output Parser
//!
//! Turns one model completion into either a tool call or a final answer.
//! The expected shape is:
//!
//! ```text
//! Thought: I should look the paper up
//! Action: ArxivFetcher
//! Action Input: attention is all you need
//! ```
//!
//! or `Final Answer: ...`. Output containing both is rejected.

use regex::Regex;
use std::sync::OnceLock;

pub const FINAL_ANSWER_MARKER: &str = "Final Answer:";

const BOTH_ANSWER_AND_ACTION: &str =
    "Parsing LLM output produced both a final answer and a parse-able action:";
const MISSING_ACTION: &str = "Invalid Format: Missing 'Action:' after 'Thought:'";
const MISSING_ACTION_INPUT: &str = "Invalid Format: Missing 'Action Input:' after 'Action:'";
const GENERIC_INVALID: &str = "Invalid or incomplete response";

/// One decoded reasoning step
#[derive(Debug, Clone, PartialEq)]
pub enum AgentStep {
    Action { tool: String, input: String, log: String },
    Finish { answer: String, log: String },
}

/// Output that could not be decoded
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    /// Text fed back to the model when parse errors are handled
    pub observation: String,
}

fn action_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)Action\s*\d*\s*:[\s]*(.*?)[\s]*Action\s*\d*\s*Input\s*\d*\s*:[\s]*(.*)")
            .expect("valid action regex")
    })
}

fn action_only_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)Action\s*\d*\s*:[\s]*(.*?)").expect("valid action regex"))
}

fn action_input_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)[\s]*Action\s*\d*\s*Input\s*\d*\s*:[\s]*(.*)").expect("valid action input regex")
    })
}

pub fn parse(text: &str) -> Result<AgentStep, ParseError> {
    let includes_answer = text.contains(FINAL_ANSWER_MARKER);

    if let Some(captures) = action_regex().captures(text) {
        if includes_answer {
            return Err(ParseError {
                message: format!("{} {}", BOTH_ANSWER_AND_ACTION, text),
                observation: GENERIC_INVALID.to_string(),
            });
        }
        let tool = captures[1].trim().to_string();
        let input = captures[2].trim_matches(' ').trim_matches('"').to_string();
        return Ok(AgentStep::Action {
            tool,
            input,
            log: text.to_string(),
        });
    }

    if includes_answer {
        let answer = text
            .rsplit(FINAL_ANSWER_MARKER)
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();
        return Ok(AgentStep::Finish {
            answer,
            log: text.to_string(),
        });
    }

    let observation = if !action_only_regex().is_match(text) {
        MISSING_ACTION
    } else if !action_input_regex().is_match(text) {
        MISSING_ACTION_INPUT
    } else {
        GENERIC_INVALID
    };

    Err(ParseError {
        message: format!("Could not parse LLM output: `{}`", text),
        observation: observation.to_string(),
    })
}
