//! Agent System
//!
//! The research agent is a zero-shot ReAct loop over the tool registry:
//!
//! ```text
//! User Query
//!      │
//!      ▼
//! ┌─────────────┐   Action / Action Input   ┌─────────────┐
//! │   ReAct     │ ────────────────────────▶ │    Tool     │
//! │   Agent     │ ◀──────────────────────── │  Registry   │
//! └─────────────┘        Observation        └─────────────┘
//!      │  (tokens streamed to the run's sink)
//!      ▼
//!  Final Answer
//! ```

pub mod output_parser;
pub mod react;

pub use output_parser::{AgentStep, ParseError};
pub use react::ReactAgent;

use crate::session::RunOutcome;
use crate::stream::StreamSink;
use tracing::{error, info};

/// Execute one research run, converting any failure into the error outcome
pub async fn execute_research_run(
    agent: &ReactAgent,
    query: &str,
    sink: &mut (dyn StreamSink + Send),
) -> RunOutcome {
    info!(query_len = query.len(), "Starting research run");

    let result = agent.run(query, sink).await;
    match &result {
        Ok(answer) => info!(
            answer_len = answer.len(),
            streamed_len = sink.text().len(),
            "Research run complete"
        ),
        Err(e) => error!(error = %e, "Research run failed"),
    }

    RunOutcome::from(result)
}
