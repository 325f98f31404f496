//! Token Streaming
//!
//! A [`StreamSink`] receives partial completion tokens in arrival order and
//! keeps the running text. Accumulation is append-only for the lifetime of a
//! run; a fresh sink is created for every run.
//!
//! - [`TokenBuffer`]: plain accumulator
//! - [`ChannelSink`]: accumulator that also forwards each token as an
//!   [`AgentEvent`] to the HTTP layer

use serde::Serialize;
use tokio::sync::mpsc;

/// Receiver of streamed completion tokens
pub trait StreamSink {
    /// Append one token
    fn emit(&mut self, token: &str);

    /// Everything emitted so far, in order
    fn text(&self) -> &str;
}

#[derive(Debug, Default, Clone)]
pub struct TokenBuffer {
    text: String,
    tokens: usize,
}

impl TokenBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tokens received
    pub fn token_count(&self) -> usize {
        self.tokens
    }
}

impl StreamSink for TokenBuffer {
    fn emit(&mut self, token: &str) {
        self.text.push_str(token);
        self.tokens += 1;
    }

    fn text(&self) -> &str {
        &self.text
    }
}

/// Events produced by a single agent run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// A streamed completion token
    Token { content: String },
    /// The run finished with an answer
    Final { answer: String },
    /// The run failed
    Error { message: String },
}

impl AgentEvent {
    /// SSE event name
    pub fn name(&self) -> &'static str {
        match self {
            AgentEvent::Token { .. } => "token",
            AgentEvent::Final { .. } => "final",
            AgentEvent::Error { .. } => "error",
        }
    }
}

/// Sink that forwards every token to a channel
///
/// Send failures (the receiver went away) are ignored so a disconnected
/// client never aborts the run.
pub struct ChannelSink {
    buffer: TokenBuffer,
    tx: mpsc::UnboundedSender<AgentEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<AgentEvent>) -> Self {
        Self {
            buffer: TokenBuffer::new(),
            tx,
        }
    }
}

impl StreamSink for ChannelSink {
    fn emit(&mut self, token: &str) {
        self.buffer.emit(token);
        let _ = self.tx.send(AgentEvent::Token {
            content: token.to_string(),
        });
    }

    fn text(&self) -> &str {
        self.buffer.text()
    }
}
