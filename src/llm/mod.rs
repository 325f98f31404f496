// LLM abstraction layer

pub mod provider;
pub mod openai;
pub mod client;

pub use provider::*;
pub use client::{Completion, CompletionClient};
