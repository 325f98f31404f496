//! Research Session
//!
//! Tracks the presentation state machine: `Idle` → `Running` on an accepted
//! query, back to `Idle` when the run ends however it ends. Only one run is
//! accepted at a time.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

use crate::stream::AgentEvent;
use crate::types::AppResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Idle,
    Running,
}

/// What the page shows when a run ends
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    FinalAnswer(String),
    Failed(String),
}

impl From<AppResult<String>> for RunOutcome {
    fn from(result: AppResult<String>) -> Self {
        match result {
            Ok(answer) => RunOutcome::FinalAnswer(answer),
            Err(e) => RunOutcome::Failed(e.to_string()),
        }
    }
}

impl From<RunOutcome> for AgentEvent {
    fn from(outcome: RunOutcome) -> Self {
        match outcome {
            RunOutcome::FinalAnswer(answer) => AgentEvent::Final { answer },
            RunOutcome::Failed(message) => AgentEvent::Error { message },
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("Query must not be empty")]
    EmptyQuery,

    #[error("A research run is already in progress")]
    Busy,
}

#[derive(Debug, Clone, Default)]
pub struct ResearchSession {
    running: Arc<AtomicBool>,
}

impl ResearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RunState {
        if self.running.load(Ordering::Acquire) {
            RunState::Running
        } else {
            RunState::Idle
        }
    }

    /// Move to `Running` for a non-blank query
    ///
    /// The session returns to `Idle` when the guard is dropped.
    pub fn try_start(&self, query: &str) -> Result<RunGuard, SessionError> {
        if query.trim().is_empty() {
            return Err(SessionError::EmptyQuery);
        }

        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SessionError::Busy)?;

        Ok(RunGuard {
            running: self.running.clone(),
        })
    }
}

#[must_use = "the session returns to Idle as soon as the guard is dropped"]
#[derive(Debug)]
pub struct RunGuard {
    running: Arc<AtomicBool>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}
