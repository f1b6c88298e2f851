use std::time::Duration;
use thiserror::Error;

/// Graph-level failures. Surfaced before any node runs.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("duplicate node id: {0}")]
    DuplicateNode(String),

    #[error(
        "cycle detected: {scheduled} of {total} nodes could be ordered, unresolved: {}",
        remaining.join(", ")
    )]
    CycleDetected {
        scheduled: usize,
        total: usize,
        remaining: Vec<String>,
    },
}

/// Failures that are fatal to a single agent node.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("LLM invocation failed: {0}")]
    LlmInvocation(String),

    #[error("{what} timed out after {limit:?}")]
    Timeout { what: String, limit: Duration },
}

/// Failures inside a tool boundary. Rendered into observations, never propagated.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ToolError {
    #[error("Tool '{0}' not found")]
    NotFound(String),

    #[error("No content provided for {0}")]
    MissingContent(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Error executing tool: {0}")]
    Execution(String),
}

impl ToolError {
    pub fn observation(&self) -> String {
        match self {
            Self::Execution(_) => self.to_string(),
            _ => format!("Error: {}", self),
        }
    }
}

/// Failures that end a whole run.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error("node '{node_id}' aborted the run: {message}")]
    NodeAborted { node_id: String, message: String },
}
