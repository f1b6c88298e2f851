pub mod agent;
pub mod config;
pub mod error;
pub mod providers;
pub mod recorder;
pub mod search;
pub mod tools;
pub mod traits;
pub mod workflow;

#[cfg(test)]
mod test_support;

pub use agent::{AgentLoop, AgentOutcome, ContextBuilder, ToolRegistry};
pub use config::Config;
pub use error::{AgentError, ScheduleError, SchedulerError, ToolError};
pub use providers::create_provider;
pub use recorder::{JsonlRecorder, create_recorder};
pub use search::create_search;
pub use tools::{FileWriteTool, WebSearchTool};
pub use traits::{
    ChatMessage, ChatRequest, ChatResponse, Provider, Role, SearchProvider, StepRecord,
    StepRecorder, Tool, ToolCall, ToolCapability, ToolResult, ToolSpec,
};
pub use workflow::{
    Edge, EventStream, ExecutionContext, GraphScheduler, Node, NodeKind, NodeResult, NodeStatus,
    RunEvent, RunSummary, WorkflowGraph,
};
