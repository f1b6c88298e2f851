pub mod provider;
pub mod recorder;
pub mod search;
pub mod tool;

pub use provider::{ChatMessage, ChatRequest, ChatResponse, Provider, Role, ToolCall};
pub use recorder::{StepRecord, StepRecorder};
pub use search::SearchProvider;
pub use tool::{Tool, ToolCapability, ToolResult, ToolSpec};
