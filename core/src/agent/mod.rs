pub mod context;
pub mod fallback;
pub mod loop_;
pub mod registry;

pub use context::ContextBuilder;
pub use loop_::{AgentLoop, AgentOutcome};
pub use registry::ToolRegistry;
