//! Workflow graphs: validation and ordering, per-run context, the
//! sequential scheduler and its event stream.

pub mod context;
pub mod events;
pub mod graph;
pub mod scheduler;

pub use context::{CONTEXT_SEPARATOR, ExecutionContext, NodeResult, NodeStatus};
pub use events::{EventSink, EventStream, RunEvent, RunSummary};
pub use graph::{Edge, Node, NodeKind, Schedule, WorkflowGraph};
pub use scheduler::GraphScheduler;
