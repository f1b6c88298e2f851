use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::context::{ExecutionContext, NodeResult};
use super::events::{EventSink, EventStream, RunEvent, RunSummary};
use super::graph::{Node, NodeKind, WorkflowGraph};
use crate::agent::AgentLoop;
use crate::error::SchedulerError;
use crate::traits::{StepRecord, StepRecorder};

const DEFAULT_EVENT_BUFFER: usize = 32;

/// Runs workflow graphs one node at a time in topological order.
///
/// Agent nodes go through the [`AgentLoop`]; every other kind is skipped.
/// A failed node does not stop the run. Only an invalid graph or a crashed
/// node task does.
pub struct GraphScheduler {
    agent: Arc<AgentLoop>,
    recorder: Option<Arc<dyn StepRecorder>>,
    event_buffer: usize,
}

impl GraphScheduler {
    pub fn new(agent: Arc<AgentLoop>) -> Self {
        Self {
            agent,
            recorder: None,
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }

    pub fn with_recorder(mut self, recorder: Arc<dyn StepRecorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub fn with_event_buffer(mut self, event_buffer: usize) -> Self {
        self.event_buffer = event_buffer.max(1);
        self
    }

    /// Starts a run in the background and returns its events.
    pub fn stream(self: &Arc<Self>, graph: WorkflowGraph) -> EventStream {
        let (sink, receiver) = EventSink::channel(self.event_buffer);
        let cancel = CancellationToken::new();

        let scheduler = Arc::clone(self);
        let token = cancel.clone();
        drop(tokio::spawn(async move {
            if let Err(e) = scheduler.run(&graph, &sink, &token).await {
                warn!(error = %e, "workflow run aborted");
            }
        }));

        EventStream::new(receiver, cancel)
    }

    /// Runs `graph` to completion, reporting through `sink`.
    ///
    /// Cancellation (or a closed sink) is honoured between nodes only.
    pub async fn run(
        &self,
        graph: &WorkflowGraph,
        sink: &EventSink,
        cancel: &CancellationToken,
    ) -> Result<ExecutionContext, SchedulerError> {
        let run_id = uuid::Uuid::new_v4().to_string();

        let schedule = match graph.schedule() {
            Ok(schedule) => schedule,
            Err(e) => {
                error!(run_id = %run_id, error = %e, "workflow rejected");
                sink.emit(RunEvent::run_error(e.to_string())).await;
                return Err(e.into());
            }
        };

        info!(
            run_id = %run_id,
            nodes = schedule.len(),
            dropped_edges = schedule.dropped_edges(),
            "workflow run started"
        );

        let mut context = ExecutionContext::default();
        let mut summary = RunSummary::new(run_id.clone());

        for node_id in schedule.order() {
            if cancel.is_cancelled() || sink.is_closed() {
                info!(run_id = %run_id, next = %node_id, "run cancelled");
                summary.cancelled = true;
                break;
            }

            let Some(node) = graph.node(node_id) else {
                let e = SchedulerError::NodeAborted {
                    node_id: node_id.clone(),
                    message: "node missing from graph".to_string(),
                };
                sink.emit(RunEvent::run_error(e.to_string())).await;
                return Err(e);
            };

            sink.emit(RunEvent::Start {
                node_id: node_id.clone(),
            })
            .await;

            let parent_context = context.parent_context(schedule.predecessors(node_id));
            let result = match self.execute_node(node, parent_context).await {
                Ok(result) => result,
                Err(e) => {
                    error!(run_id = %run_id, node_id = %node_id, error = %e, "node task crashed");
                    sink.emit(RunEvent::run_error(e.to_string())).await;
                    return Err(e);
                }
            };

            summary.tally(&result);
            self.record(&run_id, node, &result);

            let event = if result.is_error() {
                RunEvent::Error {
                    node_id: Some(node_id.clone()),
                    message: result
                        .detail
                        .clone()
                        .unwrap_or_else(|| "node failed".to_string()),
                    payload: Some(result.clone()),
                }
            } else {
                RunEvent::Result {
                    node_id: node_id.clone(),
                    payload: result.clone(),
                }
            };

            context.insert(node_id.clone(), result);
            sink.emit(event).await;
        }

        info!(
            run_id = %run_id,
            succeeded = summary.succeeded,
            skipped = summary.skipped,
            failed = summary.failed,
            cancelled = summary.cancelled,
            "workflow run finished"
        );
        sink.emit(RunEvent::End { payload: summary }).await;

        Ok(context)
    }

    async fn execute_node(
        &self,
        node: &Node,
        parent_context: String,
    ) -> Result<NodeResult, SchedulerError> {
        if node.kind != NodeKind::Agent {
            info!(node_id = %node.id, kind = %node.kind, "skipping non-agent node");
            return Ok(NodeResult::skipped("not agent"));
        }

        let Some(goal) = node.goal() else {
            warn!(node_id = %node.id, "agent node has no goal");
            return Ok(NodeResult::skipped("missing goal"));
        };

        info!(node_id = %node.id, context_chars = parent_context.len(), "running agent node");

        let agent = Arc::clone(&self.agent);
        let goal = goal.to_string();
        tokio::spawn(async move { agent.run(&goal, &parent_context).await })
            .await
            .map_err(|e| SchedulerError::NodeAborted {
                node_id: node.id.clone(),
                message: e.to_string(),
            })
    }

    /// Hands the step to the recorder without waiting on it.
    fn record(&self, run_id: &str, node: &Node, result: &NodeResult) {
        let Some(recorder) = self.recorder.clone() else {
            return;
        };

        let step = StepRecord {
            run_id: run_id.to_string(),
            node_id: node.id.clone(),
            kind: node.kind.clone(),
            input: node.config.clone(),
            output: result.clone(),
            recorded_at: Utc::now(),
        };

        drop(tokio::spawn(async move {
            let node_id = step.node_id.clone();
            if let Err(e) = recorder.record(step).await {
                error!(node_id = %node_id, recorder = recorder.name(), "Failed to record step: {}", e);
            }
        }));
    }
}
