//! Progress events for a workflow run.
//!
//! The scheduler pushes events into a bounded channel as it advances; the
//! caller pulls them from an [`EventStream`]. Each event renders to one
//! self-contained NDJSON line.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Stream;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use super::context::{NodeResult, NodeStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    /// A node is about to execute.
    Start { node_id: String },

    /// A node finished, successfully or skipped.
    Result { node_id: String, payload: NodeResult },

    /// A node failed (`node_id` set), or the run itself failed (`node_id`
    /// absent). A run-level error is the last event of its stream.
    Error {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        node_id: Option<String>,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<NodeResult>,
    },

    /// The run is over.
    End { payload: RunSummary },
}

impl RunEvent {
    pub fn run_error(message: impl Into<String>) -> Self {
        RunEvent::Error {
            node_id: None,
            message: message.into(),
            payload: None,
        }
    }

    pub fn node_id(&self) -> Option<&str> {
        match self {
            RunEvent::Start { node_id } | RunEvent::Result { node_id, .. } => Some(node_id),
            RunEvent::Error { node_id, .. } => node_id.as_deref(),
            RunEvent::End { .. } => None,
        }
    }

    /// Whether nothing can follow this event.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunEvent::End { .. } | RunEvent::Error { node_id: None, .. }
        )
    }

    /// One NDJSON record, newline included.
    pub fn to_ndjson(&self) -> serde_json::Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub executed: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub cancelled: bool,
}

impl RunSummary {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            ..Self::default()
        }
    }

    pub fn tally(&mut self, result: &NodeResult) {
        self.executed += 1;
        match result.status {
            NodeStatus::Success => self.succeeded += 1,
            NodeStatus::Skipped => self.skipped += 1,
            NodeStatus::Error => self.failed += 1,
        }
    }
}

/// Sending half held by the scheduler.
#[derive(Debug, Clone)]
pub struct EventSink {
    sender: mpsc::Sender<RunEvent>,
}

impl EventSink {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<RunEvent>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Waits for buffer space. Returns false once the consumer is gone.
    pub async fn emit(&self, event: RunEvent) -> bool {
        self.sender.send(event).await.is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Lazily yields the events of one run.
///
/// Dropping the stream, or calling [`EventStream::cancel`], asks the
/// scheduler to stop before its next node. The node in flight still
/// finishes and reports.
pub struct EventStream {
    inner: ReceiverStream<RunEvent>,
    cancel: CancellationToken,
}

impl EventStream {
    pub fn new(receiver: mpsc::Receiver<RunEvent>, cancel: CancellationToken) -> Self {
        Self {
            inner: ReceiverStream::new(receiver),
            cancel,
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

impl Stream for EventStream {
    type Item = RunEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
