use crate::workflow::{NodeKind, NodeResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// What happened at one node of one run: the executed input and the result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub run_id: String,
    pub node_id: String,
    pub kind: NodeKind,
    pub input: serde_json::Map<String, serde_json::Value>,
    pub output: NodeResult,
    pub recorded_at: chrono::DateTime<chrono::Utc>,
}

/// Durable storage for step records. Failures are reported to the caller
/// but a run never depends on them.
#[async_trait]
pub trait StepRecorder: Send + Sync {
    fn name(&self) -> &str;

    async fn record(&self, step: StepRecord) -> anyhow::Result<()>;
}
