use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Separates parent contributions in a node's inherited context.
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Success,
    Skipped,
    Error,
}

/// What one node produced.
///
/// `raw_findings` keeps the tool evidence apart from the model's final
/// answer, so dependents can work from the evidence itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeResult {
    pub status: NodeStatus,
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_findings: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl NodeResult {
    pub fn success(output: impl Into<String>, raw_findings: Option<String>) -> Self {
        Self {
            status: NodeStatus::Success,
            output: output.into(),
            raw_findings,
            detail: None,
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            status: NodeStatus::Skipped,
            output: String::new(),
            raw_findings: None,
            detail: Some(reason.into()),
        }
    }

    pub fn error(detail: impl Into<String>) -> Self {
        Self {
            status: NodeStatus::Error,
            output: String::new(),
            raw_findings: None,
            detail: Some(detail.into()),
        }
    }

    pub fn with_raw_findings(mut self, raw_findings: Option<String>) -> Self {
        self.raw_findings = raw_findings;
        self
    }

    pub fn is_error(&self) -> bool {
        self.status == NodeStatus::Error
    }

    /// Raw findings when present, otherwise the synthesized output.
    pub fn findings(&self) -> &str {
        match self.raw_findings.as_deref() {
            Some(raw) if !raw.trim().is_empty() => raw,
            _ => &self.output,
        }
    }
}

/// Results of the nodes that have terminated so far in one run.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    results: HashMap<String, NodeResult>,
    completed: Vec<String>,
}

impl ExecutionContext {
    /// Stores a terminal result. An existing entry is never replaced.
    pub fn insert(&mut self, node_id: impl Into<String>, result: NodeResult) -> bool {
        let node_id = node_id.into();
        if self.results.contains_key(&node_id) {
            tracing::warn!(node_id = %node_id, "ignoring second result for completed node");
            return false;
        }
        self.completed.push(node_id.clone());
        self.results.insert(node_id, result);
        true
    }

    pub fn get(&self, node_id: &str) -> Option<&NodeResult> {
        self.results.get(node_id)
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.results.contains_key(node_id)
    }

    pub fn len(&self) -> usize {
        self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.completed.is_empty()
    }

    /// Results in completion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &NodeResult)> {
        self.completed
            .iter()
            .filter_map(|id| self.results.get(id).map(|r| (id.as_str(), r)))
    }

    /// Concatenates the findings of `parents` that have completed, in the
    /// given order. Parents with nothing to contribute are left out.
    pub fn parent_context(&self, parents: &[String]) -> String {
        parents
            .iter()
            .filter_map(|id| {
                let text = self.get(id)?.findings().trim();
                (!text.is_empty()).then(|| format!("[{}]\n{}", id, text))
            })
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR)
    }
}
