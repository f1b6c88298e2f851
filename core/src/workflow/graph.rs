use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::ScheduleError;

/// How a node is executed. Anything that is not an agent is opaque here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
    Agent,
    Other(String),
}

impl From<String> for NodeKind {
    fn from(kind: String) -> Self {
        match kind.trim().to_ascii_lowercase().as_str() {
            "agent" | "agent_node" => NodeKind::Agent,
            _ => NodeKind::Other(kind),
        }
    }
}

impl From<NodeKind> for String {
    fn from(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Agent => "agent".to_string(),
            NodeKind::Other(kind) => kind,
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Agent => write!(f, "agent"),
            Self::Other(kind) => write!(f, "{kind}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(alias = "type", alias = "node_type")]
    pub kind: NodeKind,
    /// `goal` for agent nodes; provider-specific fields otherwise.
    #[serde(default, alias = "data")]
    pub config: Map<String, Value>,
}

impl Node {
    pub fn agent(id: impl Into<String>, goal: impl Into<String>) -> Self {
        let mut config = Map::new();
        config.insert("goal".to_string(), Value::String(goal.into()));
        Self {
            id: id.into(),
            kind: NodeKind::Agent,
            config,
        }
    }

    pub fn other(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: NodeKind::Other(kind.into()),
            config: Map::new(),
        }
    }

    pub fn goal(&self) -> Option<&str> {
        self.config
            .get("goal")
            .and_then(|v| v.as_str())
            .filter(|g| !g.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// One run's submission. Node order is significant: it breaks ties between
/// nodes that become ready at the same time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowGraph {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

/// A validated execution order plus each node's direct predecessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    order: Vec<String>,
    predecessors: HashMap<String, Vec<String>>,
    dropped_edges: usize,
}

impl Schedule {
    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// Direct predecessors in edge submission order, duplicates removed.
    pub fn predecessors(&self, node_id: &str) -> &[String] {
        self.predecessors
            .get(node_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Edges ignored because an endpoint is not a node of the graph.
    pub fn dropped_edges(&self) -> usize {
        self.dropped_edges
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl WorkflowGraph {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Orders the nodes with Kahn's algorithm.
    ///
    /// Edges that reference unknown nodes are dropped with a warning and do
    /// not count towards any in-degree. Duplicate edges count once. The ready
    /// queue is FIFO, seeded in node order and extended in edge order, so the
    /// result is deterministic for a given submission.
    pub fn schedule(&self) -> Result<Schedule, ScheduleError> {
        let mut index: HashMap<&str, usize> = HashMap::with_capacity(self.nodes.len());
        for (i, node) in self.nodes.iter().enumerate() {
            if index.insert(node.id.as_str(), i).is_some() {
                return Err(ScheduleError::DuplicateNode(node.id.clone()));
            }
        }

        let total = self.nodes.len();
        let mut successors: Vec<Vec<usize>> = vec![Vec::new(); total];
        let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); total];
        let mut in_degree = vec![0usize; total];
        let mut seen: HashSet<(usize, usize)> = HashSet::new();
        let mut dropped_edges = 0;

        for edge in &self.edges {
            let (Some(&source), Some(&target)) = (
                index.get(edge.source.as_str()),
                index.get(edge.target.as_str()),
            ) else {
                warn!(
                    source = %edge.source,
                    target = %edge.target,
                    "dropping edge that references an unknown node"
                );
                dropped_edges += 1;
                continue;
            };

            if !seen.insert((source, target)) {
                continue;
            }

            successors[source].push(target);
            predecessors[target].push(source);
            in_degree[target] += 1;
        }

        let mut ready: VecDeque<usize> = (0..total).filter(|&i| in_degree[i] == 0).collect();
        let mut order = Vec::with_capacity(total);

        while let Some(current) = ready.pop_front() {
            order.push(current);
            for &next in &successors[current] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    ready.push_back(next);
                }
            }
        }

        if order.len() < total {
            let remaining = (0..total)
                .filter(|&i| in_degree[i] > 0)
                .map(|i| self.nodes[i].id.clone())
                .collect();
            return Err(ScheduleError::CycleDetected {
                scheduled: order.len(),
                total,
                remaining,
            });
        }

        let id = |i: usize| self.nodes[i].id.clone();
        Ok(Schedule {
            order: order.into_iter().map(id).collect(),
            predecessors: predecessors
                .into_iter()
                .enumerate()
                .filter(|(_, preds)| !preds.is_empty())
                .map(|(i, preds)| (id(i), preds.into_iter().map(id).collect()))
                .collect(),
            dropped_edges,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn graph(nodes: &[&str], edges: &[(&str, &str)]) -> WorkflowGraph {
        WorkflowGraph::new(
            nodes.iter().map(|id| Node::agent(*id, "goal")).collect(),
            edges.iter().map(|(s, t)| Edge::new(*s, *t)).collect(),
        )
    }

    fn position(schedule: &Schedule, id: &str) -> usize {
        schedule.order().iter().position(|n| n == id).unwrap()
    }

    #[test]
    fn no_edges_keeps_insertion_order() {
        let schedule = graph(&["c", "a", "b"], &[]).schedule().unwrap();
        assert_eq!(schedule.order(), ["c", "a", "b"]);
    }

    #[test]
    fn three_node_cycle_is_rejected() {
        let err = graph(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "a")])
            .schedule()
            .unwrap_err();

        assert_eq!(
            err,
            ScheduleError::CycleDetected {
                scheduled: 0,
                total: 3,
                remaining: vec!["a".into(), "b".into(), "c".into()],
            }
        );
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let err = graph(&["root", "x"], &[("root", "x"), ("x", "x")])
            .schedule()
            .unwrap_err();
        assert!(matches!(err, ScheduleError::CycleDetected { scheduled: 1, .. }));
    }

    #[test]
    fn duplicate_node_ids_are_rejected() {
        let err = graph(&["a", "b", "a"], &[]).schedule().unwrap_err();
        assert_eq!(err, ScheduleError::DuplicateNode("a".into()));
    }

    #[test]
    fn unknown_endpoints_do_not_affect_in_degree() {
        let schedule = graph(&["a", "b"], &[("ghost", "b"), ("a", "phantom"), ("b", "a")])
            .schedule()
            .unwrap();

        assert_eq!(schedule.order(), ["b", "a"]);
        assert_eq!(schedule.dropped_edges(), 2);
        assert!(schedule.predecessors("b").is_empty());
        assert_eq!(schedule.predecessors("a"), ["b"]);
    }

    #[test]
    fn duplicate_edges_count_once() {
        let schedule = graph(&["a", "b"], &[("a", "b"), ("a", "b")])
            .schedule()
            .unwrap();
        assert_eq!(schedule.order(), ["a", "b"]);
        assert_eq!(schedule.predecessors("b"), ["a"]);
    }

    #[test]
    fn predecessors_follow_edge_order() {
        let schedule = graph(&["x", "y", "z"], &[("y", "z"), ("x", "z")])
            .schedule()
            .unwrap();
        assert_eq!(schedule.predecessors("z"), ["y", "x"]);
    }

    #[test]
    fn every_edge_points_forward_in_generated_dags() {
        // Small LCG so the generated graphs are reproducible.
        let mut seed: u64 = 0x5eed;
        let mut next = move || {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (seed >> 33) as usize
        };

        for _ in 0..200 {
            let size = 2 + next() % 9;
            let ids: Vec<String> = (0..size).map(|i| format!("n{i}")).collect();

            let mut edges = Vec::new();
            for s in 0..size {
                for t in (s + 1)..size {
                    if next() % 3 == 0 {
                        edges.push(Edge::new(ids[s].clone(), ids[t].clone()));
                    }
                }
            }

            // Submit nodes in a scrambled order; the edges alone fix the topology.
            let mut nodes: Vec<Node> = ids.iter().map(|id| Node::agent(id.clone(), "g")).collect();
            for i in (1..nodes.len()).rev() {
                nodes.swap(i, next() % (i + 1));
            }

            let g = WorkflowGraph::new(nodes, edges.clone());
            let schedule = g.schedule().unwrap();
            assert_eq!(schedule.len(), size);
            for edge in &edges {
                assert!(position(&schedule, &edge.source) < position(&schedule, &edge.target));
            }
        }
    }

    #[test]
    fn deserializes_editor_style_payloads() {
        let payload = json!({
            "nodes": [
                {"id": "1", "type": "agent", "data": {"goal": "find hotels", "label": "Agent"}},
                {"id": "2", "kind": "rag_node", "config": {"query": "q", "top_k": 5}},
                {"id": "3", "kind": "Agent"}
            ],
            "edges": [{"source": "1", "target": "2"}]
        });

        let graph: WorkflowGraph = serde_json::from_value(payload).unwrap();
        assert_eq!(graph.nodes[0].kind, NodeKind::Agent);
        assert_eq!(graph.nodes[0].goal(), Some("find hotels"));
        assert_eq!(graph.nodes[1].kind, NodeKind::Other("rag_node".into()));
        assert_eq!(graph.nodes[2].kind, NodeKind::Agent);
        assert_eq!(graph.nodes[2].goal(), None);
        assert_eq!(graph.edges, vec![Edge::new("1", "2")]);
    }
}
