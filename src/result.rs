//! Analysis results: the states observed at every statement boundary of every node.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::cfg::{ControlFlowGraph, NodeId};

/// Map from a CFG node to its states `[entry, after stmt 1, ..., exit]`.
///
/// # Invariants
///
/// The states of a node number one more than its statements.
#[derive(Debug, Clone)]
pub struct AnalysisResult<S> {
    cfg: ControlFlowGraph,
    result: BTreeMap<NodeId, Vec<S>>,
}

impl<S> AnalysisResult<S> {
    pub fn new(cfg: ControlFlowGraph) -> Self {
        AnalysisResult {
            cfg,
            result: BTreeMap::new(),
        }
    }

    pub fn cfg(&self) -> &ControlFlowGraph {
        &self.cfg
    }

    pub fn get_node_result(&self, node: NodeId) -> Option<&[S]> {
        self.result.get(&node).map(Vec::as_slice)
    }

    pub fn set_node_result(&mut self, node: NodeId, states: Vec<S>) {
        self.result.insert(node, states);
    }

    pub fn has_node_result(&self, node: NodeId) -> bool {
        self.result.contains_key(&node)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &[S])> {
        self.result.iter().map(|(&id, states)| (id, states.as_slice()))
    }
}

enum Pending {
    Node(NodeId),
    Edge(NodeId, NodeId),
}

/// Walks the CFG from its entry, printing each node's states interleaved
/// with its statements, followed by its outgoing edges.
impl<S: fmt::Display> fmt::Display for AnalysisResult<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut visited_nodes = HashSet::new();
        let mut visited_edges = HashSet::new();
        let mut pending = vec![Pending::Node(self.cfg.in_node())];
        let mut first = true;
        while let Some(current) = pending.pop() {
            match current {
                Pending::Node(id) => {
                    if !visited_nodes.insert(id) {
                        continue;
                    }
                    if !first {
                        writeln!(f)?;
                    }
                    first = false;
                    writeln!(f, "********* {} *********", id)?;
                    let states = self.get_node_result(id).unwrap_or_default();
                    let stmts = self.cfg.node(id).map(|n| n.stmts.as_slice()).unwrap_or_default();
                    for i in 0..states.len().max(stmts.len()) {
                        if let Some(state) = states.get(i) {
                            writeln!(f, "{}", state)?;
                        }
                        if let Some(stmt) = stmts.get(i) {
                            writeln!(f, "{}", stmt)?;
                        }
                    }
                    for edge in self.cfg.out_edges(id) {
                        if !visited_edges.contains(&(edge.source, edge.target)) {
                            pending.push(Pending::Edge(edge.source, edge.target));
                        }
                    }
                }
                Pending::Edge(source, target) => {
                    if !visited_edges.insert((source, target)) {
                        continue;
                    }
                    if let Some(edge) = self.cfg.edge(source, target) {
                        write!(f, "\n{}\n", edge)?;
                    }
                    if !visited_nodes.contains(&target) {
                        pending.push(Pending::Node(target));
                    }
                }
            }
        }
        Ok(())
    }
}
