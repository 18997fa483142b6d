//! Control-flow graphs.
//!
//! A [`ControlFlowGraph`] is a pure data container handed over by a frontend: nodes are basic
//! blocks of [`Statement`]s, edges connect nodes and may carry a guard condition. Edge kinds
//! mark where `if` branches and loop bodies are entered and left, which the interpreter uses
//! to find widening points and to drive the state hooks of scoped domains.
//!
//! Well-formedness (single entry and exit, edge endpoints present) is the caller's
//! responsibility and is not validated.

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use std::fmt;

use crate::statement::Statement;

pub type NodeId = usize;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum NodeKind {
    Basic,
    /// A loop head.
    Loop,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub stmts: Vec<Statement>,
}

impl Node {
    pub fn basic(id: NodeId, stmts: Vec<Statement>) -> Self {
        Node {
            id,
            kind: NodeKind::Basic,
            stmts,
        }
    }

    pub fn loop_head(id: NodeId) -> Self {
        Node {
            id,
            kind: NodeKind::Loop,
            stmts: Vec::new(),
        }
    }

    pub fn size(&self) -> usize {
        self.stmts.len()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Edge kind, ordered from leaving a scope to entering one.
///
/// `IfIn` edges enter a branch and `IfOut` edges leave it towards the join point.
/// `LoopIn` edges enter a loop body from its head and `LoopOut` edges lead from the
/// body back to the head. The edge from a loop head to the code after the loop is `Default`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum EdgeKind {
    IfOut,
    LoopOut,
    Default,
    LoopIn,
    IfIn,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    pub kind: EdgeKind,
    /// Guard of a conditional edge.
    pub condition: Option<Statement>,
}

impl Edge {
    pub fn unconditional(source: NodeId, target: NodeId, kind: EdgeKind) -> Self {
        Edge {
            source,
            target,
            kind,
            condition: None,
        }
    }

    pub fn conditional(source: NodeId, condition: Statement, target: NodeId, kind: EdgeKind) -> Self {
        Edge {
            source,
            target,
            kind,
            condition: Some(condition),
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.condition {
            Some(condition) => write!(f, "{} -- {} -- {}", self.source, condition, self.target),
            None => write!(f, "{} -- {}", self.source, self.target),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ControlFlowGraph {
    nodes: BTreeMap<NodeId, Node>,
    edges: BTreeMap<(NodeId, NodeId), Edge>,
    in_node: NodeId,
    out_node: NodeId,
}

impl ControlFlowGraph {
    pub fn new(in_node: NodeId, out_node: NodeId) -> Self {
        ControlFlowGraph {
            nodes: BTreeMap::new(),
            edges: BTreeMap::new(),
            in_node,
            out_node,
        }
    }

    /// Adds a node, replacing any node with the same id.
    pub fn add_node(&mut self, node: Node) -> &mut Self {
        self.nodes.insert(node.id, node);
        self
    }

    /// Adds an edge, replacing any edge between the same endpoints.
    pub fn add_edge(&mut self, edge: Edge) -> &mut Self {
        self.edges.insert((edge.source, edge.target), edge);
        self
    }

    /// Adds an unconditional `Default` edge.
    pub fn connect(&mut self, source: NodeId, target: NodeId) -> &mut Self {
        self.add_edge(Edge::unconditional(source, target, EdgeKind::Default))
    }

    pub fn in_node(&self) -> NodeId {
        self.in_node
    }

    pub fn out_node(&self) -> NodeId {
        self.out_node
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn edge(&self, source: NodeId, target: NodeId) -> Option<&Edge> {
        self.edges.get(&(source, target))
    }

    pub fn in_edges(&self, node: NodeId) -> impl Iterator<Item = &Edge> {
        self.edges.values().filter(move |e| e.target == node)
    }

    pub fn out_edges(&self, node: NodeId) -> impl Iterator<Item = &Edge> {
        self.edges.range((node, NodeId::MIN)..=(node, NodeId::MAX)).map(|(_, e)| e)
    }

    pub fn predecessors(&self, node: NodeId) -> BTreeSet<NodeId> {
        self.in_edges(node).map(|e| e.source).collect()
    }

    pub fn successors(&self, node: NodeId) -> BTreeSet<NodeId> {
        self.out_edges(node).map(|e| e.target).collect()
    }

    /// Whether `node` is a widening point: a `Loop` node, or a node whose outgoing
    /// `LoopIn` edge enters a loop body (including a self-loop).
    pub fn is_loop_head(&self, node: NodeId) -> bool {
        let is_loop = self.node(node).is_some_and(|n| n.kind == NodeKind::Loop);
        is_loop || self.out_edges(node).any(|e| e.kind == EdgeKind::LoopIn)
    }

    /// Nodes reachable from the entry, in breadth-first order.
    pub fn nodes_forward(&self) -> Vec<NodeId> {
        self.breadth_first(self.in_node, |id| self.successors(id))
    }

    /// Nodes reaching the exit, in breadth-first order against the edges.
    pub fn nodes_backward(&self) -> Vec<NodeId> {
        self.breadth_first(self.out_node, |id| self.predecessors(id))
    }

    fn breadth_first<F>(&self, start: NodeId, next: F) -> Vec<NodeId>
    where
        F: Fn(NodeId) -> BTreeSet<NodeId>,
    {
        let mut order = Vec::new();
        let mut done = HashSet::new();
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            if done.insert(current) {
                order.push(current);
                queue.extend(next(current));
            }
        }
        order
    }
}
