//! Worklist fixpoint interpreters.
//!
//! A [`ForwardInterpreter`] propagates states from the CFG entry along the edges, a
//! [`BackwardInterpreter`] propagates them from the exit against the edges. Both follow the
//! same algorithm:
//!
//! 1. Pop a node and compute its entry state: the initial state for the start node, otherwise
//!    the join of the neighbouring exit states, each filtered through the edge guard and the
//!    scope hook of the edge kind.
//! 2. At loop heads, widen with the recorded entry state once the node has been processed
//!    more than `widening` times.
//! 3. Stop if the new entry state is below the recorded one. Otherwise run the statements,
//!    record the states, and enqueue the neighbours downstream.
//!
//! Nodes never reached are reported with Bottom states.

use std::collections::{HashMap, VecDeque};

use log::{debug, trace, warn};

use crate::cfg::{ControlFlowGraph, Edge, EdgeKind, NodeId};
use crate::error::Result;
use crate::lattice::Lattice;
use crate::result::AnalysisResult;
use crate::semantics::Semantics;
use crate::state::State;

/// Number of iterations a loop head may take before widening kicks in.
pub const DEFAULT_WIDENING: usize = 3;

pub trait Interpreter<S: State> {
    /// Runs the analysis from `initial` until a fixpoint is reached.
    fn analyze(&self, initial: S) -> Result<AnalysisResult<S>>;
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Direction {
    Forward,
    Backward,
}

#[derive(Debug, Clone)]
pub struct ForwardInterpreter<M> {
    cfg: ControlFlowGraph,
    semantics: M,
    widening: usize,
}

impl<M> ForwardInterpreter<M> {
    pub fn new(cfg: ControlFlowGraph, semantics: M, widening: usize) -> Self {
        ForwardInterpreter {
            cfg,
            semantics,
            widening,
        }
    }

    pub fn with_default_widening(cfg: ControlFlowGraph, semantics: M) -> Self {
        Self::new(cfg, semantics, DEFAULT_WIDENING)
    }

    pub fn cfg(&self) -> &ControlFlowGraph {
        &self.cfg
    }

    pub fn widening(&self) -> usize {
        self.widening
    }
}

impl<S: State, M: Semantics<S>> Interpreter<S> for ForwardInterpreter<M> {
    fn analyze(&self, initial: S) -> Result<AnalysisResult<S>> {
        Fixpoint {
            cfg: &self.cfg,
            semantics: &self.semantics,
            widening: self.widening,
            direction: Direction::Forward,
        }
        .run(initial)
    }
}

#[derive(Debug, Clone)]
pub struct BackwardInterpreter<M> {
    cfg: ControlFlowGraph,
    semantics: M,
    widening: usize,
}

impl<M> BackwardInterpreter<M> {
    pub fn new(cfg: ControlFlowGraph, semantics: M, widening: usize) -> Self {
        BackwardInterpreter {
            cfg,
            semantics,
            widening,
        }
    }

    pub fn with_default_widening(cfg: ControlFlowGraph, semantics: M) -> Self {
        Self::new(cfg, semantics, DEFAULT_WIDENING)
    }

    pub fn cfg(&self) -> &ControlFlowGraph {
        &self.cfg
    }

    pub fn widening(&self) -> usize {
        self.widening
    }
}

impl<S: State, M: Semantics<S>> Interpreter<S> for BackwardInterpreter<M> {
    fn analyze(&self, initial: S) -> Result<AnalysisResult<S>> {
        Fixpoint {
            cfg: &self.cfg,
            semantics: &self.semantics,
            widening: self.widening,
            direction: Direction::Backward,
        }
        .run(initial)
    }
}

/// One analysis run in a given direction.
struct Fixpoint<'a, M> {
    cfg: &'a ControlFlowGraph,
    semantics: &'a M,
    widening: usize,
    direction: Direction,
}

impl<M> Fixpoint<'_, M> {
    fn start(&self) -> NodeId {
        match self.direction {
            Direction::Forward => self.cfg.in_node(),
            Direction::Backward => self.cfg.out_node(),
        }
    }

    /// Edges feeding `node`, together with the neighbour at their other end.
    fn incoming(&self, node: NodeId) -> Vec<(&Edge, NodeId)> {
        match self.direction {
            Direction::Forward => self.cfg.in_edges(node).map(|e| (e, e.source)).collect(),
            Direction::Backward => self.cfg.out_edges(node).map(|e| (e, e.target)).collect(),
        }
    }

    /// Nodes fed by `node`.
    fn outgoing(&self, node: NodeId) -> Vec<NodeId> {
        match self.direction {
            Direction::Forward => self.cfg.successors(node).into_iter().collect(),
            Direction::Backward => self.cfg.predecessors(node).into_iter().collect(),
        }
    }

    /// The state of `states` on the side facing the analysis start.
    fn entry_of<'s, S>(&self, states: &'s [S]) -> Option<&'s S> {
        match self.direction {
            Direction::Forward => states.first(),
            Direction::Backward => states.last(),
        }
    }

    /// The state of `states` on the side facing away from the analysis start.
    fn exit_of<'s, S>(&self, states: &'s [S]) -> Option<&'s S> {
        match self.direction {
            Direction::Forward => states.last(),
            Direction::Backward => states.first(),
        }
    }

    fn scope_hook<S: State>(&self, kind: EdgeKind, state: S) -> S {
        match (self.direction, kind) {
            (_, EdgeKind::Default) => state,
            (Direction::Forward, EdgeKind::IfIn) | (Direction::Backward, EdgeKind::IfOut) => state.enter_if(),
            (Direction::Forward, EdgeKind::IfOut) | (Direction::Backward, EdgeKind::IfIn) => state.exit_if(),
            (Direction::Forward, EdgeKind::LoopIn) | (Direction::Backward, EdgeKind::LoopOut) => state.enter_loop(),
            (Direction::Forward, EdgeKind::LoopOut) | (Direction::Backward, EdgeKind::LoopIn) => state.exit_loop(),
        }
    }

    fn run<S>(&self, initial: S) -> Result<AnalysisResult<S>>
    where
        S: State,
        M: Semantics<S>,
    {
        let start = self.start();
        let mut result = AnalysisResult::new(self.cfg.clone());
        let mut iterations: HashMap<NodeId, usize> = HashMap::new();
        let mut worklist = VecDeque::from([start]);

        while let Some(current) = worklist.pop_front() {
            let Some(node) = self.cfg.node(current) else {
                warn!("node {} is referenced by an edge but missing from the CFG", current);
                continue;
            };
            let iteration = iterations.get(&current).copied().unwrap_or(0);
            debug!("{:?} visit of node {} (iteration {})", self.direction, current, iteration);

            let previous = result
                .get_node_result(current)
                .and_then(|states: &[S]| self.entry_of(states))
                .cloned();

            let mut entry = if current == start {
                initial.clone()
            } else {
                let mut entry = initial.bottom();
                for (edge, neighbour) in self.incoming(current) {
                    let Some(exit) = result.get_node_result(neighbour).and_then(|s| self.exit_of(s)) else {
                        continue;
                    };
                    let mut state = exit.clone();
                    match self.direction {
                        Direction::Forward => {
                            if let Some(condition) = &edge.condition {
                                state = self.semantics.filter(condition, state)?;
                            }
                            state = self.scope_hook(edge.kind, state);
                        }
                        Direction::Backward => {
                            state = self.scope_hook(edge.kind, state);
                            if let Some(condition) = &edge.condition {
                                state = self.semantics.filter(condition, state)?;
                            }
                        }
                    }
                    entry = entry.join(state);
                }
                if let Some(previous) = &previous {
                    if self.cfg.is_loop_head(current) && self.widening < iteration {
                        debug!("widening at node {} (iteration {})", current, iteration);
                        entry = previous.clone().widening(entry);
                    }
                }
                entry
            };

            if let Some(previous) = &previous {
                if entry.less_equal(previous) {
                    debug!("node {} is stable", current);
                    continue;
                }
            }

            let mut states = VecDeque::with_capacity(node.size() + 1);
            states.push_back(entry.clone());
            match self.direction {
                Direction::Forward => {
                    for stmt in &node.stmts {
                        entry = self.semantics.apply(stmt, entry)?;
                        trace!("after `{}`: {}", stmt, entry);
                        states.push_back(entry.clone());
                    }
                }
                Direction::Backward => {
                    for stmt in node.stmts.iter().rev() {
                        entry = self.semantics.apply(stmt, entry)?;
                        trace!("before `{}`: {}", stmt, entry);
                        states.push_front(entry.clone());
                    }
                }
            }
            result.set_node_result(current, states.into());

            worklist.extend(self.outgoing(current));
            iterations.insert(current, iteration + 1);
        }

        for node in self.cfg.nodes() {
            if !result.has_node_result(node.id) {
                debug!("node {} is unreachable", node.id);
                result.set_node_result(node.id, vec![initial.bottom(); node.size() + 1]);
            }
        }

        Ok(result)
    }
}
