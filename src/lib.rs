//! # absint-rs: Abstract Interpretation over Control-Flow Graphs
//!
//! **`absint-rs`** is a small static analysis engine. Programs are given as
//! [control-flow graphs][crate::cfg::ControlFlowGraph] of simple statements (assignments,
//! built-in calls, guards); analyses are abstract domains plugged into a generic worklist
//! [interpreter][crate::interpreter], which runs them forward or backward until a fixpoint.
//!
//! ## What is abstract interpretation?
//!
//! Instead of running a program on concrete values, an abstract interpreter runs it on
//! *abstract states* that describe sets of concrete states, e.g. "`x` is between 0 and 9" or
//! "`y` is live". Abstract states form a [lattice][crate::lattice::Lattice]: control-flow
//! merges become joins, and loops are made to converge by *widening*.
//!
//! ## Key Features
//!
//! - **Two-Layer Lattices**: domains implement only the ordinary case of each lattice
//!   operation; Top/Bottom absorption is provided by the [`Lattice`][crate::lattice::Lattice] trait.
//! - **Forward and Backward**: the same fixpoint engine drives
//!   [`ForwardInterpreter`][crate::interpreter::ForwardInterpreter] and
//!   [`BackwardInterpreter`][crate::interpreter::BackwardInterpreter].
//! - **Numerical Domains**: [intervals][crate::interval_store::IntervalStore] and
//!   [octagons][crate::octagon::Octagon] over arbitrary-precision integers.
//! - **Scoped Analyses**: domains may react to entering and leaving `if` branches and loop
//!   bodies, as the [usage analysis][crate::usage] does.
//!
//! ## Basic Usage
//!
//! ```rust
//! use absint_rs::cfg::{ControlFlowGraph, Edge, EdgeKind, Node};
//! use absint_rs::expr::Variable;
//! use absint_rs::interpreter::{ForwardInterpreter, Interpreter};
//! use absint_rs::interval::Interval;
//! use absint_rs::interval_store::IntervalStore;
//! use absint_rs::semantics::ForwardSemantics;
//! use absint_rs::statement::{Builtin, Statement};
//!
//! // x = 0; while x < 10: x = x + 1
//! let cond = Statement::binary(Statement::var("x"), Builtin::Lt, Statement::literal(10));
//! let exit = Statement::call(Builtin::Not, vec![cond.clone()]);
//! let inc = Statement::binary(Statement::var("x"), Builtin::Add, Statement::literal(1));
//!
//! let mut cfg = ControlFlowGraph::new(1, 4);
//! cfg.add_node(Node::basic(1, vec![Statement::assign(Statement::var("x"), Statement::literal(0))]))
//!     .add_node(Node::loop_head(2))
//!     .add_node(Node::basic(3, vec![Statement::assign(Statement::var("x"), inc)]))
//!     .add_node(Node::basic(4, vec![]))
//!     .connect(1, 2)
//!     .add_edge(Edge::conditional(2, cond, 3, EdgeKind::LoopIn))
//!     .add_edge(Edge::unconditional(3, 2, EdgeKind::LoopOut))
//!     .add_edge(Edge::conditional(2, exit, 4, EdgeKind::Default));
//!
//! let x = Variable::new("x");
//! let interpreter = ForwardInterpreter::with_default_widening(cfg, ForwardSemantics);
//! let result = interpreter.analyze(IntervalStore::new([x.clone()])).unwrap();
//!
//! // After the loop, x >= 10.
//! let after = &result.get_node_result(4).unwrap()[0];
//! assert_eq!(after.get(&x), Interval::at_least(10));
//! ```
//!
//! ## Core Components
//!
//! - **[`lattice`]**, **[`store`]**: the lattice abstraction and its pointwise lifting to maps.
//! - **[`cfg`]**, **[`statement`]**, **[`expr`]**: the program representation.
//! - **[`state`]**, **[`semantics`]**, **[`interpreter`]**, **[`result`]**: the analysis engine.
//! - **[`interval`]**, **[`interval_store`]**, **[`dbm`]**, **[`octagon`]**, **[`numerical`]**,
//!   **[`linear_form`]**: numerical domains.
//! - **[`liveness`]**, **[`usage`]**, **[`expression_store`]**, **[`traces`]**: non-numerical analyses.

pub mod cfg;
pub mod dbm;
pub mod error;
pub mod expr;
pub mod expression_store;
pub mod interpreter;
pub mod interval;
pub mod interval_store;
pub mod lattice;
pub mod linear_form;
pub mod liveness;
pub mod numerical;
pub mod octagon;
pub mod result;
pub mod semantics;
pub mod state;
pub mod statement;
pub mod store;
pub mod traces;
pub mod usage;
