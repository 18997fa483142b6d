use absint_rs::cfg::{ControlFlowGraph, Edge, EdgeKind, Node};
use absint_rs::expr::Variable;
use absint_rs::expression_store::ExpressionStore;
use absint_rs::interpreter::{BackwardInterpreter, ForwardInterpreter, Interpreter};
use absint_rs::interval::Interval;
use absint_rs::interval_store::IntervalStore;
use absint_rs::lattice::{Lattice, Lifted};
use absint_rs::liveness::{Liveness, LivenessState};
use absint_rs::numerical::NumericalDomain;
use absint_rs::octagon::Octagon;
use absint_rs::semantics::{BackwardSemantics, ForwardSemantics};
use absint_rs::statement::{Builtin, Statement};
use absint_rs::traces::BoolTraces;
use absint_rs::usage::{Used, UsedStack};
use test_log::test;

fn var(name: &str) -> Variable {
    Variable::new(name)
}

fn assign(name: &str, rhs: Statement) -> Statement {
    Statement::assign(Statement::var(name), rhs)
}

fn increment(name: &str) -> Statement {
    assign(name, Statement::binary(Statement::var(name), Builtin::Add, Statement::literal(1)))
}

/// x = input(); if x > 3: y = 1 else: y = 2
fn branching_on_input() -> ControlFlowGraph {
    let cond = Statement::binary(Statement::var("x"), Builtin::Gt, Statement::literal(3));
    let neg = Statement::call(Builtin::Not, vec![cond.clone()]);
    let mut cfg = ControlFlowGraph::new(1, 4);
    cfg.add_node(Node::basic(1, vec![assign("x", Statement::call(Builtin::Input, vec![]))]))
        .add_node(Node::basic(2, vec![assign("y", Statement::literal(1))]))
        .add_node(Node::basic(3, vec![assign("y", Statement::literal(2))]))
        .add_node(Node::basic(4, vec![]))
        .add_edge(Edge::conditional(1, cond, 2, EdgeKind::IfIn))
        .add_edge(Edge::conditional(1, neg, 3, EdgeKind::IfIn))
        .add_edge(Edge::unconditional(2, 4, EdgeKind::IfOut))
        .add_edge(Edge::unconditional(3, 4, EdgeKind::IfOut));
    cfg
}

/// x = 2; y = 4; x = 1; if y > x: z = y else: z = y * y; print(z)
fn overwritten_before_use() -> ControlFlowGraph {
    let cond = Statement::binary(Statement::var("y"), Builtin::Gt, Statement::var("x"));
    let neg = Statement::call(Builtin::Not, vec![cond.clone()]);
    let square = Statement::binary(Statement::var("y"), Builtin::Mult, Statement::var("y"));
    let mut cfg = ControlFlowGraph::new(1, 4);
    cfg.add_node(Node::basic(
        1,
        vec![
            assign("x", Statement::literal(2)),
            assign("y", Statement::literal(4)),
            assign("x", Statement::literal(1)),
        ],
    ))
    .add_node(Node::basic(2, vec![assign("z", Statement::var("y"))]))
    .add_node(Node::basic(3, vec![assign("z", square)]))
    .add_node(Node::basic(4, vec![Statement::call(Builtin::Print, vec![Statement::var("z")])]))
    .add_edge(Edge::conditional(1, cond, 2, EdgeKind::IfIn))
    .add_edge(Edge::conditional(1, neg, 3, EdgeKind::IfIn))
    .add_edge(Edge::unconditional(2, 4, EdgeKind::IfOut))
    .add_edge(Edge::unconditional(3, 4, EdgeKind::IfOut));
    cfg
}

#[test]
fn test_branches_are_filtered_and_joined() {
    let interpreter = ForwardInterpreter::with_default_widening(branching_on_input(), ForwardSemantics);
    let result = interpreter.analyze(IntervalStore::new([var("x"), var("y")])).unwrap();

    let then_branch = &result.get_node_result(2).unwrap()[0];
    assert_eq!(then_branch.get(&var("x")), Interval::at_least(4));
    let else_branch = &result.get_node_result(3).unwrap()[0];
    assert_eq!(else_branch.get(&var("x")), Interval::at_most(3));

    let merged = &result.get_node_result(4).unwrap()[0];
    assert_eq!(merged.get(&var("x")), Interval::full());
    assert_eq!(merged.get(&var("y")), Interval::range(1, 2));
}

#[test]
fn test_self_loop_terminates_by_widening() {
    // 1: x = 0 -> 2: x = x + 1, looping on itself -> 3
    let mut cfg = ControlFlowGraph::new(1, 3);
    cfg.add_node(Node::basic(1, vec![assign("x", Statement::literal(0))]))
        .add_node(Node::basic(2, vec![increment("x")]))
        .add_node(Node::basic(3, vec![]))
        .connect(1, 2)
        .add_edge(Edge::unconditional(2, 2, EdgeKind::LoopIn))
        .connect(2, 3);
    assert!(cfg.is_loop_head(2));

    let interpreter = ForwardInterpreter::new(cfg, ForwardSemantics, 3);
    let result = interpreter.analyze(IntervalStore::new([var("x")])).unwrap();
    let head = &result.get_node_result(2).unwrap()[0];
    assert_eq!(head.get(&var("x")), Interval::at_least(0));
    let exit = &result.get_node_result(3).unwrap()[0];
    assert_eq!(exit.get(&var("x")), Interval::at_least(1));
}

#[test]
fn test_expression_store_records_assignments() {
    let rhs = Statement::binary(
        Statement::literal(3),
        Builtin::Mult,
        Statement::binary(Statement::literal(2), Builtin::Add, Statement::literal(5)),
    );
    let mut cfg = ControlFlowGraph::new(1, 1);
    cfg.add_node(Node::basic(1, vec![assign("a", rhs)]));

    let interpreter = ForwardInterpreter::with_default_widening(cfg, ForwardSemantics);
    let result = interpreter.analyze(ExpressionStore::unassigned([var("a")])).unwrap();
    let states = result.get_node_result(1).unwrap();
    assert_eq!(states[0].get(&var("a")), Some(&Lifted::Bottom));
    assert_eq!(states[1].evaluate(&var("a")), Some(Ok(Interval::constant(21))));
}

#[test]
fn test_live_variables() {
    let interpreter = BackwardInterpreter::with_default_widening(overwritten_before_use(), BackwardSemantics);
    let result = interpreter.analyze(LivenessState::all_dead([var("x"), var("y"), var("z")])).unwrap();

    let before_print = &result.get_node_result(4).unwrap()[0];
    assert_eq!(before_print.get(&var("z")), Some(&Liveness::Live));
    assert_eq!(before_print.get(&var("y")), Some(&Liveness::Dead));

    let entry = result.get_node_result(1).unwrap();
    assert_eq!(entry.len(), 4);
    // Before `x = 1`, only `y` is needed.
    assert_eq!(entry[2].to_string(), "x -> Dead, y -> Live, z -> Dead");
    assert_eq!(entry[3].to_string(), "x -> Live, y -> Live, z -> Dead");
    assert_eq!(entry[0].to_string(), "x -> Dead, y -> Dead, z -> Dead");
}

#[test]
fn test_usage_distinguishes_overwritten_values() {
    let interpreter = BackwardInterpreter::with_default_widening(overwritten_before_use(), BackwardSemantics);
    let result = interpreter.analyze(UsedStack::new([var("x"), var("y"), var("z")])).unwrap();

    let entry = &result.get_node_result(1).unwrap()[0];
    let frames = entry.element().unwrap();
    assert_eq!(frames.depth(), 1);
    for name in ["x", "y", "z"] {
        assert_eq!(frames.top_frame().get(&var(name)), Some(&Used::O), "{}", name);
    }

    let then_branch = &result.get_node_result(2).unwrap()[0];
    let frames = then_branch.element().unwrap();
    assert_eq!(frames.depth(), 2);
    assert_eq!(frames.top_frame().get(&var("y")), Some(&Used::U));
}

#[test]
fn test_octagon_keeps_lockstep_relation() {
    // x = 0; y = 0; while x < 10: x = x + 1; y = y + 1
    let cond = Statement::binary(Statement::var("x"), Builtin::Lt, Statement::literal(10));
    let neg = Statement::call(Builtin::Not, vec![cond.clone()]);
    let mut cfg = ControlFlowGraph::new(1, 4);
    cfg.add_node(Node::basic(
        1,
        vec![assign("x", Statement::literal(0)), assign("y", Statement::literal(0))],
    ))
    .add_node(Node::loop_head(2))
    .add_node(Node::basic(3, vec![increment("x"), increment("y")]))
    .add_node(Node::basic(4, vec![]))
    .connect(1, 2)
    .add_edge(Edge::conditional(2, cond, 3, EdgeKind::LoopIn))
    .add_edge(Edge::unconditional(3, 2, EdgeKind::LoopOut))
    .add_edge(Edge::conditional(2, neg, 4, EdgeKind::Default));

    let (x, y) = (var("x"), var("y"));
    let interpreter = ForwardInterpreter::with_default_widening(cfg, ForwardSemantics);

    let result = interpreter.analyze(Octagon::new([x.clone(), y.clone()])).unwrap();
    let body = &result.get_node_result(3).unwrap()[0];
    assert_eq!(body.bounds(&y), Interval::range(0, 9));
    let exit = &result.get_node_result(4).unwrap()[0];
    assert_eq!(exit.bounds(&x), Interval::at_least(10));
    assert_eq!(exit.bounds(&y), Interval::at_least(10));

    // Requiring y > x after the loop is infeasible.
    let mut strict = exit.clone();
    strict.add_difference_upper_bound(&x, &y, &(-1).into());
    assert!(strict.is_bottom());

    let result = interpreter.analyze(IntervalStore::new([x.clone(), y.clone()])).unwrap();
    let exit = &result.get_node_result(4).unwrap()[0];
    assert_eq!(exit.bounds(&y), Interval::at_least(0));
}

/// h = input(); l = <rhs>; print(l)
fn publish(rhs: Statement) -> ControlFlowGraph {
    let mut cfg = ControlFlowGraph::new(1, 1);
    cfg.add_node(Node::basic(
        1,
        vec![
            assign("h", Statement::call(Builtin::Input, vec![])),
            assign("l", rhs),
            Statement::call(Builtin::Print, vec![Statement::var("l")]),
        ],
    ));
    cfg
}

#[test]
fn test_traces_detect_interference() {
    let (h, l) = (var("h"), var("l"));

    let interpreter = BackwardInterpreter::with_default_widening(publish(Statement::var("h")), BackwardSemantics);
    let result = interpreter.analyze(BoolTraces::hyper([h.clone(), l.clone()])).unwrap();
    let entry = result.get_node_result(1).unwrap()[0].element().unwrap().clone();
    assert_eq!(entry.inputs().len(), 1);
    // Printing `l = h` tells every value of `h` apart.
    assert_eq!(entry.variety(&h).unwrap(), 1);

    let interpreter = BackwardInterpreter::with_default_widening(publish(Statement::literal(1)), BackwardSemantics);
    let result = interpreter.analyze(BoolTraces::hyper([h.clone(), l])).unwrap();
    let entry = result.get_node_result(1).unwrap()[0].element().unwrap().clone();
    assert_eq!(entry.variety(&h).unwrap(), 2);
}
