//! Octagon analysis of two counters moving in lockstep.
//!
//! ```text
//! 1: x = 0
//!    y = 0
//! 2: while x < bound:
//! 3:     x = x + 1
//!        y = y + 1
//! 4: print(y)
//! ```
//!
//! Intervals lose the relation between `x` and `y` at the loop head; octagons keep
//! `x - y = 0` and therefore bound `y` after the loop.

use absint_rs::cfg::{ControlFlowGraph, Edge, EdgeKind, Node};
use absint_rs::expr::Variable;
use absint_rs::interpreter::{ForwardInterpreter, Interpreter, DEFAULT_WIDENING};
use absint_rs::interval_store::IntervalStore;
use absint_rs::numerical::NumericalDomain;
use absint_rs::octagon::Octagon;
use absint_rs::semantics::ForwardSemantics;
use absint_rs::statement::{Builtin, Statement};
use clap::Parser;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

#[derive(Debug, Parser)]
#[command(author, version, about = "Octagon analysis of a lockstep loop")]
struct Cli {
    /// Loop bound
    #[arg(long, default_value_t = 10)]
    bound: i64,

    /// Number of loop head iterations before widening
    #[arg(long, default_value_t = DEFAULT_WIDENING)]
    widening: usize,

    /// Print the full analysis result
    #[arg(long)]
    verbose: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
}

fn increment(name: &str) -> Statement {
    let rhs = Statement::binary(Statement::var(name), Builtin::Add, Statement::literal(1));
    Statement::assign(Statement::var(name), rhs)
}

fn lockstep_loop(bound: i64) -> ControlFlowGraph {
    let cond = Statement::binary(Statement::var("x"), Builtin::Lt, Statement::literal(bound));
    let exit = Statement::call(Builtin::Not, vec![cond.clone()]);
    let zero = |name: &str| Statement::assign(Statement::var(name), Statement::literal(0));

    let mut cfg = ControlFlowGraph::new(1, 4);
    cfg.add_node(Node::basic(1, vec![zero("x"), zero("y")]))
        .add_node(Node::loop_head(2))
        .add_node(Node::basic(3, vec![increment("x"), increment("y")]))
        .add_node(Node::basic(
            4,
            vec![Statement::call(Builtin::Print, vec![Statement::var("y")])],
        ))
        .connect(1, 2)
        .add_edge(Edge::conditional(2, cond, 3, EdgeKind::LoopIn))
        .add_edge(Edge::unconditional(3, 2, EdgeKind::LoopOut))
        .add_edge(Edge::conditional(2, exit, 4, EdgeKind::Default));
    cfg
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    TermLogger::init(cli.log_level, Config::default(), TerminalMode::Mixed, ColorChoice::Auto)?;

    let variables = [Variable::new("x"), Variable::new("y")];
    let y = &variables[1];
    let interpreter = ForwardInterpreter::new(lockstep_loop(cli.bound), ForwardSemantics, cli.widening);

    let octagons = interpreter.analyze(Octagon::new(variables.clone()))?;
    let intervals = interpreter.analyze(IntervalStore::new(variables.clone()))?;
    if cli.verbose {
        println!("{}", octagons);
    }

    if let (Some(oct), Some(itv)) = (octagons.get_node_result(4), intervals.get_node_result(4)) {
        println!("after the loop (octagon):  {}", oct[0]);
        println!("after the loop (interval): {}", itv[0]);
        println!("y (octagon):  {}", oct[0].bounds(y));
        println!("y (interval): {}", itv[0].bounds(y));
    }

    Ok(())
}
