//! Interval analysis of a counting loop.
//!
//! ```text
//! 1: x = 0
//! 2: while x < bound:
//! 3:     x = x + 1
//! 4: print(x)
//! ```
//!
//! Run with:
//! ```bash
//! cargo run --example intervals -- --bound 100 --widening 3 --log-level debug
//! ```

use absint_rs::cfg::{ControlFlowGraph, Edge, EdgeKind, Node};
use absint_rs::expr::Variable;
use absint_rs::interpreter::{ForwardInterpreter, Interpreter, DEFAULT_WIDENING};
use absint_rs::interval_store::IntervalStore;
use absint_rs::semantics::ForwardSemantics;
use absint_rs::statement::{Builtin, Statement};
use clap::Parser;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

#[derive(Debug, Parser)]
#[command(author, version, about = "Interval analysis of a counting loop")]
struct Cli {
    /// Loop bound
    #[arg(long, default_value_t = 10)]
    bound: i64,

    /// Number of loop head iterations before widening
    #[arg(long, default_value_t = DEFAULT_WIDENING)]
    widening: usize,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
}

fn counting_loop(bound: i64) -> ControlFlowGraph {
    let cond = Statement::binary(Statement::var("x"), Builtin::Lt, Statement::literal(bound));
    let exit = Statement::call(Builtin::Not, vec![cond.clone()]);
    let inc = Statement::binary(Statement::var("x"), Builtin::Add, Statement::literal(1));
    let print = Statement::call(Builtin::Print, vec![Statement::var("x")]);

    let mut cfg = ControlFlowGraph::new(1, 4);
    cfg.add_node(Node::basic(1, vec![Statement::assign(Statement::var("x"), Statement::literal(0))]))
        .add_node(Node::loop_head(2))
        .add_node(Node::basic(3, vec![Statement::assign(Statement::var("x"), inc)]))
        .add_node(Node::basic(4, vec![print]))
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

    let cfg = counting_loop(cli.bound);
    let interpreter = ForwardInterpreter::new(cfg, ForwardSemantics, cli.widening);
    let result = interpreter.analyze(IntervalStore::new([Variable::new("x")]))?;

    println!("{}", result);

    Ok(())
}
