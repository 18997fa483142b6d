//! Backward analyses of a small branching program.
//!
//! ```text
//! 1: x = 2
//!    y = 4
//!    x = 1
//!    if y > x:
//! 2:     z = y
//!    else:
//! 3:     z = y * y
//! 4: print(z)
//! ```
//!
//! Live variable analysis reports which variables may still be read; usage analysis
//! additionally tells apart values that are overwritten before use (`O`).

use absint_rs::cfg::{ControlFlowGraph, Edge, EdgeKind, Node};
use absint_rs::expr::Variable;
use absint_rs::interpreter::{BackwardInterpreter, Interpreter};
use absint_rs::liveness::LivenessState;
use absint_rs::semantics::BackwardSemantics;
use absint_rs::statement::{Builtin, ProgramPoint, Statement};
use absint_rs::usage::UsedStack;
use clap::{Parser, ValueEnum};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Analysis {
    Liveness,
    Usage,
}

#[derive(Debug, Parser)]
#[command(author, version, about = "Backward analyses of a branching program")]
struct Cli {
    /// Analysis to run
    #[arg(value_enum, default_value = "usage")]
    analysis: Analysis,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
}

fn assign(line: u32, name: &str, right: Statement) -> Statement {
    Statement::assign(Statement::var(name), right).at(ProgramPoint::new(line, 1))
}

fn branching_program() -> ControlFlowGraph {
    let cond = Statement::binary(Statement::var("y"), Builtin::Gt, Statement::var("x"));
    let not_cond = Statement::call(Builtin::Not, vec![cond.clone()]);
    let square = Statement::binary(Statement::var("y"), Builtin::Mult, Statement::var("y"));

    let mut cfg = ControlFlowGraph::new(1, 4);
    cfg.add_node(Node::basic(
        1,
        vec![
            assign(1, "x", Statement::literal(2)),
            assign(2, "y", Statement::literal(4)),
            assign(3, "x", Statement::literal(1)),
        ],
    ))
    .add_node(Node::basic(2, vec![assign(5, "z", Statement::var("y"))]))
    .add_node(Node::basic(3, vec![assign(7, "z", square)]))
    .add_node(Node::basic(4, vec![Statement::call(Builtin::Print, vec![Statement::var("z")])]))
    .add_edge(Edge::conditional(1, cond, 2, EdgeKind::IfIn))
    .add_edge(Edge::conditional(1, not_cond, 3, EdgeKind::IfIn))
    .add_edge(Edge::unconditional(2, 4, EdgeKind::IfOut))
    .add_edge(Edge::unconditional(3, 4, EdgeKind::IfOut));
    cfg
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    TermLogger::init(cli.log_level, Config::default(), TerminalMode::Mixed, ColorChoice::Auto)?;

    let variables = ["x", "y", "z"].map(Variable::new);
    let interpreter = BackwardInterpreter::with_default_widening(branching_program(), BackwardSemantics);
    match cli.analysis {
        Analysis::Liveness => {
            let result = interpreter.analyze(LivenessState::all_dead(variables))?;
            println!("{}", result);
        }
        Analysis::Usage => {
            let result = interpreter.analyze(UsedStack::new(variables))?;
            println!("{}", result);
        }
    }

    Ok(())
}
