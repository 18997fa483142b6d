//! Program statements, as supplied by a frontend inside CFG nodes and edge conditions.

use std::fmt;

use num_bigint::BigInt;

use crate::expr::Variable;

/// Source location of a statement.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ProgramPoint {
    pub line: u32,
    pub id: u32,
}

impl ProgramPoint {
    pub fn new(line: u32, id: u32) -> Self {
        ProgramPoint { line, id }
    }
}

impl fmt::Display for ProgramPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.id)
    }
}

/// Built-in functions understood by the statement semantics.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Builtin {
    Add,
    Sub,
    Mult,
    Div,
    UAdd,
    USub,
    Not,
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    And,
    Or,
    Input,
    Print,
}

impl Builtin {
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Add => "add",
            Builtin::Sub => "sub",
            Builtin::Mult => "mult",
            Builtin::Div => "div",
            Builtin::UAdd => "uadd",
            Builtin::USub => "usub",
            Builtin::Not => "not",
            Builtin::Eq => "eq",
            Builtin::NotEq => "noteq",
            Builtin::Lt => "lt",
            Builtin::LtE => "lte",
            Builtin::Gt => "gt",
            Builtin::GtE => "gte",
            Builtin::And => "and",
            Builtin::Or => "or",
            Builtin::Input => "input",
            Builtin::Print => "print",
        }
    }

    fn symbol(self) -> Option<&'static str> {
        let s = match self {
            Builtin::Add | Builtin::UAdd => "+",
            Builtin::Sub | Builtin::USub => "-",
            Builtin::Mult => "*",
            Builtin::Div => "/",
            Builtin::Not => "not ",
            Builtin::Eq => "==",
            Builtin::NotEq => "!=",
            Builtin::Lt => "<",
            Builtin::LtE => "<=",
            Builtin::Gt => ">",
            Builtin::GtE => ">=",
            Builtin::And => "and",
            Builtin::Or => "or",
            Builtin::Input | Builtin::Print => return None,
        };
        Some(s)
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Callee {
    Builtin(Builtin),
    /// A user-defined function, which no semantics supports.
    User(String),
}

impl fmt::Display for Callee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callee::Builtin(b) => write!(f, "{}", b.name()),
            Callee::User(name) => write!(f, "{}", name),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Statement {
    LiteralEvaluation {
        pp: ProgramPoint,
        literal: BigInt,
    },
    VariableAccess {
        pp: ProgramPoint,
        variable: Variable,
    },
    Assignment {
        pp: ProgramPoint,
        left: Box<Statement>,
        right: Box<Statement>,
    },
    Call {
        pp: ProgramPoint,
        callee: Callee,
        arguments: Vec<Statement>,
    },
}

impl Statement {
    pub fn literal(value: impl Into<BigInt>) -> Self {
        Statement::LiteralEvaluation {
            pp: ProgramPoint::default(),
            literal: value.into(),
        }
    }

    pub fn var(name: &str) -> Self {
        Statement::VariableAccess {
            pp: ProgramPoint::default(),
            variable: Variable::new(name),
        }
    }

    pub fn assign(left: Statement, right: Statement) -> Self {
        Statement::Assignment {
            pp: ProgramPoint::default(),
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn call(builtin: Builtin, arguments: Vec<Statement>) -> Self {
        Statement::Call {
            pp: ProgramPoint::default(),
            callee: Callee::Builtin(builtin),
            arguments,
        }
    }

    pub fn user_call(name: &str, arguments: Vec<Statement>) -> Self {
        Statement::Call {
            pp: ProgramPoint::default(),
            callee: Callee::User(name.to_string()),
            arguments,
        }
    }

    /// Shorthand for a binary built-in call.
    pub fn binary(left: Statement, builtin: Builtin, right: Statement) -> Self {
        Statement::call(builtin, vec![left, right])
    }

    /// Returns the statement relocated to `point`.
    pub fn at(mut self, point: ProgramPoint) -> Self {
        match &mut self {
            Statement::LiteralEvaluation { pp, .. }
            | Statement::VariableAccess { pp, .. }
            | Statement::Assignment { pp, .. }
            | Statement::Call { pp, .. } => *pp = point,
        }
        self
    }

    pub fn pp(&self) -> ProgramPoint {
        match self {
            Statement::LiteralEvaluation { pp, .. }
            | Statement::VariableAccess { pp, .. }
            | Statement::Assignment { pp, .. }
            | Statement::Call { pp, .. } => *pp,
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::LiteralEvaluation { literal, .. } => write!(f, "{}", literal),
            Statement::VariableAccess { variable, .. } => write!(f, "{}", variable),
            Statement::Assignment { left, right, .. } => write!(f, "{} = {}", left, right),
            Statement::Call {
                callee, arguments, ..
            } => {
                let symbol = match callee {
                    Callee::Builtin(b) => b.symbol(),
                    Callee::User(_) => None,
                };
                match (symbol, arguments.as_slice()) {
                    (Some(symbol), [operand]) => write!(f, "{}{}", symbol, operand),
                    (Some(symbol), [l, r]) => write!(f, "({} {} {})", l, symbol, r),
                    _ => {
                        write!(f, "{}(", callee)?;
                        for (i, arg) in arguments.iter().enumerate() {
                            if i > 0 {
                                write!(f, ", ")?;
                            }
                            write!(f, "{}", arg)?;
                        }
                        write!(f, ")")
                    }
                }
            }
        }
    }
}
