//! Statement semantics: how each statement kind transforms an analysis state.
//!
//! The interpreter calls [`Semantics::apply`] once per statement and [`Semantics::filter`] for
//! edge guards. Evaluation threads the state through sub-statements and reports the
//! expressions a sub-statement may produce in [`Evaluated::result`].

use std::collections::BTreeSet;

use crate::error::{AnalysisError, Result};
use crate::expr::{BinaryArithmeticOp, ComparisonOp, Expression, UnaryArithmeticOp};
use crate::state::{ExpressionSet, State};
use crate::statement::{Builtin, Callee, Statement};

/// A state together with the expressions produced by the last evaluated sub-statement.
#[derive(Debug, Clone)]
pub struct Evaluated<S> {
    pub state: S,
    pub result: ExpressionSet,
}

impl<S> Evaluated<S> {
    /// A state with an empty result.
    pub fn new(state: S) -> Self {
        Evaluated {
            state,
            result: ExpressionSet::new(),
        }
    }

    pub fn with_result(state: S, result: ExpressionSet) -> Self {
        Evaluated { state, result }
    }
}

pub trait Semantics<S: State> {
    /// Direction-specific semantics of `left = right`.
    fn assignment_semantics(&self, left: &Statement, right: &Statement, state: S) -> Result<Evaluated<S>>;

    /// Evaluates `statement` in `state`.
    fn semantics(&self, statement: &Statement, state: S) -> Result<Evaluated<S>> {
        match statement {
            Statement::LiteralEvaluation { literal, .. } => {
                let result = state.evaluate_literal(literal);
                Ok(Evaluated::with_result(state, result))
            }
            Statement::VariableAccess { variable, .. } => {
                let result = state.access_variable(variable);
                Ok(Evaluated::with_result(state, result))
            }
            Statement::Assignment { left, right, .. } => {
                if !matches!(**left, Statement::VariableAccess { .. }) {
                    return Err(AnalysisError::UnsupportedAssignment {
                        target: left.to_string(),
                    });
                }
                self.assignment_semantics(left, right, state)
            }
            Statement::Call {
                callee, arguments, ..
            } => self.call_semantics(callee, arguments, state),
        }
    }

    /// Semantics of a call. Only built-ins are supported.
    fn call_semantics(&self, callee: &Callee, arguments: &[Statement], state: S) -> Result<Evaluated<S>> {
        let builtin = match callee {
            Callee::Builtin(b) => *b,
            Callee::User(name) => return Err(AnalysisError::UnsupportedCall { name: name.clone() }),
        };
        match builtin {
            Builtin::Input => {
                check_arity(builtin, arguments, 0)?;
                Ok(Evaluated::with_result(state, BTreeSet::from([Expression::Input])))
            }
            Builtin::Print => {
                let mut state = state;
                for argument in arguments {
                    let evaluated = self.semantics(argument, state)?;
                    state = evaluated.state;
                    for expr in &evaluated.result {
                        state = state.output(expr)?;
                    }
                }
                Ok(Evaluated::new(state))
            }
            Builtin::UAdd | Builtin::USub | Builtin::Not => {
                check_arity(builtin, arguments, 1)?;
                let Evaluated { state, result } = self.semantics(&arguments[0], state)?;
                let result = result.into_iter().map(|e| unary(builtin, e)).collect();
                Ok(Evaluated::with_result(state, result))
            }
            Builtin::Add
            | Builtin::Sub
            | Builtin::Mult
            | Builtin::Div
            | Builtin::Eq
            | Builtin::NotEq
            | Builtin::Lt
            | Builtin::LtE
            | Builtin::Gt
            | Builtin::GtE
            | Builtin::And
            | Builtin::Or => {
                if arguments.len() < 2 {
                    return Err(AnalysisError::InvalidArity {
                        callee: builtin.name().to_string(),
                        expected: 2,
                        found: arguments.len(),
                    });
                }
                let mut state = state;
                let mut result: Option<ExpressionSet> = None;
                for argument in arguments {
                    let evaluated = self.semantics(argument, state)?;
                    state = evaluated.state;
                    result = Some(match result {
                        None => evaluated.result,
                        Some(lefts) => {
                            let mut combined = ExpressionSet::new();
                            for l in &lefts {
                                for r in &evaluated.result {
                                    combined.insert(binary(builtin, l.clone(), r.clone()));
                                }
                            }
                            combined
                        }
                    });
                }
                Ok(Evaluated::with_result(state, result.unwrap_or_default()))
            }
        }
    }

    /// Applies a node statement; the produced expressions are discarded.
    fn apply(&self, statement: &Statement, state: S) -> Result<S> {
        Ok(self.semantics(statement, state)?.state)
    }

    /// Restricts `state` to executions where the guard `condition` holds.
    fn filter(&self, condition: &Statement, state: S) -> Result<S> {
        let Evaluated { state, result } = self.semantics(condition, state)?;
        state.assume(&result)
    }
}

fn check_arity(builtin: Builtin, arguments: &[Statement], expected: usize) -> Result<()> {
    if arguments.len() == expected {
        Ok(())
    } else {
        Err(AnalysisError::InvalidArity {
            callee: builtin.name().to_string(),
            expected,
            found: arguments.len(),
        })
    }
}

fn unary(builtin: Builtin, operand: Expression) -> Expression {
    match builtin {
        Builtin::UAdd => Expression::UnaryArithmetic(UnaryArithmeticOp::Plus, Box::new(operand)),
        Builtin::USub => -operand,
        Builtin::Not => !operand,
        _ => unreachable!("`{}` is not a unary operator", builtin.name()),
    }
}

fn binary(builtin: Builtin, left: Expression, right: Expression) -> Expression {
    match builtin {
        Builtin::Add => Expression::arith(left, BinaryArithmeticOp::Add, right),
        Builtin::Sub => Expression::arith(left, BinaryArithmeticOp::Sub, right),
        Builtin::Mult => Expression::arith(left, BinaryArithmeticOp::Mult, right),
        Builtin::Div => Expression::arith(left, BinaryArithmeticOp::Div, right),
        Builtin::Eq => Expression::compare(left, ComparisonOp::Eq, right),
        Builtin::NotEq => Expression::compare(left, ComparisonOp::NotEq, right),
        Builtin::Lt => Expression::compare(left, ComparisonOp::Lt, right),
        Builtin::LtE => Expression::compare(left, ComparisonOp::LtE, right),
        Builtin::Gt => Expression::compare(left, ComparisonOp::Gt, right),
        Builtin::GtE => Expression::compare(left, ComparisonOp::GtE, right),
        Builtin::And => Expression::and(left, right),
        Builtin::Or => Expression::or(left, right),
        Builtin::UAdd | Builtin::USub | Builtin::Not | Builtin::Input | Builtin::Print => {
            unreachable!("`{}` is not a binary operator", builtin.name())
        }
    }
}

/// Forward semantics: assignments are executed.
#[derive(Debug, Default, Copy, Clone)]
pub struct ForwardSemantics;

impl<S: State> Semantics<S> for ForwardSemantics {
    fn assignment_semantics(&self, left: &Statement, right: &Statement, state: S) -> Result<Evaluated<S>> {
        let Evaluated { state, result: lhs } = self.semantics(left, state)?;
        let Evaluated { state, result: rhs } = self.semantics(right, state)?;
        Ok(Evaluated::new(state.assign(&lhs, &rhs)?))
    }
}

/// Backward semantics: assignments are undone by substitution.
#[derive(Debug, Default, Copy, Clone)]
pub struct BackwardSemantics;

impl<S: State> Semantics<S> for BackwardSemantics {
    fn assignment_semantics(&self, left: &Statement, right: &Statement, state: S) -> Result<Evaluated<S>> {
        let Evaluated { state, result: lhs } = self.semantics(left, state)?;
        let Evaluated { state, result: rhs } = self.semantics(right, state)?;
        Ok(Evaluated::new(state.substitute(&lhs, &rhs)?))
    }
}
