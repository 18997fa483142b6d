//! Analysis states: lattices equipped with transfer functions.

use std::collections::BTreeSet;
use std::fmt;

use num_bigint::BigInt;

use crate::error::{AnalysisError, Result};
use crate::expr::{Expression, Variable};
use crate::lattice::Lattice;

/// The set of expressions a sub-statement may evaluate to.
pub type ExpressionSet = BTreeSet<Expression>;

/// An abstract program state.
///
/// Transfer functions come in two layers, as for [`Lattice`]: domains implement the
/// single-expression operations (`assign_variable`, `substitute_variable`, `assume_condition`),
/// while the set-lifted operations (`assign`, `substitute`, `assume`) evaluate every pairing
/// on a copy of the current state and join the outcomes.
pub trait State: Lattice + fmt::Display {
    /// Expressions a variable access evaluates to.
    fn access_variable(&self, variable: &Variable) -> ExpressionSet {
        BTreeSet::from([Expression::Variable(variable.clone())])
    }

    /// Expressions a literal evaluates to.
    fn evaluate_literal(&self, literal: &BigInt) -> ExpressionSet {
        BTreeSet::from([Expression::Literal(literal.clone())])
    }

    /// Forward transfer function of `left = right`.
    fn assign_variable(self, left: &Variable, right: &Expression) -> Result<Self>;

    /// Backward transfer function of `left = right`.
    fn substitute_variable(self, left: &Variable, right: &Expression) -> Result<Self>;

    /// Restricts the state to executions where `condition` holds.
    fn assume_condition(self, condition: &Expression) -> Result<Self>;

    /// Transfer function of printing `output`.
    fn output(self, _output: &Expression) -> Result<Self> {
        Ok(self)
    }

    fn enter_if(self) -> Self {
        self
    }

    fn exit_if(self) -> Self {
        self
    }

    fn enter_loop(self) -> Self {
        self
    }

    fn exit_loop(self) -> Self {
        self
    }

    /// Joined forward assignment over every pairing of `left` and `right`.
    fn assign(self, left: &ExpressionSet, right: &ExpressionSet) -> Result<Self> {
        lift_pairs(self, left, right, Self::assign_variable)
    }

    /// Joined backward substitution over every pairing of `left` and `right`.
    fn substitute(self, left: &ExpressionSet, right: &ExpressionSet) -> Result<Self> {
        lift_pairs(self, left, right, Self::substitute_variable)
    }

    /// Joined restriction over every condition of `conditions`.
    fn assume(self, conditions: &ExpressionSet) -> Result<Self> {
        let mut joined = self.bottom();
        for condition in conditions {
            joined = joined.join(self.clone().assume_condition(condition)?);
        }
        Ok(joined)
    }
}

fn lift_pairs<S, F>(state: S, left: &ExpressionSet, right: &ExpressionSet, transfer: F) -> Result<S>
where
    S: State,
    F: Fn(S, &Variable, &Expression) -> Result<S>,
{
    let mut joined = state.bottom();
    for lhs in left {
        let Some(variable) = lhs.as_variable() else {
            return Err(AnalysisError::UnsupportedAssignment {
                target: lhs.to_string(),
            });
        };
        for rhs in right {
            joined = joined.join(transfer(state.clone(), variable, rhs)?);
        }
    }
    Ok(joined)
}
