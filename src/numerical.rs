//! Common interface of the numerical domains.

use log::trace;
use num_bigint::BigInt;
use num_traits::Zero;

use crate::error::{AnalysisError, Result};
use crate::expr::{BooleanOp, Expression, Variable};
use crate::interval::{Bound, Interval};
use crate::lattice::Lattice;
use crate::linear_form::LinearForm;

/// A lattice of constraints over integer variables.
///
/// Constraint additions intersect with what is already known, `forget` and
/// `set_bounds` drop it.
pub trait NumericalDomain: Lattice {
    /// Name used in error messages.
    const NAME: &'static str;

    /// Whether `variable` belongs to the variables the state was created over.
    fn tracks(&self, variable: &Variable) -> bool;

    /// Fails with [`AnalysisError::UnsupportedExpression`] on the first variable of `expr`
    /// that is not tracked.
    fn check_tracked(&self, expr: &Expression) -> Result<()> {
        match expr.ids().into_iter().find(|v| !self.tracks(v)) {
            Some(v) => Err(AnalysisError::UnsupportedExpression {
                domain: Self::NAME,
                expression: v.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Removes every constraint on `variable`.
    fn forget(&mut self, variable: &Variable);

    /// The range of `variable`, Bottom when the state is unsatisfiable.
    fn bounds(&self, variable: &Variable) -> Interval;

    /// Adds `variable >= value`.
    fn add_lower_bound(&mut self, variable: &Variable, value: &BigInt);

    /// Adds `variable <= value`.
    fn add_upper_bound(&mut self, variable: &Variable, value: &BigInt);

    /// Adds `left - right <= value`.
    fn add_difference_upper_bound(&mut self, left: &Variable, right: &Variable, value: &BigInt);

    /// Forgets `variable` and constrains it to `range`.
    fn set_bounds(&mut self, variable: &Variable, range: &Interval) {
        self.forget(variable);
        match (range.lower(), range.upper()) {
            (Some(lower), Some(upper)) => {
                if let Bound::Finite(lower) = lower {
                    self.add_lower_bound(variable, lower);
                }
                if let Bound::Finite(upper) = upper {
                    self.add_upper_bound(variable, upper);
                }
            }
            _ => *self = self.bottom(),
        }
    }

    fn set_constant(&mut self, variable: &Variable, value: &BigInt) {
        self.set_bounds(variable, &Interval::constant(value.clone()));
    }

    /// Adds `form <= 0`. Domains may keep less precise information than the form carries.
    ///
    /// # Panics
    ///
    /// Panics if a variable of `form` is not tracked.
    fn constrain(&mut self, form: &LinearForm);

    /// Restricts the state to executions where `condition` holds.
    ///
    /// Comparisons are translated to linear constraints, conjunctions are applied in sequence
    /// and disjunctions joined. Conditions without a linear reading leave the state unchanged.
    /// A condition over an untracked variable is an error.
    fn refine(self, condition: &Expression) -> Result<Self> {
        self.check_tracked(condition)?;
        if self.is_bottom() {
            return Ok(self);
        }
        Ok(match condition {
            Expression::BinaryComparison(left, op, right) => match LinearForm::comparison(left, *op, right) {
                Ok(forms) => {
                    let mut state = self;
                    for form in &forms {
                        state.constrain(form);
                    }
                    state
                }
                Err(e) => {
                    trace!("no refinement: {}", e);
                    self
                }
            },
            Expression::BinaryBoolean(left, BooleanOp::And, right) => self.refine(left)?.refine(right)?,
            Expression::BinaryBoolean(left, BooleanOp::Or, right) => {
                let other = self.clone().refine(right)?;
                self.refine(left)?.join(other)
            }
            Expression::Not(inner) => match inner.negated() {
                Expression::Not(_) => self,
                negated => self.refine(&negated)?,
            },
            Expression::Literal(value) if value.is_zero() => self.bottom(),
            _ => self,
        })
    }
}
