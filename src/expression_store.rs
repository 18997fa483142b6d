//! A store remembering, for every variable, the expression last assigned to it.

use crate::error::{AnalysisError, Result};
use crate::expr::{Expression, Variable};
use crate::interval::Interval;
use crate::lattice::{Lifted, Payload};
use crate::state::State;
use crate::store::Store;

/// Expressions form a flat lattice: distinct expressions join to Top.
impl Payload for Expression {
    fn less_equal(&self, other: &Self) -> bool {
        self == other
    }

    fn join(self, other: Self) -> Lifted<Self> {
        if self == other {
            Lifted::Element(self)
        } else {
            Lifted::Top
        }
    }

    fn meet(self, other: Self) -> Lifted<Self> {
        if self == other {
            Lifted::Element(self)
        } else {
            Lifted::Bottom
        }
    }
}

/// Bottom marks a variable that has not been assigned yet, Top one whose
/// expression depends on the path taken.
pub type ExpressionStore = Store<Lifted<Expression>>;

impl ExpressionStore {
    /// A store in which no variable has been assigned.
    pub fn unassigned<I>(variables: I) -> Self
    where
        I: IntoIterator<Item = Variable>,
    {
        Store::new(variables, Lifted::Bottom)
    }

    /// The interval of the expression recorded for `variable`, if it is constant.
    pub fn evaluate(&self, variable: &Variable) -> Option<Result<Interval>> {
        self.get(variable)
            .and_then(Lifted::element)
            .map(Interval::evaluate)
    }
}

impl State for ExpressionStore {
    fn assign_variable(mut self, left: &Variable, right: &Expression) -> Result<Self> {
        self.set(left, Lifted::Element(right.clone()));
        Ok(self)
    }

    fn substitute_variable(self, _left: &Variable, _right: &Expression) -> Result<Self> {
        Err(AnalysisError::UnsupportedOperation {
            domain: "expression store",
            operation: "backward substitution",
        })
    }

    fn assume_condition(self, _condition: &Expression) -> Result<Self> {
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::lattice::Lattice;

    fn a() -> Variable {
        Variable::from("a")
    }

    #[test]
    fn test_assign_records_expression() {
        let rhs = Expression::literal(3) * (Expression::literal(2) + Expression::literal(5));
        let s = ExpressionStore::unassigned([a()]);
        assert!(s.is_bottom());
        assert_eq!(s.evaluate(&a()), None);
        let s = s.assign_variable(&a(), &rhs).unwrap();
        assert_eq!(s.to_string(), "a -> (3 * (2 + 5))");
        assert_eq!(s.evaluate(&a()), Some(Ok(Interval::constant(21))));
    }

    #[test]
    fn test_join_of_different_expressions_is_top() {
        let s = ExpressionStore::unassigned([a()]);
        let one = s.clone().assign_variable(&a(), &Expression::literal(1)).unwrap();
        let two = s.assign_variable(&a(), &Expression::literal(2)).unwrap();
        assert_eq!(one.clone().join(one.clone()), one);
        assert!(one.join(two).is_top());
    }

    #[test]
    fn test_backward_is_unsupported() {
        let s = ExpressionStore::unassigned([a()]);
        assert!(s.substitute_variable(&a(), &Expression::literal(1)).is_err());
    }
}
